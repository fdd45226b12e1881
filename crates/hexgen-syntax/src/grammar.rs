//! Grammar of instruction syntax strings.
//!
//! The parser is a backtracking, list-of-successes recursive descent: every
//! production returns all of its parses at a position, each paired with the
//! offset it stops at, in preference order. A whole string parses to the
//! first expression that stops at the end of input.
//!
//! ```text
//! exp    := base tail*
//! base   := "if (" [!] cond ")" exp
//!         | operand ["," reg] [rator] "=" [rator] value
//!         | operand [rator] "=" [rator] value ";" exp
//!         | [!] call hint*
//! tail   := [subfield] [rator] "=" [rator] value [subfield]
//! value  := operand | exp
//! ```

use crate::scanner::{RegMatch, Scanner};
use crate::{Result, SyntaxError};

const RATORS: &[&str] = &["++", "+", "<<", "=", "-", "&", "|", "^", "~"];
const SUBFIELDS: &[&str] = &[".uh", ".h", ".uw", ".w", ".ub", ".b"];
const COMPARES: &[&str] = &["==", "!=", ">=", "<="];
const DOT_SUFFIXES: &[&str] = &[".new", ".cur", ".tmp"];
/// Hints that may be followed by more hints.
const CHAIN_HINTS: &[&str] = &[
    ":<<16", ":<<1", ":>>1", ":shift", ":rnd", ":crnd", ":sat", ":raw", ":hi", ":lo", ":t", ":nt",
    ":carry",
];
/// Hints that end a chain.
const LAST_HINTS: &[&str] = &[
    ":scale",
    ":lib",
    ":pos",
    ":neg",
    ":chop",
    ":scatter_release",
    ":nomatch",
];

/// A register operand as written, `Rss32` or `Rt.L32`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reg {
    pub class: char,
    pub id: String,
    /// Half selector written between id and bit count.
    pub half: String,
    /// Source text.
    pub text: String,
}

/// Base of a circular-addressing operand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CircBase {
    Imm(char),
    /// `I`, the implicit increment register.
    Implicit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    /// `#-1`
    Const(i64),
    /// `#s11:2`, by immediate letter.
    Imm(char),
    Reg(Reg),
    /// Register with `.new`, `.cur`, `.tmp` or a subfield suffix.
    RegDot(Reg, String),
    /// `p0`
    Pred(String),
    /// `p0.new`
    PredNew(String),
    Gp,
    /// `pc`, `sgpN[:0]`, `r29` or `r31`, as written.
    Sys(String),
    /// `Mu2:brev`
    Brev(Reg),
    /// `Mu2*`
    Star(Reg),
    /// `!Pu4`
    Not(Reg),
    /// `#s4:0:circ(Mu2)` or `I:circ(Mu2)`
    Circ(CircBase, Reg),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Args {
    /// `insn`
    None,
    /// `insn operand`
    Bare(Operand),
    /// `insn(a)`
    One(Operand),
    /// `insn(a,b)`
    Two(Operand, Operand),
    /// `insn(a,-b)`
    TwoRator(Operand, String, Operand),
    /// `insn(a,b,c)`
    Three(Operand, Operand, Operand),
    /// `insn(a+b)`
    Rator2(Operand, String, Operand),
    /// `insn(a<<b+c)`
    Rator3(Operand, String, Operand, String, Operand),
    /// `insn(call)`
    Nested(Box<Call>),
    /// `insn(a,call)`
    NestedAfter(Operand, Box<Call>),
    /// `insn(call,a)`
    NestedBefore(Box<Call>, Operand),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub insn: String,
    pub args: Args,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cond {
    Operand(Operand),
    Compare(Operand, String, Operand),
    Call(Call),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Operand(Operand),
    Exp(Box<Exp>),
}

/// Operator text around an `=`, as in `+=` or `=-`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assign {
    pub before: Option<String>,
    pub after: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Exp {
    Call {
        not: bool,
        call: Call,
        hints: Vec<String>,
    },
    If {
        not: bool,
        cond: Cond,
        body: Box<Exp>,
    },
    /// `Rd32=...`, `Rxx32,Pe4=...`
    AssignToOp {
        dst: Operand,
        second: Option<Reg>,
        op: Assign,
        value: Value,
    },
    /// `Rd16=#U6 ; jump #r9:2`
    AssignComma {
        dst: Operand,
        op: Assign,
        value: Value,
        rest: Box<Exp>,
    },
    /// `memw(Rs32+#s11:2)=Rt32`
    AssignToExp {
        dst: Box<Exp>,
        dst_subfield: Option<String>,
        op: Assign,
        value: Value,
        subfield: Option<String>,
    },
}

type Parses<T> = Vec<(T, usize)>;

struct Grammar<'a> {
    s: Scanner<'a>,
}

impl Grammar<'_> {
    fn text(&self, span: crate::scanner::Span) -> String {
        self.s.text(span).to_string()
    }

    /// Matches of `options` as owned text, then the empty alternative.
    fn opt_lits(&self, pos: usize, options: &[&str]) -> Parses<Option<String>> {
        let mut out: Parses<Option<String>> = self
            .s
            .any_lit(pos, options)
            .into_iter()
            .map(|span| (Some(self.text(span)), span.end))
            .collect();
        out.push((None, pos));
        out
    }

    fn lits(&self, pos: usize, options: &[&str]) -> Parses<String> {
        self.s
            .any_lit(pos, options)
            .into_iter()
            .map(|span| (self.text(span), span.end))
            .collect()
    }

    fn not(&self, pos: usize) -> Parses<bool> {
        let mut out = Vec::with_capacity(2);
        if let Some(span) = self.s.lit(pos, "!") {
            out.push((true, span.end));
        }
        out.push((false, pos));
        out
    }

    fn exp(&self, pos: usize) -> Parses<Exp> {
        let mut out = Vec::new();
        let mut frontier = self.base(pos);
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for (exp, end) in frontier {
                for ((dst_subfield, op, value, subfield), tail_end) in self.tail(end) {
                    let wrapped = Exp::AssignToExp {
                        dst: Box::new(exp.clone()),
                        dst_subfield,
                        op,
                        value,
                        subfield,
                    };
                    next.push((wrapped, tail_end));
                }
                out.push((exp, end));
            }
            frontier = next;
        }
        out
    }

    fn base(&self, pos: usize) -> Parses<Exp> {
        let mut out = self.if_exp(pos);
        out.extend(self.assign_to_op(pos));
        out.extend(self.assign_comma(pos));
        out.extend(self.call_exp(pos));
        out
    }

    fn if_exp(&self, pos: usize) -> Parses<Exp> {
        let mut out = Vec::new();
        let Some(open) = self.s.lit(pos, "if (") else {
            return out;
        };
        for (not, p1) in self.not(open.end) {
            for (cond, p2) in self.cond(p1) {
                let Some(close) = self.s.lit(p2, ")") else {
                    continue;
                };
                for (body, p3) in self.exp(close.end) {
                    let exp = Exp::If {
                        not,
                        cond: cond.clone(),
                        body: Box::new(body),
                    };
                    out.push((exp, p3));
                }
            }
        }
        out
    }

    /// `[rator] "=" [rator]`
    fn assign(&self, pos: usize) -> Parses<Assign> {
        let mut out = Vec::new();
        for (before, p1) in self.opt_lits(pos, RATORS) {
            let Some(eq) = self.s.lit(p1, "=") else {
                continue;
            };
            for (after, p2) in self.opt_lits(eq.end, RATORS) {
                let op = Assign {
                    before: before.clone(),
                    after,
                };
                out.push((op, p2));
            }
        }
        out
    }

    fn value(&self, pos: usize) -> Parses<Value> {
        let mut out: Parses<Value> = self
            .operand(pos)
            .into_iter()
            .map(|(op, end)| (Value::Operand(op), end))
            .collect();
        out.extend(
            self.exp(pos)
                .into_iter()
                .map(|(exp, end)| (Value::Exp(Box::new(exp)), end)),
        );
        out
    }

    fn assign_to_op(&self, pos: usize) -> Parses<Exp> {
        let mut out = Vec::new();
        for (dst, p1) in self.operand(pos) {
            let mut seconds: Parses<Option<Reg>> = Vec::new();
            if let Some(comma) = self.s.lit(p1, ",") {
                seconds.extend(self.reg(comma.end).into_iter().map(|(r, e)| (Some(r), e)));
            }
            seconds.push((None, p1));

            for (second, p2) in seconds {
                for (op, p3) in self.assign(p2) {
                    for (value, p4) in self.value(p3) {
                        let exp = Exp::AssignToOp {
                            dst: dst.clone(),
                            second: second.clone(),
                            op: op.clone(),
                            value,
                        };
                        out.push((exp, p4));
                    }
                }
            }
        }
        out
    }

    fn assign_comma(&self, pos: usize) -> Parses<Exp> {
        let mut out = Vec::new();
        for (dst, p1) in self.operand(pos) {
            for (op, p2) in self.assign(p1) {
                for (value, p3) in self.value(p2) {
                    let Some(semi) = self.s.lit(p3, ";") else {
                        continue;
                    };
                    for (rest, p4) in self.exp(semi.end) {
                        let exp = Exp::AssignComma {
                            dst: dst.clone(),
                            op: op.clone(),
                            value: value.clone(),
                            rest: Box::new(rest),
                        };
                        out.push((exp, p4));
                    }
                }
            }
        }
        out
    }

    fn call_exp(&self, pos: usize) -> Parses<Exp> {
        let mut out = Vec::new();
        for (not, p1) in self.not(pos) {
            for (call, p2) in self.call(p1) {
                for (hints, p3) in self.hints(p2) {
                    let exp = Exp::Call {
                        not,
                        call: call.clone(),
                        hints,
                    };
                    out.push((exp, p3));
                }
            }
        }
        out
    }

    /// Longest hint chains first, the empty chain last.
    fn hints(&self, pos: usize) -> Parses<Vec<String>> {
        let mut out = Vec::new();
        for (hint, p1) in self.lits(pos, CHAIN_HINTS) {
            for (rest, p2) in self.hints(p1) {
                let mut chain = vec![hint.clone()];
                chain.extend(rest);
                out.push((chain, p2));
            }
        }
        for (hint, p1) in self.lits(pos, LAST_HINTS) {
            out.push((vec![hint], p1));
        }
        out.push((Vec::new(), pos));
        out
    }

    /// `[subfield] [rator] "=" [rator] value [subfield]`
    #[allow(clippy::type_complexity)]
    fn tail(&self, pos: usize) -> Parses<(Option<String>, Assign, Value, Option<String>)> {
        let mut out = Vec::new();
        for (dst_sub, p1) in self.opt_lits(pos, SUBFIELDS) {
            for (op, p2) in self.assign(p1) {
                for (value, p3) in self.value(p2) {
                    for (sub, p4) in self.opt_lits(p3, SUBFIELDS) {
                        out.push(((dst_sub.clone(), op.clone(), value.clone(), sub), p4));
                    }
                }
            }
        }
        out
    }

    fn cond(&self, pos: usize) -> Parses<Cond> {
        let mut out = Vec::new();
        for (a, p1) in self.operand(pos) {
            for (cmp, p2) in self.lits(p1, COMPARES) {
                for (b, p3) in self.operand(p2) {
                    out.push((Cond::Compare(a.clone(), cmp.clone(), b), p3));
                }
            }
            out.push((Cond::Operand(a), p1));
        }
        out.extend(self.call(pos).into_iter().map(|(c, e)| (Cond::Call(c), e)));
        out
    }

    fn insn(&self, pos: usize) -> Parses<String> {
        let start = self.s.skip_ws(pos);
        let mut ends = Vec::new();
        if let Some(word) = self.s.word(pos) {
            ends.push(word.end);
            for joint in [".", "_"] {
                if let Some(j) = self.s.lit(word.end, joint)
                    && let Some(w2) = self.s.word(j.end)
                {
                    ends.push(w2.end);
                }
            }
            if let Some(d1) = self.s.digit(word.end) {
                ends.push(d1.end);
                if let Some(d2) = self.s.digit(d1.end) {
                    ends.push(d2.end);
                }
            }
            ends.extend(
                self.s
                    .any_lit(word.end, &[":t", ":nt", "128", "256"])
                    .into_iter()
                    .map(|s| s.end),
            );
        }
        if let Some(c) = self.s.lit(pos, "convert_")
            && let Some(w1) = self.s.word(c.end)
            && let Some(two) = self.s.lit(w1.end, "2")
            && let Some(w2) = self.s.word(two.end)
        {
            ends.push(w2.end);
        }
        if let Some(sp) = self.s.lit(pos, "sp")
            && let Some(d1) = self.s.digit(sp.end)
            && let Some(lp) = self.s.lit(d1.end, "loop")
            && let Some(d2) = self.s.digit(lp.end)
        {
            ends.push(d2.end);
        }
        if let Some(k0) = self.s.lit(pos, "k0") {
            let after = self.s.lit(k0.end, "un").map_or(k0.end, |s| s.end);
            if let Some(lock) = self.s.lit(after, "lock") {
                ends.push(lock.end);
            }
        }
        if let Some(l2) = self.s.lit(pos, "l2")
            && let Some(w) = self.s.word(l2.end)
        {
            ends.push(w.end);
        }
        ends.into_iter()
            .map(|end| (self.s_text(start, end), end))
            .collect()
    }

    fn s_text(&self, start: usize, end: usize) -> String {
        self.text(crate::scanner::Span { start, end })
    }

    fn call(&self, pos: usize) -> Parses<Call> {
        let mut out = Vec::new();
        for (insn, p) in self.insn(pos) {
            let call = |args| Call {
                insn: insn.clone(),
                args,
            };
            out.push((call(Args::None), p));
            for (op, q) in self.operand(p) {
                out.push((call(Args::Bare(op)), q));
            }
            let Some(open) = self.s.lit(p, "(") else {
                continue;
            };
            for (args, end) in self.call_args(open.end) {
                out.push((call(args), end));
            }
        }
        out
    }

    /// Arguments after `(`, through the closing `)`.
    fn call_args(&self, pos: usize) -> Parses<Args> {
        let mut out = Vec::new();
        let close = |p: usize| self.s.lit(p, ")").map(|s| s.end);

        for (a, p1) in self.operand(pos) {
            if let Some(end) = close(p1) {
                out.push((Args::One(a.clone()), end));
            }
            if let Some(comma) = self.s.lit(p1, ",") {
                for (b, p2) in self.operand(comma.end) {
                    if let Some(end) = close(p2) {
                        out.push((Args::Two(a.clone(), b.clone()), end));
                    }
                    if let Some(comma2) = self.s.lit(p2, ",") {
                        for (c, p3) in self.operand(comma2.end) {
                            if let Some(end) = close(p3) {
                                out.push((Args::Three(a.clone(), b.clone(), c), end));
                            }
                        }
                    }
                }
                for (rator, p2) in self.lits(comma.end, RATORS) {
                    for (b, p3) in self.operand(p2) {
                        if let Some(end) = close(p3) {
                            out.push((Args::TwoRator(a.clone(), rator.clone(), b), end));
                        }
                    }
                }
                for (inner, p2) in self.call(comma.end) {
                    if let Some(end) = close(p2) {
                        out.push((Args::NestedAfter(a.clone(), Box::new(inner)), end));
                    }
                }
            }
            for (r1, p2) in self.lits(p1, RATORS) {
                for (b, p3) in self.operand(p2) {
                    if let Some(end) = close(p3) {
                        out.push((Args::Rator2(a.clone(), r1.clone(), b.clone()), end));
                    }
                    for (r2, p4) in self.lits(p3, RATORS) {
                        for (c, p5) in self.operand(p4) {
                            if let Some(end) = close(p5) {
                                let args =
                                    Args::Rator3(a.clone(), r1.clone(), b.clone(), r2.clone(), c);
                                out.push((args, end));
                            }
                        }
                    }
                }
            }
        }

        for (inner, p1) in self.call(pos) {
            if let Some(end) = close(p1) {
                out.push((Args::Nested(Box::new(inner.clone())), end));
            }
            if let Some(comma) = self.s.lit(p1, ",") {
                for (b, p2) in self.operand(comma.end) {
                    if let Some(end) = close(p2) {
                        out.push((Args::NestedBefore(Box::new(inner.clone()), b), end));
                    }
                }
            }
        }
        out
    }

    fn reg(&self, pos: usize) -> Parses<Reg> {
        self.s
            .reg(pos)
            .map(|(span, RegMatch { class, id, half })| {
                let reg = Reg {
                    class,
                    id,
                    half,
                    text: self.text(span),
                };
                (reg, span.end)
            })
            .into_iter()
            .collect()
    }

    fn operand(&self, pos: usize) -> Parses<Operand> {
        let mut out = Vec::new();

        if let Some(hash) = self.s.lit(pos, "#")
            && let Some((span, value)) = self.s.signed_number(hash.end)
        {
            out.push((Operand::Const(value), span.end));
        }
        let imm = self.s.imm(pos);
        if let Some((span, letter)) = imm {
            out.push((Operand::Imm(letter), span.end));
        }

        for (reg, p) in self.reg(pos) {
            out.push((Operand::Reg(reg.clone()), p));
            for (suffix, q) in self.lits(p, DOT_SUFFIXES) {
                out.push((Operand::RegDot(reg.clone(), suffix), q));
            }
            for (sub, q) in self.lits(p, SUBFIELDS) {
                out.push((Operand::RegDot(reg.clone(), sub), q));
            }
            if let Some(brev) = self.s.lit(p, ":brev") {
                out.push((Operand::Brev(reg.clone()), brev.end));
            }
            if let Some(star) = self.s.lit(p, "*") {
                out.push((Operand::Star(reg.clone()), star.end));
            }
        }

        if let Some(p) = self.s.lit(pos, "p")
            && let Some(d) = self.s.digit(p.end)
        {
            let name = format!("P{}", self.text(d));
            if let Some(new) = self.s.lit(d.end, ".new") {
                out.push((Operand::PredNew(name.clone()), new.end));
            }
            out.push((Operand::Pred(name), d.end));
        }
        if let Some(gp) = self.s.lit(pos, "gp") {
            out.push((Operand::Gp, gp.end));
        }
        for end in self.sys_reg(pos) {
            let start = self.s.skip_ws(pos);
            out.push((Operand::Sys(self.s_text(start, end)), end));
        }

        if let Some(bang) = self.s.lit(pos, "!") {
            for (reg, p) in self.reg(bang.end) {
                out.push((Operand::Not(reg), p));
            }
        }

        let mut bases = Vec::new();
        if let Some((span, letter)) = imm {
            bases.push((CircBase::Imm(letter), span.end));
        }
        if let Some(i) = self.s.lit(pos, "I") {
            bases.push((CircBase::Implicit, i.end));
        }
        for (base, p1) in bases {
            let Some(circ) = self.s.lit(p1, ":circ(") else {
                continue;
            };
            for (reg, p2) in self.reg(circ.end) {
                if let Some(close) = self.s.lit(p2, ")") {
                    out.push((Operand::Circ(base.clone(), reg), close.end));
                }
            }
        }
        out
    }

    /// Ends of `pc`, `sgpN[:0]`, `r29` and `r31`.
    fn sys_reg(&self, pos: usize) -> Vec<usize> {
        let mut ends: Vec<usize> = self
            .s
            .any_lit(pos, &["pc", "r29", "r31"])
            .into_iter()
            .map(|s| s.end)
            .collect();
        if let Some(sgp) = self.s.lit(pos, "sgp")
            && let Some(d) = self.s.digit(sgp.end)
        {
            if let Some(pair) = self.s.lit(d.end, ":0") {
                ends.push(pair.end);
            }
            ends.push(d.end);
        }
        ends
    }
}

/// Parse one syntax string.
///
/// # Errors
///
/// Returns [`SyntaxError::Parse`] with the furthest offset reached when no
/// parse covers the whole string.
pub fn parse(tag: &str, text: &str) -> Result<Exp> {
    let g = Grammar {
        s: Scanner::new(text),
    };
    g.exp(0)
        .into_iter()
        .find(|(_, end)| g.s.at_end(*end))
        .map(|(exp, _)| exp)
        .ok_or_else(|| SyntaxError::Parse {
            tag: tag.to_string(),
            text: text.to_string(),
            position: g.s.furthest(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reg(class: char, id: &str, text: &str) -> Reg {
        Reg {
            class,
            id: id.to_string(),
            half: String::new(),
            text: text.to_string(),
        }
    }

    fn ok(text: &str) -> Exp {
        parse("T", text).unwrap()
    }

    #[test]
    fn test_assign_to_operand() {
        let exp = ok("Rd32=add(Rs32,Rt32)");
        let expected = Exp::AssignToOp {
            dst: Operand::Reg(reg('R', "d", "Rd32")),
            second: None,
            op: Assign::default(),
            value: Value::Exp(Box::new(Exp::Call {
                not: false,
                call: Call {
                    insn: "add".to_string(),
                    args: Args::Two(
                        Operand::Reg(reg('R', "s", "Rs32")),
                        Operand::Reg(reg('R', "t", "Rt32")),
                    ),
                },
                hints: Vec::new(),
            })),
        };
        assert_eq!(exp, expected);
    }

    #[test]
    fn test_compound_assign_operator() {
        let Exp::AssignToOp { op, .. } = ok("Rx32+=add(Rs32,Rt32)") else {
            panic!("expected an assignment");
        };
        assert_eq!(op.before.as_deref(), Some("+"));
        assert_eq!(op.after, None);
    }

    #[test]
    fn test_bare_call() {
        let exp = ok("jump #r22:2");
        assert_eq!(
            exp,
            Exp::Call {
                not: false,
                call: Call {
                    insn: "jump".to_string(),
                    args: Args::Bare(Operand::Imm('r')),
                },
                hints: Vec::new(),
            }
        );
    }

    #[test]
    fn test_store_is_assign_to_exp() {
        let Exp::AssignToExp { dst, value, .. } = ok("memw(Rs32+#s11:2)=Rt32") else {
            panic!("expected a store form");
        };
        assert!(matches!(
            *dst,
            Exp::Call { call: Call { ref insn, args: Args::Rator2(..) }, .. } if insn == "memw"
        ));
        assert_eq!(value, Value::Operand(Operand::Reg(reg('R', "t", "Rt32"))));
    }

    #[test]
    fn test_hints_chain() {
        let Exp::AssignToOp { value: Value::Exp(call), .. } =
            ok("Rd32=vrcmpys(Rss32,Rt32):<<1:rnd:sat:raw:hi")
        else {
            panic!("expected an assignment");
        };
        let Exp::Call { hints, .. } = *call else {
            panic!("expected a call");
        };
        assert_eq!(hints, [":<<1", ":rnd", ":sat", ":raw", ":hi"]);
    }

    #[test]
    fn test_instruction_words() {
        for (text, insn) in [
            ("cmp.eq(Rs32,Rt32)", "cmp.eq"),
            ("dealloc_return", "dealloc_return"),
            ("loop0(#r7:2,Rs32)", "loop0"),
            ("jump:nt #r9:2", "jump:nt"),
            ("sp1loop0(#r7:2,Rs32)", "sp1loop0"),
            ("k0unlock", "k0unlock"),
            ("l2fetch(Rs32,Rt32)", "l2fetch"),
            ("convert_sf2df(Rs32)", "convert_sf2df"),
        ] {
            let Exp::Call { call, .. } = ok(text) else {
                panic!("{text}: expected a call");
            };
            assert_eq!(call.insn, insn, "{text}");
        }
    }

    #[test]
    fn test_operand_forms() {
        let Exp::Call { call, .. } = ok("memub(Rx32++#s4:0:circ(Mu2))") else {
            panic!("expected a call");
        };
        assert_eq!(
            call.args,
            Args::Rator2(
                Operand::Reg(reg('R', "x", "Rx32")),
                "++".to_string(),
                Operand::Circ(CircBase::Imm('s'), reg('M', "u", "Mu2")),
            )
        );

        let Exp::Call { call, .. } = ok("memw(Rx32++Mu2:brev)") else {
            panic!("expected a call");
        };
        assert!(matches!(call.args, Args::Rator2(_, _, Operand::Brev(_))));

        let Exp::If { cond, .. } = ok("if (cmp.eq(Ns8.new,#U5)) jump:t #r9:2") else {
            panic!("expected a conditional");
        };
        let Cond::Call(Call { args: Args::Two(a, b), .. }) = cond else {
            panic!("expected a compare call");
        };
        assert_eq!(a, Operand::RegDot(reg('N', "s", "Ns8"), ".new".to_string()));
        assert_eq!(b, Operand::Imm('U'));
    }

    #[test]
    fn test_compare_condition() {
        let Exp::If { not, cond, .. } = ok("if (Rs32==#0) jump:nt #r13:2") else {
            panic!("expected a conditional");
        };
        assert!(!not);
        assert_eq!(
            cond,
            Cond::Compare(
                Operand::Reg(reg('R', "s", "Rs32")),
                "==".to_string(),
                Operand::Const(0)
            )
        );
    }

    #[test]
    fn test_assign_comma() {
        let Exp::AssignComma { value, rest, .. } = ok("Rd16=#U6 ; jump #r9:2") else {
            panic!("expected a comma form");
        };
        assert_eq!(value, Value::Operand(Operand::Imm('U')));
        assert!(matches!(*rest, Exp::Call { .. }));
    }

    #[test]
    fn test_representative_syntax() {
        for text in [
            "jump #r22:2",
            "jumpr Rs32",
            "Rd32=add(Rs32,Rt32)",
            "Rd32=sub(Rt32,Rs32)",
            "Rd32=add(Rt.L32,Rs.L32)",
            "Rdd32=add(Rss32,Rtt32)",
            "Rdd32=add(Rss32,Rtt32):sat",
            "immext(#u26:6)",
            "Rdd32=combine(#s8,#U6)",
            "memd(r29+#s6:3)=Rtt8",
            "p0=cmp.eq(Rs16,#U5); if (p0.new) jump:nt #r9:2",
            "if (Rs32==#0) jump:nt #r13:2",
            "Rd32=memub(Rt32<<#u2+#U6)",
            "Rd32=memub(Rx32++#s4:0:circ(Mu2))",
            "Rd32=memub(Rx32++I:circ(Mu2))",
            "allocframe(Rx32,#u11:3):raw",
            "if (Pv4.new) Rdd32=dealloc_return(Rs32):t:raw",
            "Rxx32,Pe4=vacsh(Rss32,Rtt32)",
            "Rx32+=sfmpy(Rs32,Rt32,Pu4):scale",
            "memh(Rs32+#s11:1)=Rt.H32",
            "p0=cmp.eq(Rs16,#-1); if (p0.new) jump:nt #r9:2",
            "Rd16=#U6 ; jump #r9:2",
            "if (cmp.eq(Ns8.new,#U5)) jump:t #r9:2",
            "loop0(#r7:2,Rs32)",
            "loop0(#r7:2,#U10)",
            "Rd32=memw(gp+#u16:2)",
            "Pd4=!cmp.eq(Rs32,#s10)",
            "if (!Pu4) Rd32=#s12",
            "Rx.H32=#u16",
            "Rdd8=combine(#0,#u2)",
            "Vd32.w=vadd(Vu32.w,Vv32.w)",
            "Rx32=add(#u8,asl(Rx32,#U5))",
            "memw(Rs32+#s11:2)=Nt8.new",
            "Rdd32=sgp1:0",
            "Rd32=add(pc,#u6)",
            "Rx32^=and(Rs32,Rt32)",
            "Rd32=convert_sf2w(Rs32):chop",
            "if (Pt4) memw(Rs32+#u6:2)=Rt32",
            "memw_locked(Rs32,Pd4)=Rt32",
            "endloop0",
            "barrier",
        ] {
            assert!(parse("T", text).is_ok(), "{text}");
        }
    }

    #[test]
    fn test_parse_errors_report_furthest_offset() {
        let err = parse("X", "Rd32=add(Rs32").unwrap_err();
        assert_eq!(
            err,
            SyntaxError::Parse {
                tag: "X".to_string(),
                text: "Rd32=add(Rs32".to_string(),
                position: 13,
            }
        );
        assert!(matches!(
            parse("X", "Rd32=add(Rs32,Rt32) junk"),
            Err(SyntaxError::Parse { position: 20, .. })
        ));
    }
}
