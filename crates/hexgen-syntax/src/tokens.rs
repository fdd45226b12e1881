//! Flattening a parsed syntax string into display tokens.

use hexgen_facts::TagFacts;
use hexgen_ir::{IntToken, Token};
use tracing::trace;

use crate::grammar::{self, Args, Assign, Call, CircBase, Cond, Exp, Operand, Value};
use crate::placement::TokenCtx;
use crate::Result;

struct Walker<'a> {
    ctx: TokenCtx<'a>,
    out: Vec<Token>,
}

impl Walker<'_> {
    fn text(&mut self, s: &str) {
        self.out.push(Token::text(s));
    }

    fn exp(&mut self, exp: &Exp) -> Result<()> {
        match exp {
            Exp::Call { not, call, hints } => {
                if *not {
                    self.text("!");
                }
                self.call(call)?;
                for hint in hints {
                    self.text(hint);
                }
            }
            Exp::If { not, cond, body } => {
                self.text("if (");
                if *not {
                    self.text("!");
                }
                self.cond(cond)?;
                self.text(") ");
                self.exp(body)?;
            }
            Exp::AssignToOp {
                dst,
                second,
                op,
                value,
            } => {
                self.operand(dst)?;
                if let Some(reg) = second {
                    self.text(",");
                    let tokens = self.ctx.register(reg)?;
                    self.out.extend(tokens);
                }
                self.assign(op);
                self.value(value)?;
            }
            Exp::AssignComma {
                dst,
                op,
                value,
                rest,
            } => {
                self.operand(dst)?;
                self.assign(op);
                self.value(value)?;
                self.text(";");
                self.exp(rest)?;
            }
            Exp::AssignToExp {
                dst,
                dst_subfield,
                op,
                value,
                subfield,
            } => {
                self.exp(dst)?;
                if let Some(sub) = dst_subfield {
                    self.text(sub);
                }
                self.assign(op);
                self.value(value)?;
                if let Some(sub) = subfield {
                    self.text(sub);
                }
            }
        }
        Ok(())
    }

    fn assign(&mut self, op: &Assign) {
        if let Some(before) = &op.before {
            self.text(before);
        }
        self.text(" = ");
        if let Some(after) = &op.after {
            self.text(after);
        }
    }

    fn value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Operand(op) => self.operand(op),
            Value::Exp(exp) => self.exp(exp),
        }
    }

    fn cond(&mut self, cond: &Cond) -> Result<()> {
        match cond {
            Cond::Operand(op) => self.operand(op),
            Cond::Compare(a, cmp, b) => {
                self.operand(a)?;
                self.text(cmp);
                self.operand(b)
            }
            Cond::Call(call) => self.call(call),
        }
    }

    fn call(&mut self, call: &Call) -> Result<()> {
        self.out.push(Token::insn(call.insn.as_str()));
        match &call.args {
            Args::None => return Ok(()),
            Args::Bare(op) => {
                self.text(" ");
                return self.operand(op);
            }
            Args::One(a) => {
                self.text("(");
                self.operand(a)?;
            }
            Args::Two(a, b) => {
                self.text("(");
                self.operand(a)?;
                self.text(",");
                self.operand(b)?;
            }
            Args::TwoRator(a, rator, b) => {
                self.text("(");
                self.operand(a)?;
                self.text(",");
                self.text(rator);
                self.operand(b)?;
            }
            Args::Three(a, b, c) => {
                self.text("(");
                self.operand(a)?;
                self.text(",");
                self.operand(b)?;
                self.text(",");
                self.operand(c)?;
            }
            Args::Rator2(a, rator, b) => {
                self.text("(");
                self.operand(a)?;
                self.text(rator);
                self.operand(b)?;
            }
            Args::Rator3(a, r1, b, r2, c) => {
                self.text("(");
                self.operand(a)?;
                self.text(r1);
                self.operand(b)?;
                self.text(r2);
                self.operand(c)?;
            }
            Args::Nested(inner) => {
                self.text("(");
                self.call(inner)?;
            }
            Args::NestedAfter(a, inner) => {
                self.text("(");
                self.operand(a)?;
                self.text(",");
                self.call(inner)?;
            }
            Args::NestedBefore(inner, b) => {
                self.text("(");
                self.call(inner)?;
                self.text(",");
                self.operand(b)?;
            }
        }
        self.text(")");
        Ok(())
    }

    fn operand(&mut self, op: &Operand) -> Result<()> {
        match op {
            Operand::Const(v) => {
                self.text("#");
                self.out.push(Token::Integer(IntToken::Literal(*v)));
            }
            Operand::Imm(letter) => {
                let tokens = self.ctx.immediate(*letter)?;
                self.out.extend(tokens);
            }
            Operand::Reg(reg) => {
                let tokens = self.ctx.register(reg)?;
                self.out.extend(tokens);
            }
            Operand::RegDot(reg, suffix) => {
                let tokens = self.ctx.register(reg)?;
                self.out.extend(tokens);
                self.out.push(Token::named_reg(suffix.as_str()));
            }
            Operand::Pred(name) => self.out.push(Token::named_reg(name.as_str())),
            Operand::PredNew(name) => {
                self.out.push(Token::named_reg(name.as_str()));
                self.out.push(Token::named_reg(".new"));
            }
            Operand::Gp => self.out.push(Token::GpOrZero("GP".to_string())),
            Operand::Sys(text) => {
                let name = match text.as_str() {
                    "r29" => "SP".to_string(),
                    "r31" => "LR".to_string(),
                    other => other.to_uppercase(),
                };
                self.out.push(Token::named_reg(name));
            }
            Operand::Brev(reg) => {
                let tokens = self.ctx.register(reg)?;
                self.out.extend(tokens);
                self.text(":brev");
            }
            Operand::Star(reg) => {
                let tokens = self.ctx.register(reg)?;
                self.out.extend(tokens);
                self.text("*");
            }
            Operand::Not(reg) => {
                self.text("!");
                let tokens = self.ctx.register(reg)?;
                self.out.extend(tokens);
            }
            Operand::Circ(base, reg) => {
                match base {
                    CircBase::Imm(letter) => {
                        let tokens = self.ctx.immediate(*letter)?;
                        self.out.extend(tokens);
                    }
                    CircBase::Implicit => self.text("I"),
                }
                self.text(":circ(");
                let tokens = self.ctx.register(reg)?;
                self.out.extend(tokens);
                self.text(")");
            }
        }
        Ok(())
    }
}

/// Token stream for one tag, in display order.
///
/// # Errors
///
/// Fails when the syntax string does not parse, names a register the tag
/// has no operand for, or has an immediate that cannot be placed.
pub fn tokenize(facts: &TagFacts) -> Result<Vec<Token>> {
    let exp = grammar::parse(&facts.tag, &facts.syntax)?;
    let mut walker = Walker {
        ctx: TokenCtx::new(facts),
        out: Vec::new(),
    };
    walker.exp(&exp)?;
    trace!(tag = %facts.tag, tokens = walker.out.len(), "tokenized");
    Ok(walker.out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyntaxError;
    use hexgen_ir::{HexRegisterNamer, InsnContext, RegToken, render, resolve_all};
    use pretty_assertions::assert_eq;

    fn facts(tag: &str, syntax: &str, sem: &str, attrs: &[&str]) -> TagFacts {
        TagFacts::new(tag, syntax, sem, attrs.iter().copied().collect())
    }

    fn r(slot: usize) -> Token {
        Token::Register(RegToken::Operand {
            class: 'R',
            subfield: String::new(),
            slot,
            pair_high: false,
        })
    }

    fn imm(slot: u8) -> Token {
        Token::Integer(IntToken::Immediate(slot))
    }

    fn addresses(tokens: &[Token]) -> Vec<u8> {
        tokens
            .iter()
            .filter_map(|t| match t {
                Token::Address { slot } => Some(*slot),
                _ => None,
            })
            .collect()
    }

    fn show(tokens: &[Token], ctx: &InsnContext) -> String {
        render(&resolve_all(tokens, ctx, &HexRegisterNamer).unwrap())
    }

    #[test]
    fn test_add() {
        let f = facts("A2_add", "Rd32=add(Rs32,Rt32)", "{ RdV=RsV+RtV;}", &[]);
        let tokens = tokenize(&f).unwrap();
        assert_eq!(
            tokens,
            [
                r(0),
                Token::text(" = "),
                Token::insn("add"),
                Token::text("("),
                r(1),
                Token::text(","),
                r(2),
                Token::text(")"),
            ]
        );
        let ctx = InsnContext {
            regno: vec![1, 2, 3],
            ..InsnContext::default()
        };
        assert_eq!(show(&tokens, &ctx), "R1 = add(R2,R3)");
    }

    #[test]
    fn test_jump() {
        let f = facts("J2_jump", "jump #r22:2", "", &["A_JUMP"]);
        let tokens = tokenize(&f).unwrap();
        assert_eq!(
            tokens,
            [Token::insn("jump"), Token::text(" "), Token::Address { slot: 0 }]
        );
        let ctx = InsnContext {
            pc: 0x1000,
            immed: [0x20, 0],
            ..InsnContext::default()
        };
        assert_eq!(show(&tokens, &ctx), "jump 0x1020");
    }

    #[test]
    fn test_register_pairs() {
        let f = facts("A2_addp", "Rdd32=add(Rss32,Rtt32)", "", &[]);
        let tokens = tokenize(&f).unwrap();
        let ctx = InsnContext {
            regno: vec![0, 2, 4],
            ..InsnContext::default()
        };
        assert_eq!(show(&tokens, &ctx), "R1:R0 = add(R3:R2,R5:R4)");
    }

    #[test]
    fn test_immediate_prefixes() {
        let f = facts(
            "A4_combineii",
            "Rdd32=combine(#s8,#U6)",
            "{ fIMMEXT(UiV); RddV = fCOMBINE(siV, UiV); }",
            &[],
        );
        let tokens = tokenize(&f).unwrap();
        assert_eq!(
            tokens[tokens.len() - 7..],
            [
                Token::text("("),
                Token::text("#"),
                imm(0),
                Token::text(","),
                Token::ImmPrefix,
                imm(1),
                Token::text(")"),
            ]
        );
        let mut ctx = InsnContext {
            regno: vec![6],
            immed: [5, 0x40],
            extension_valid: false,
            ..InsnContext::default()
        };
        assert_eq!(show(&tokens, &ctx), "R7:R6 = combine(#0x5,#0x40)");
        ctx.extension_valid = true;
        assert_eq!(show(&tokens, &ctx), "R7:R6 = combine(#0x5,##0x40)");
    }

    #[test]
    fn test_stack_store() {
        let f = facts("SS2_stored_sp", "memd(r29+#s6:3)=Rtt8", "", &[]);
        let tokens = tokenize(&f).unwrap();
        assert_eq!(tokens[2], Token::named_reg("SP"));
        assert_eq!(tokens[3], Token::text("+"));
        let ctx = InsnContext {
            regno: vec![2],
            immed: [0x18, 0],
            ..InsnContext::default()
        };
        assert_eq!(show(&tokens, &ctx), "memd(SP+#0x18) = R3:R2");
    }

    #[test]
    fn test_compare_jump_targets() {
        for (tag, syntax, attrs) in [
            (
                "J4_cmpeqn1_tp0_jump_nt",
                "p0=cmp.eq(Rs16,#-1); if (p0.new) jump:nt #r9:2",
                &["A_JUMP", "A_NEWCMPJUMP"][..],
            ),
            (
                "J4_cmpeqi_tp0_jump_nt",
                "p0=cmp.eq(Rs16,#U5); if (p0.new) jump:nt #r9:2",
                &["A_JUMP", "A_NEWCMPJUMP"][..],
            ),
            (
                "J4_cmpeqi_t_jumpnv_t",
                "if (cmp.eq(Ns8.new,#U5)) jump:t #r9:2",
                &["A_JUMP", "A_DOTNEWVALUE", "A_MEMLIKE_PACKET_RULES"][..],
            ),
            ("J4_jumpseti", "Rd16=#U6 ; jump #r9:2", &["A_JUMP"][..]),
        ] {
            let tokens = tokenize(&facts(tag, syntax, "", attrs)).unwrap();
            assert_eq!(addresses(&tokens), [0], "{tag}");
            let last = tokens.last().unwrap();
            assert_eq!(*last, Token::Address { slot: 0 }, "{tag}");
        }
    }

    #[test]
    fn test_new_value_compare_jump_tokens() {
        let f = facts(
            "J4_cmpeqi_t_jumpnv_t",
            "if (cmp.eq(Ns8.new,#U5)) jump:t #r9:2",
            "",
            &["A_JUMP", "A_DOTNEWVALUE", "A_MEMLIKE_PACKET_RULES"],
        );
        let tokens = tokenize(&f).unwrap();
        let ctx = InsnContext {
            pc: 0x100,
            regno: vec![4],
            immed: [0x10, 3],
            ..InsnContext::default()
        };
        assert_eq!(show(&tokens, &ctx), "if (cmp.eq(R4.new,#0x3)) jump:t 0x110");
    }

    #[test]
    fn test_loop_setup_has_one_target() {
        for (tag, syntax) in [("J2_loop0r", "loop0(#r7:2,Rs32)"), ("J2_loop0i", "loop0(#r7:2,#U10)")] {
            let tokens = tokenize(&facts(tag, syntax, "", &["A_IMPLICIT_WRITES_SA0"])).unwrap();
            assert_eq!(addresses(&tokens), [0], "{tag}");
        }
    }

    #[test]
    fn test_placement_errors() {
        let f = facts("J2_odd", "jump(#r9:2,#U5)", "", &["A_JUMP"]);
        assert!(matches!(
            tokenize(&f),
            Err(SyntaxError::AmbiguousPlacement { .. })
        ));
    }

    #[test]
    fn test_gp_relative() {
        let f = facts("L2_loadrigp", "Rd32=memw(gp+#u16:2)", "", &[]);
        let tokens = tokenize(&f).unwrap();
        assert!(tokens.contains(&Token::GpOrZero("GP".to_string())));
        let mut ctx = InsnContext {
            regno: vec![0],
            immed: [8, 0],
            ..InsnContext::default()
        };
        assert_eq!(show(&tokens, &ctx), "R0 = memw(GP+#0x8)");
        ctx.extension_valid = true;
        assert_eq!(show(&tokens, &ctx), "R0 = memw(0+#0x8)");
    }

    #[test]
    fn test_register_errors() {
        let mut f = facts("A2_add", "Rd32=add(Rs32,Rt32)", "", &[]);
        f.regs.pop();
        assert!(matches!(
            tokenize(&f),
            Err(SyntaxError::UnknownRegister { ref text, .. }) if text == "Rt32"
        ));

        let f = facts("X", "Rdd.L32=#s8", "", &[]);
        assert!(matches!(tokenize(&f), Err(SyntaxError::BadPair { .. })));
        let f = facts("X", "Rddd32=#s8", "", &[]);
        assert!(matches!(tokenize(&f), Err(SyntaxError::BadPair { .. })));
    }

    #[test]
    fn test_circular_addressing() {
        let f = facts("L2_loadrub_pci", "Rd32=memub(Rx32++#s4:0:circ(Mu2))", "", &[]);
        let tokens = tokenize(&f).unwrap();
        let ctx = InsnContext {
            regno: vec![1, 2, 0],
            immed: [1, 0],
            ..InsnContext::default()
        };
        assert_eq!(show(&tokens, &ctx), "R1 = memub(R2++#0x1:circ(M0))");

        let f = facts("L2_loadrub_pcr", "Rd32=memub(Rx32++I:circ(Mu2))", "", &[]);
        let tokens = tokenize(&f).unwrap();
        assert_eq!(show(&tokens, &ctx), "R1 = memub(R2++I:circ(M0))");
    }

    #[test]
    fn test_hints_and_halves() {
        let f = facts(
            "L4_return_tnew_pt",
            "if (Pv4.new) Rdd32=dealloc_return(Rs32):t:raw",
            "",
            &[],
        );
        let ctx = InsnContext {
            regno: vec![0, 0, 30],
            ..InsnContext::default()
        };
        assert_eq!(
            show(&tokenize(&f).unwrap(), &ctx),
            "if (P0.new) R1:R0 = dealloc_return(FP):t:raw"
        );

        let f = facts("A2_addh_l16_ll", "Rd32=add(Rt.L32,Rs.L32)", "", &[]);
        let ctx = InsnContext {
            regno: vec![1, 2, 3],
            ..InsnContext::default()
        };
        assert_eq!(show(&tokenize(&f).unwrap(), &ctx), "R1 = add(R2.L,R3.L)");
    }

    #[test]
    fn test_constants_and_predicates() {
        let f = facts("SA1_combine0i", "Rdd8=combine(#0,#u2)", "", &[]);
        let tokens = tokenize(&f).unwrap();
        assert!(tokens.contains(&Token::Integer(IntToken::Literal(0))));

        let f = facts(
            "J4_cmpeqi_tp0_jump_nt",
            "p0=cmp.eq(Rs16,#U5); if (p0.new) jump:nt #r9:2",
            "",
            &["A_JUMP", "A_NEWCMPJUMP"],
        );
        let ctx = InsnContext {
            pc: 0x40,
            regno: vec![3],
            immed: [-8, 5],
            ..InsnContext::default()
        };
        assert_eq!(
            show(&tokenize(&f).unwrap(), &ctx),
            "P0 = cmp.eq(R3,#0x5);if (P0.new) jump:nt 0x38"
        );
    }

    #[test]
    fn test_parse_error_propagates() {
        let f = facts("X", "Rd32=add(Rs32", "", &[]);
        assert!(matches!(
            tokenize(&f),
            Err(SyntaxError::Parse { position: 13, .. })
        ));
    }
}
