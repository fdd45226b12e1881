//! Lowering of parsed semantics to effect IR.
//!
//! Each statement becomes zero or more [`Effect`]s; each expression becomes
//! one typed [`Expr`]. Widths come from operand bindings, and signedness is
//! carried on every node so that `>>`, orderings and casts pick the right
//! variant.

mod macros;

use hexgen_facts::{
    AccessMode, Attributes, OperandBinding, OperandBindings, OperandKind, OperandSlot, TagFacts,
};
use hexgen_ir::{BinaryOp, Effect, Expr, FixedReg, Label, Reg, TempReg};
use tracing::{debug, trace};

use crate::ast::{self, Assign, BinOp, RelOp, Stmt, UnOp};
use crate::lexer::{Token, TokenKind, lex_tokens};
use crate::normalize::{Normalizer, fixed_predicates};
use crate::parser::parse_tokens;
use crate::{Result, SemError};

/// Per-tag lowering context.
pub struct LowerCtx<'a> {
    facts: &'a TagFacts,
    bindings: &'a OperandBindings,
}

impl<'a> LowerCtx<'a> {
    #[must_use]
    pub const fn new(facts: &'a TagFacts, bindings: &'a OperandBindings) -> Self {
        Self { facts, bindings }
    }

    #[must_use]
    pub const fn attrs(&self) -> &Attributes {
        &self.facts.attributes
    }

    /// Lower a statement list.
    ///
    /// # Errors
    ///
    /// Returns the first lowering error.
    pub fn lower(&self, stmts: &[Stmt]) -> Result<Vec<Effect>> {
        let mut out = Vec::new();
        for stmt in stmts {
            out.extend(self.stmt(stmt)?);
        }
        Ok(out)
    }

    fn stmt(&self, stmt: &Stmt) -> Result<Vec<Effect>> {
        match stmt {
            Stmt::If { cond, then, els } => {
                let cond = self.lift(cond)?;
                let then = self.stmt(then)?;
                let els = match els {
                    Some(els) => self.stmt(els)?,
                    None => Vec::new(),
                };
                Ok(conditional(cond, then, els))
            }
            Stmt::Assign(assign) => self.assign(assign).map(|e| vec![e]),
            Stmt::Call { name, args } => macros::lower_stmt_call(self, name, args),
            Stmt::Block(stmts) => self.lower(stmts),
            Stmt::Empty | Stmt::Cancel => Ok(Vec::new()),
            Stmt::While { .. } => Err(SemError::Unsupported("while loop".to_string())),
            Stmt::For { .. } => Err(SemError::Unsupported("for loop".to_string())),
            Stmt::Return(_) => Err(SemError::Unsupported("return".to_string())),
        }
    }

    fn assign(&self, assign: &Assign) -> Result<Effect> {
        let target = self.operand(&assign.target)?;
        let mut value = self.lift(&assign.value)?;
        if let Some(op) = assign.op {
            value = binop(op, target.clone(), value)?;
        }
        match target {
            Expr::Register { reg, width, .. } => Ok(Effect::set_reg(width, reg, value)),
            other => Err(SemError::Operand {
                name: assign.target.text.clone(),
                detail: format!("assignment to non-register {other}"),
            }),
        }
    }

    /// Lower an expression.
    pub(crate) fn lift(&self, expr: &ast::Expr) -> Result<Expr> {
        match expr {
            ast::Expr::Id(tok) | ast::Expr::IntCon(tok) => self.operand(tok),
            ast::Expr::StrCon(tok) => Err(SemError::Unsupported(format!(
                "string literal {}",
                tok.text
            ))),
            ast::Expr::Call { name, args } => macros::lower_expr_call(self, name, args),
            ast::Expr::Unary { op, expr } => {
                let val = self.lift(expr)?;
                let width = val.width();
                Ok(match op {
                    UnOp::Neg => Expr::neg(width, val),
                    UnOp::Not | UnOp::BitNot => Expr::not(width, val),
                })
            }
            ast::Expr::Binary { op, left, right } => {
                binop(*op, self.lift(left)?, self.lift(right)?)
            }
            ast::Expr::Relational { op, left, right } => {
                Ok(relop(*op, self.lift(left)?, self.lift(right)?))
            }
            ast::Expr::Logical { .. } => Err(SemError::Unsupported(format!(
                "logical operator in {expr}"
            ))),
        }
    }

    /// Resolve a raw operand token.
    fn operand(&self, tok: &Token) -> Result<Expr> {
        match tok.kind {
            TokenKind::RegOld | TokenKind::RegNew => {
                let binding = self
                    .bindings
                    .get(&tok.text)
                    .ok_or_else(|| SemError::UnboundOperand(tok.text.clone()))?;
                Ok(Expr::operand(binding.width, &tok.text))
            }
            TokenKind::Ea => Ok(Expr::reg(4, Reg::Temp(TempReg::Ea))),
            TokenKind::RegLr => Ok(Expr::fixed(4, FixedReg::Lr)),
            TokenKind::Imm => Ok(Expr::symbol(4, &tok.text)),
            TokenKind::IntCon => Ok(Expr::constant(4, int_value(tok)?)),
            TokenKind::Tmp => {
                let temp = match tok.text.as_str() {
                    "tmp" => TempReg::Tmp,
                    "width" => TempReg::Width,
                    "offset" => TempReg::Offset,
                    _ => TempReg::Shamt,
                };
                Ok(Expr::reg(8, Reg::Temp(temp)))
            }
            _ => Err(SemError::Operand {
                name: tok.text.clone(),
                detail: "not a value".to_string(),
            }),
        }
    }
}

/// Value of an integer constant token.
fn int_value(tok: &Token) -> Result<u64> {
    let text = tok.text.replace('_', "");
    let parsed = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .map_or_else(|| text.parse(), |hex| u64::from_str_radix(hex, 16));
    parsed.map_err(|_| SemError::Operand {
        name: tok.text.clone(),
        detail: "integer out of range".to_string(),
    })
}

/// Binary operator at the left operand's width.
fn binop(op: BinOp, left: Expr, right: Expr) -> Result<Expr> {
    let width = left.width();
    let expr = match op {
        BinOp::Add => Expr::add(width, left, right),
        BinOp::Sub => Expr::sub(width, left, right),
        BinOp::Mul => Expr::mult(width, left, right),
        BinOp::Or => Expr::or(width, left, right),
        BinOp::And => Expr::and(width, left, right),
        BinOp::Xor => Expr::xor(width, left, right),
        BinOp::Shl => Expr::shl(width, left, right),
        BinOp::Shr => Expr::shr(width, left, right),
        BinOp::Div => return Err(SemError::Unsupported("division".to_string())),
    };
    Ok(expr)
}

/// Comparison, signed or unsigned by the left operand.
fn relop(op: RelOp, left: Expr, right: Expr) -> Expr {
    let signed = left.signed();
    let op = match (op, signed) {
        (RelOp::Eq, _) => BinaryOp::Eq,
        (RelOp::Ne, _) => BinaryOp::Ne,
        (RelOp::Le, true) => BinaryOp::Sle,
        (RelOp::Le, false) => BinaryOp::Ule,
        (RelOp::Lt, true) => BinaryOp::Slt,
        (RelOp::Lt, false) => BinaryOp::Ult,
        (RelOp::Ge, true) => BinaryOp::Sge,
        (RelOp::Ge, false) => BinaryOp::Uge,
        (RelOp::Gt, true) => BinaryOp::Sgt,
        (RelOp::Gt, false) => BinaryOp::Ugt,
    };
    Expr::compare(op, left.width(), left, right)
}

/// Structured conditional over host labels. An else branch that lowers to
/// nothing takes the two-label form.
fn conditional(cond: Expr, then: Vec<Effect>, els: Vec<Effect>) -> Vec<Effect> {
    let mut out = Vec::with_capacity(then.len() + els.len() + 8);
    if els.is_empty() {
        out.push(Effect::raw("{ LowLevelILLabel true_case, done;"));
        out.push(Effect::If {
            cond,
            then_label: Label::TrueCase,
            else_label: Label::Done,
        });
        out.push(Effect::Label(Label::TrueCase));
        out.extend(then);
    } else {
        out.push(Effect::raw("{ LowLevelILLabel true_case, false_case, done;"));
        out.push(Effect::If {
            cond,
            then_label: Label::TrueCase,
            else_label: Label::FalseCase,
        });
        out.push(Effect::Label(Label::TrueCase));
        out.extend(then);
        out.push(Effect::Goto(Label::Done));
        out.push(Effect::Label(Label::FalseCase));
        out.extend(els);
    }
    out.push(Effect::Label(Label::Done));
    out.push(Effect::raw("}"));
    out
}

/// Lifter body of one tag: operand declarations, then the lowered parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiftedBody {
    pub decls: Vec<Effect>,
    /// One part, or the compare part and the branch part of a compound
    /// compare-jump.
    pub parts: Vec<Vec<Effect>>,
}

impl LiftedBody {
    /// All effects in body order.
    #[must_use]
    pub fn effects(&self) -> Vec<Effect> {
        let mut out = self.decls.clone();
        match self.parts.as_slice() {
            [part1, part2] => {
                out.push(Effect::raw("if (insn.part1) {"));
                out.extend(part1.iter().cloned());
                out.push(Effect::raw("} else {"));
                out.extend(part2.iter().cloned());
                out.push(Effect::raw("}"));
            }
            parts => {
                for part in parts {
                    out.extend(part.iter().cloned());
                }
            }
        }
        out
    }

    /// Effects that are written to the lifter; branches are left to the
    /// packet.
    #[must_use]
    pub fn emitted(&self) -> Vec<Effect> {
        let mut effects = self.effects();
        effects.retain(|e| !e.is_branch());
        effects
    }
}

fn declaration(binding: &OperandBinding) -> String {
    let sym = &binding.symbol;
    let regno = match binding.slot {
        OperandSlot::Operand(i) => format!("MapRegNum('{}', insn.regno[{i}])", binding.class),
        OperandSlot::FixedPredicate(n) => format!("MapRegNum('P', {n})"),
    };
    let is_pred = binding.kind == OperandKind::Predicate;
    match (binding.mode, binding.is_pair(), is_pred) {
        (AccessMode::ReadOnly, true, _) => {
            format!("SourcePairReg tmp_{sym}({regno}, il); const int {sym} = tmp_{sym}.Reg();")
        }
        (AccessMode::ReadOnly, false, _) => format!("const int {sym} = {regno};"),
        (AccessMode::WriteOnly, true, _) => {
            format!("const int {sym} = ctx.AddDestWriteOnlyRegPair({regno});")
        }
        (AccessMode::ReadWrite, true, _) => {
            format!("const int {sym} = ctx.AddDestReadWriteRegPair({regno});")
        }
        (AccessMode::WriteOnly, false, false) => {
            format!("const int {sym} = ctx.AddDestWriteOnlyReg({regno});")
        }
        (AccessMode::ReadWrite, false, false) => {
            format!("const int {sym} = ctx.AddDestReadWriteReg({regno});")
        }
        (AccessMode::WriteOnly, false, true) => {
            format!("const int {sym} = ctx.AddDestWriteOnlyPredReg({regno});")
        }
        (AccessMode::ReadWrite, false, true) => {
            format!("const int {sym} = ctx.AddDestReadWritePredReg({regno});")
        }
    }
}

/// Declarations for instruction operands, then immediates, then fixed
/// predicates.
fn declarations(facts: &TagFacts, bindings: &OperandBindings) -> Vec<Effect> {
    let (fixed, operands): (Vec<_>, Vec<_>) = bindings
        .iter()
        .partition(|b| matches!(b.slot, OperandSlot::FixedPredicate(_)));

    let mut decls: Vec<Effect> = operands
        .into_iter()
        .map(|b| Effect::Raw(declaration(b)))
        .collect();
    decls.extend(
        facts
            .imms
            .iter()
            .map(|imm| Effect::Raw(format!("int {} = insn.immed[{}];", imm.symbol(), imm.slot()))),
    );
    decls.extend(fixed.into_iter().map(|b| Effect::Raw(declaration(b))));
    decls
}

/// Normalize, parse and lower the semantics of one tag.
///
/// # Errors
///
/// Returns the first error of any stage, or a binding error for an operand
/// the semantics cannot support.
pub fn lift(normalizer: &Normalizer, facts: &TagFacts) -> Result<LiftedBody> {
    let normalized = normalizer.normalize(&facts.semantics, &facts.attributes)?;
    let fixed = fixed_predicates(&normalized.parts);
    let bindings = OperandBindings::build(facts)?.with_fixed_predicates(&fixed);
    debug!(
        tag = %facts.tag,
        parts = normalized.parts.len(),
        operands = bindings.len(),
        "lifting"
    );

    let ctx = LowerCtx::new(facts, &bindings);
    let mut parts = Vec::with_capacity(normalized.parts.len());
    for part in &normalized.parts {
        let stmts = parse_tokens(&lex_tokens(&part.tokens)?)?;
        let effects = ctx.lower(&stmts)?;
        trace!(tag = %facts.tag, effects = effects.len(), "lowered part");
        parts.push(effects);
    }

    Ok(LiftedBody {
        decls: declarations(facts, &bindings),
        parts,
    })
}
