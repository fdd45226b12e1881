//! Lowering of canonical macro calls.

use std::cmp::Ordering;
use std::sync::OnceLock;

use hexgen_ir::{BinaryOp, Effect, Expr, FixedReg, Reg, SideSlot};
use rustc_hash::FxHashMap;

use super::{LowerCtx, int_value};
use crate::ast;
use crate::lexer::{Token, TokenKind};
use crate::{Result, SemError};

type StmtFn = fn(&LowerCtx<'_>, &[ast::Expr]) -> Result<Vec<Effect>>;
type ExprFn = fn(&LowerCtx<'_>, &[ast::Expr]) -> Result<Expr>;

#[derive(Clone, Copy)]
struct Ctor {
    /// `None` accepts any argument count.
    arity: Option<usize>,
    stmt: Option<StmtFn>,
    expr: Option<ExprFn>,
}

const fn stmt(arity: usize, f: StmtFn) -> Ctor {
    Ctor {
        arity: Some(arity),
        stmt: Some(f),
        expr: None,
    }
}

const fn expr(arity: usize, f: ExprFn) -> Ctor {
    Ctor {
        arity: Some(arity),
        stmt: None,
        expr: Some(f),
    }
}

const MACROS: &[(&str, Ctor)] = &[
    (
        "fIMMEXT",
        Ctor {
            arity: Some(1),
            stmt: Some(immext_stmt),
            expr: Some(immext_expr),
        },
    ),
    ("fPCALIGN", stmt(1, pcalign)),
    ("fBRANCH", stmt(2, branch_stmt)),
    ("fJUMPR", stmt(3, jumpr)),
    ("fTRAP", stmt(2, trap)),
    ("fBREAK", stmt(0, |_, _| Ok(vec![Effect::Breakpoint]))),
    ("fSTORE", stmt(4, store)),
    ("fSTORE_LOCKED", stmt(5, store_locked)),
    ("fLOAD", stmt(5, load)),
    ("fWRITE_FP", stmt(1, |c, a| write_fixed(c, a, FixedReg::Fp))),
    ("fWRITE_LR", stmt(1, |c, a| write_fixed(c, a, FixedReg::Lr))),
    ("fWRITE_SP", stmt(1, |c, a| write_fixed(c, a, FixedReg::Sp))),
    ("fWRITE_P0", stmt(1, |c, a| write_pred(c, a, 0))),
    ("fWRITE_P1", stmt(1, |c, a| write_pred(c, a, 1))),
    ("fWRITE_P2", stmt(1, |c, a| write_pred(c, a, 2))),
    ("fWRITE_P3", stmt(1, |c, a| write_pred(c, a, 3))),
    ("fWRITE_LOOP_REGS", stmt(3, write_loop_regs)),
    ("fSET_LPCFG", stmt(1, set_lpcfg)),
    ("fWRITE_LC", stmt(2, write_lc)),
    ("fSETHALF", stmt(3, |c, a| set_field(c, a, "fSETHALF", 4, 0xffff, 16))),
    ("fSETWORD", stmt(3, |c, a| set_field(c, a, "fSETWORD", 8, 0xffff_ffff, 32))),
    ("fGETBYTE", expr(2, |c, a| get_field(c, a, "fGETBYTE", 1, true))),
    ("fGETUBYTE", expr(2, |c, a| get_field(c, a, "fGETUBYTE", 1, false))),
    ("fGETHALF", expr(2, |c, a| get_field(c, a, "fGETHALF", 2, true))),
    ("fGETUHALF", expr(2, |c, a| get_field(c, a, "fGETUHALF", 2, false))),
    ("fGETWORD", expr(2, |c, a| get_field(c, a, "fGETWORD", 4, true))),
    ("fGETUWORD", expr(2, |c, a| get_field(c, a, "fGETUWORD", 4, false))),
    ("fROTL4_4u", expr(2, |c, a| rotl(c, a, "fROTL4_4u", 4))),
    ("fROTL8_8u", expr(2, |c, a| rotl(c, a, "fROTL8_8u", 8))),
    (
        "fFRAME_SCRAMBLE",
        Ctor {
            arity: None,
            stmt: None,
            expr: Some(|_, _| Ok(Expr::reg_split(4, Reg::Fixed(FixedReg::Lr), Reg::Fixed(FixedReg::Fp)))),
        },
    ),
    ("fREAD_PC", expr(0, |_, _| Ok(Expr::const_pointer(4, "pc")))),
    ("fREAD_LR", expr(0, |_, _| Ok(Expr::fixed(4, FixedReg::Lr)))),
    ("fREAD_FP", expr(0, |_, _| Ok(Expr::fixed(4, FixedReg::Fp)))),
    ("fREAD_SP", expr(0, |_, _| Ok(Expr::fixed(4, FixedReg::Sp)))),
    ("fREAD_GP", expr(0, |_, _| Ok(Expr::read_gp(4)))),
    ("fREAD_P0", expr(0, |_, _| Ok(Expr::reg(1, Reg::pred(0))))),
    ("fREAD_LPCFG", expr(0, |_, _| Ok(Expr::fixed(1, FixedReg::UsrLpcfg)))),
    ("fREAD_LC", expr(1, |_, a| loop_reg(a, "fREAD_LC", FixedReg::lc))),
    ("fREAD_SA", expr(1, |_, a| loop_reg(a, "fREAD_SA", FixedReg::sa))),
    ("fCAST4s", expr(1, |c, a| cast(c, a, "fCAST4s", 4, true))),
    ("fCAST4u", expr(1, |c, a| cast(c, a, "fCAST4u", 4, false))),
    ("fCAST8s", expr(1, |c, a| cast(c, a, "fCAST8s", 8, true))),
    ("fCAST8u", expr(1, |c, a| cast(c, a, "fCAST8u", 8, false))),
    ("f8BITSOF", expr(1, eight_bits_of)),
    ("fLSBOLD", expr(1, lsb_old)),
    ("fNEWREG", expr(1, |c, a| new_reg(c, a, "fNEWREG"))),
    ("fNEWREG_ST", expr(1, |c, a| new_reg(c, a, "fNEWREG_ST"))),
    ("fLSBNEW", expr(1, lsb_new)),
    ("fMAX", expr(2, |c, a| min_max(c, a, "fMAX", true))),
    ("fMIN", expr(2, |c, a| min_max(c, a, "fMIN", false))),
    ("fABS", expr(1, abs)),
    ("fBYTESWAP", expr(1, byteswap)),
];

fn table() -> &'static FxHashMap<&'static str, Ctor> {
    static TABLE: OnceLock<FxHashMap<&'static str, Ctor>> = OnceLock::new();
    TABLE.get_or_init(|| MACROS.iter().copied().collect())
}

fn ctor(name: &Token, nargs: usize) -> Result<Ctor> {
    if name.kind != TokenKind::Macro {
        return Err(SemError::Unsupported(format!("call to {}", name.text)));
    }
    let ctor = table()
        .get(name.text.as_str())
        .copied()
        .ok_or_else(|| SemError::UnknownMacro(name.text.clone()))?;
    if let Some(expected) = ctor.arity
        && expected != nargs
    {
        return Err(SemError::Arity {
            name: name.text.clone(),
            expected,
            found: nargs,
        });
    }
    Ok(ctor)
}

/// Lower a macro call in statement position.
pub(super) fn lower_stmt_call(
    ctx: &LowerCtx<'_>,
    name: &Token,
    args: &[ast::Expr],
) -> Result<Vec<Effect>> {
    let f = ctor(name, args.len())?
        .stmt
        .ok_or_else(|| SemError::Unsupported(format!("{} as a statement", name.text)))?;
    f(ctx, args)
}

/// Lower a macro call in value position.
pub(super) fn lower_expr_call(ctx: &LowerCtx<'_>, name: &Token, args: &[ast::Expr]) -> Result<Expr> {
    let f = ctor(name, args.len())?
        .expr
        .ok_or_else(|| SemError::Unsupported(format!("{} as a value", name.text)))?;
    f(ctx, args)
}

fn operand_err(name: &str, detail: impl Into<String>) -> SemError {
    SemError::Operand {
        name: name.to_string(),
        detail: detail.into(),
    }
}

/// The raw token of an argument of the given class.
fn token_arg<'e>(name: &str, arg: &'e ast::Expr, kind: TokenKind) -> Result<&'e Token> {
    match arg {
        ast::Expr::Id(t) | ast::Expr::IntCon(t) if t.kind == kind => Ok(t),
        _ => Err(operand_err(name, format!("expected {kind:?} argument, found {arg}"))),
    }
}

fn int_arg(name: &str, arg: &ast::Expr) -> Result<u64> {
    int_value(token_arg(name, arg, TokenKind::IntCon)?)
}

fn size_arg(name: &str, arg: &ast::Expr) -> Result<u8> {
    u8::try_from(int_arg(name, arg)?).map_err(|_| operand_err(name, "access size out of range"))
}

fn register_of(name: &str, expr: &Expr) -> Result<(u8, Reg)> {
    match expr {
        Expr::Register { reg, width, .. } => Ok((*width, reg.clone())),
        _ => Err(operand_err(name, format!("expected a register, found {expr}"))),
    }
}

fn immext_stmt(_: &LowerCtx<'_>, args: &[ast::Expr]) -> Result<Vec<Effect>> {
    token_arg("fIMMEXT", &args[0], TokenKind::Imm)?;
    Ok(Vec::new())
}

fn immext_expr(ctx: &LowerCtx<'_>, args: &[ast::Expr]) -> Result<Expr> {
    token_arg("fIMMEXT", &args[0], TokenKind::Imm)?;
    ctx.lift(&args[0])
}

fn pcalign(_: &LowerCtx<'_>, args: &[ast::Expr]) -> Result<Vec<Effect>> {
    let imm = token_arg("fPCALIGN", &args[0], TokenKind::Imm)?;
    Ok(vec![Effect::raw(format!(
        "{0} = {0} & ~PCALIGN_MASK;",
        imm.text
    ))])
}

fn branch_stmt(ctx: &LowerCtx<'_>, args: &[ast::Expr]) -> Result<Vec<Effect>> {
    let typ = token_arg("fBRANCH", &args[1], TokenKind::BranchType)?;
    let loc = ctx.lift(&args[0])?;
    branch(ctx, loc, &typ.text)
}

/// `fJUMPR(regno, target, type)`; a jump through `REG_LR` is a return.
fn jumpr(ctx: &LowerCtx<'_>, args: &[ast::Expr]) -> Result<Vec<Effect>> {
    let typ = match &args[0] {
        ast::Expr::Id(t) if t.kind == TokenKind::RegLr => "COF_TYPE_RETURN",
        _ => token_arg("fJUMPR", &args[2], TokenKind::BranchType)?
            .text
            .as_str(),
    };
    let loc = ctx.lift(&args[1])?;
    branch(ctx, loc, typ)
}

fn branch(ctx: &LowerCtx<'_>, loc: Expr, typ: &str) -> Result<Vec<Effect>> {
    let cond = ctx.attrs().is_cond_jump();
    let dest = |loc: &Expr| Effect::set_reg(4, Reg::Side(SideSlot::BranchrDest), loc.clone());

    let mut out = Vec::with_capacity(3);
    if cond {
        out.push(Effect::set_reg(
            1,
            Reg::Side(SideSlot::BranchTaken),
            Expr::constant(1, 1),
        ));
    }
    match typ {
        "COF_TYPE_JUMP" | "COF_TYPE_JUMPNEW" => out.push(Effect::Jump(loc)),
        "COF_TYPE_JUMPR" => {
            out.push(dest(&loc));
            out.push(Effect::Jump(loc));
        }
        "COF_TYPE_CALL" => out.push(Effect::Call(loc)),
        "COF_TYPE_CALLR" => {
            out.push(dest(&loc));
            out.push(Effect::Call(loc));
        }
        "COF_TYPE_RETURN" => out.push(Effect::Return(loc)),
        "COF_TYPE_LOOPEND0" | "COF_TYPE_LOOPEND1" => {
            if !cond {
                return Err(operand_err(typ, "loop end on an unconditional branch"));
            }
            out.push(dest(&loc));
            out.push(Effect::Jump(loc));
        }
        _ => return Err(SemError::Unsupported(format!("branch type {typ}"))),
    }
    Ok(out)
}

fn trap(ctx: &LowerCtx<'_>, args: &[ast::Expr]) -> Result<Vec<Effect>> {
    for arg in args {
        ctx.lift(arg)?;
    }
    Ok(vec![Effect::SystemCall])
}

fn store_effect(ctx: &LowerCtx<'_>, name: &str, args: &[ast::Expr]) -> Result<Effect> {
    let size = size_arg(name, &args[1])?;
    token_arg(name, &args[2], TokenKind::Ea)?;
    let ea = ctx.lift(&args[2])?;
    let src = ctx.lift(&args[3])?;
    Ok(Effect::store(size, ea, src))
}

fn store(ctx: &LowerCtx<'_>, args: &[ast::Expr]) -> Result<Vec<Effect>> {
    Ok(vec![store_effect(ctx, "fSTORE", args)?])
}

/// Store, then report success in the predicate operand.
fn store_locked(ctx: &LowerCtx<'_>, args: &[ast::Expr]) -> Result<Vec<Effect>> {
    let pred = ctx.lift(&args[4])?;
    let (width, reg) = register_of("fSTORE_LOCKED", &pred)?;
    Ok(vec![
        store_effect(ctx, "fSTORE_LOCKED", &args[..4])?,
        Effect::set_reg(width, reg, Expr::constant(1, 1)),
    ])
}

fn load(ctx: &LowerCtx<'_>, args: &[ast::Expr]) -> Result<Vec<Effect>> {
    let size = size_arg("fLOAD", &args[1])?;
    let sign = token_arg("fLOAD", &args[2], TokenKind::Sign)?;
    token_arg("fLOAD", &args[3], TokenKind::Ea)?;
    let ea = ctx.lift(&args[3])?;
    let dst = ctx.lift(&args[4])?;
    let (width, reg) = register_of("fLOAD", &dst)?;

    let mut val = Expr::load(size, ea);
    if size < width {
        val = if sign.text == "s" {
            Expr::sign_extend(width, val)
        } else {
            Expr::zero_extend(width, val)
        };
    }
    Ok(vec![Effect::set_reg(width, reg, val)])
}

fn write_fixed(ctx: &LowerCtx<'_>, args: &[ast::Expr], reg: FixedReg) -> Result<Vec<Effect>> {
    let val = ctx.lift(&args[0])?;
    Ok(vec![Effect::set_reg(4, Reg::Fixed(reg), val)])
}

fn write_pred(ctx: &LowerCtx<'_>, args: &[ast::Expr], n: u8) -> Result<Vec<Effect>> {
    let val = ctx.lift(&args[0])?;
    Ok(vec![Effect::set_reg(1, Reg::pred(n), val)])
}

fn loop_index(name: &str, arg: &ast::Expr) -> Result<u8> {
    match int_arg(name, arg)? {
        0 => Ok(0),
        1 => Ok(1),
        n => Err(operand_err(name, format!("no hardware loop {n}"))),
    }
}

/// Count register, then start address register.
fn write_loop_regs(ctx: &LowerCtx<'_>, args: &[ast::Expr]) -> Result<Vec<Effect>> {
    let n = loop_index("fWRITE_LOOP_REGS", &args[0])?;
    let start = ctx.lift(&args[1])?;
    let count = ctx.lift(&args[2])?;
    let (Some(lc), Some(sa)) = (FixedReg::lc(n), FixedReg::sa(n)) else {
        return Err(operand_err("fWRITE_LOOP_REGS", "bad loop index"));
    };
    Ok(vec![
        Effect::set_reg(4, Reg::Fixed(lc), count),
        Effect::set_reg(4, Reg::Fixed(sa), start),
    ])
}

fn set_lpcfg(ctx: &LowerCtx<'_>, args: &[ast::Expr]) -> Result<Vec<Effect>> {
    let val = ctx.lift(&args[0])?;
    Ok(vec![Effect::set_reg(1, Reg::Fixed(FixedReg::UsrLpcfg), val)])
}

fn write_lc(ctx: &LowerCtx<'_>, args: &[ast::Expr]) -> Result<Vec<Effect>> {
    let n = loop_index("fWRITE_LC", &args[0])?;
    let val = ctx.lift(&args[1])?;
    let lc = FixedReg::lc(n).ok_or_else(|| operand_err("fWRITE_LC", "bad loop index"))?;
    Ok(vec![Effect::set_reg(4, Reg::Fixed(lc), val)])
}

fn loop_reg(args: &[ast::Expr], name: &str, reg: fn(u8) -> Option<FixedReg>) -> Result<Expr> {
    let n = loop_index(name, &args[0])?;
    let reg = reg(n).ok_or_else(|| operand_err(name, "bad loop index"))?;
    Ok(Expr::fixed(4, reg))
}

/// `dst = (dst & ~(mask << s)) | ((val & mask) << s)` with `s = n * bits`.
fn set_field(
    ctx: &LowerCtx<'_>,
    args: &[ast::Expr],
    name: &str,
    dst_width: u8,
    mask: u64,
    bits: u64,
) -> Result<Vec<Effect>> {
    let n = int_arg(name, &args[0])?;
    let dst = ctx.lift(&args[1])?;
    let val = ctx.lift(&args[2])?;
    let (width, reg) = register_of(name, &dst)?;
    if width != dst_width {
        return Err(operand_err(
            name,
            format!("destination is {width} bytes, expected {dst_width}"),
        ));
    }

    let shift = Expr::constant(1, n.saturating_mul(bits));
    let old = Expr::and(
        width,
        dst,
        Expr::not(width, Expr::shl(width, Expr::constant(4, mask), shift.clone())),
    );
    let new = Expr::shl(width, Expr::and(width, val, Expr::constant(4, mask)), shift);
    Ok(vec![Effect::set_reg(width, reg, Expr::or(width, old, new))])
}

/// Part `n` of `size` bytes. Halves and words are extended back to the
/// source width; bytes are not.
fn get_field(ctx: &LowerCtx<'_>, args: &[ast::Expr], name: &str, size: u8, signed: bool) -> Result<Expr> {
    let n = int_arg(name, &args[0])?;
    let src = ctx.lift(&args[1])?.with_signed(signed);
    let width = src.width();
    if size == 4 && width != 8 {
        return Err(operand_err(name, format!("source is {width} bytes, expected 8")));
    }

    let part = if n == 0 {
        Expr::low_part(size, src)
    } else {
        let amount = Expr::constant(1, n.saturating_mul(u64::from(size) * 8));
        let shifted = if signed {
            Expr::asr(width, src, amount)
        } else {
            Expr::lsr(width, src, amount)
        };
        Expr::low_part(size, shifted)
    };

    Ok(match (size, signed) {
        (1, _) => part,
        (_, true) => Expr::sign_extend(width, part),
        (_, false) => Expr::zero_extend(width, part),
    })
}

fn rotl(ctx: &LowerCtx<'_>, args: &[ast::Expr], name: &str, expected: u8) -> Result<Expr> {
    let src = ctx.lift(&args[0])?;
    let shamt = ctx.lift(&args[1])?;
    if src.width() != expected {
        return Err(operand_err(
            name,
            format!("source is {} bytes, expected {expected}", src.width()),
        ));
    }
    Ok(Expr::rotl(expected, src, shamt))
}

fn cast(ctx: &LowerCtx<'_>, args: &[ast::Expr], name: &str, width: u8, signed: bool) -> Result<Expr> {
    let val = ctx.lift(&args[0])?;
    Ok(match val.width().cmp(&width) {
        Ordering::Greater if width == 8 => {
            return Err(operand_err(name, format!("{} bytes is wider than 8", val.width())));
        }
        Ordering::Greater => Expr::low_part(width, val.with_signed(signed)),
        Ordering::Equal => val.with_signed(signed),
        Ordering::Less if signed => Expr::sign_extend(width, val),
        Ordering::Less => Expr::zero_extend(width, val),
    })
}

/// Predicates hold booleans, so `f8BITSOF` keeps the comparison itself.
fn eight_bits_of(ctx: &LowerCtx<'_>, args: &[ast::Expr]) -> Result<Expr> {
    let val = ctx.lift(&args[0])?;
    let is_bool = val.is_compare()
        || matches!(
            &val,
            Expr::Binary { op: BinaryOp::And, right, .. }
                if right.width() == 4 && right.as_int() == Some(1)
        );
    if !is_bool {
        return Err(operand_err("f8BITSOF", format!("not a boolean: {val}")));
    }
    Ok(val)
}

fn lsb_old(ctx: &LowerCtx<'_>, args: &[ast::Expr]) -> Result<Expr> {
    let val = ctx.lift(&args[0])?;
    match val.as_register() {
        Some(reg) if reg.is_predicate() => Ok(val),
        _ => Err(operand_err("fLSBOLD", format!("not a predicate: {val}"))),
    }
}

fn new_reg(ctx: &LowerCtx<'_>, args: &[ast::Expr], name: &str) -> Result<Expr> {
    token_arg(name, &args[0], TokenKind::RegNew)?;
    ctx.lift(&args[0])
}

/// `fLSBNEW(0)` and `fLSBNEW(1)` read the fixed predicates.
fn lsb_new(ctx: &LowerCtx<'_>, args: &[ast::Expr]) -> Result<Expr> {
    let val = ctx.lift(&args[0])?;
    Ok(match val.as_int() {
        Some(0) => Expr::reg(1, Reg::pred(0)),
        Some(1) => Expr::reg(1, Reg::pred(1)),
        _ => val,
    })
}

/// `max = (a >= b) * a + (a < b) * b`, `min = (a <= b) * a + (a > b) * b`.
fn min_max(ctx: &LowerCtx<'_>, args: &[ast::Expr], name: &str, max: bool) -> Result<Expr> {
    let a = ctx.lift(&args[0])?;
    let b = ctx.lift(&args[1])?;
    if a.width() != b.width() {
        return Err(operand_err(
            name,
            format!("operand widths differ: {} and {}", a.width(), b.width()),
        ));
    }
    let w = a.width();
    let (pick_a, pick_b) = match (max, a.signed()) {
        (true, true) => (BinaryOp::Sge, BinaryOp::Slt),
        (true, false) => (BinaryOp::Uge, BinaryOp::Ult),
        (false, true) => (BinaryOp::Sle, BinaryOp::Sgt),
        (false, false) => (BinaryOp::Ule, BinaryOp::Ugt),
    };
    let term_a = Expr::mult(
        w,
        Expr::bool_to_int(w, Expr::compare(pick_a, w, a.clone(), b.clone())),
        a.clone(),
    );
    let term_b = Expr::mult(w, Expr::bool_to_int(w, Expr::compare(pick_b, w, a, b.clone())), b);
    Ok(Expr::add(w, term_a, term_b))
}

/// `abs = (1 - 2 * (a < 0)) * a`; unsigned values pass through.
fn abs(ctx: &LowerCtx<'_>, args: &[ast::Expr]) -> Result<Expr> {
    let a = ctx.lift(&args[0])?;
    if !a.signed() {
        return Ok(a);
    }
    let w = a.width();
    let negative = Expr::compare(BinaryOp::Slt, w, a.clone(), Expr::constant(w, 0));
    let sign = Expr::sub(
        w,
        Expr::constant(w, 1),
        Expr::mult(w, Expr::constant(w, 2), Expr::bool_to_int(w, negative)),
    );
    Ok(Expr::mult(w, sign, a))
}

fn byteswap(ctx: &LowerCtx<'_>, args: &[ast::Expr]) -> Result<Expr> {
    let x = ctx.lift(&args[0])?;
    if x.width() != 4 {
        return Err(operand_err(
            "fBYTESWAP",
            format!("source is {} bytes, expected 4", x.width()),
        ));
    }
    let byte = |mask: u64| Expr::and(4, x.clone(), Expr::constant(4, mask));
    Ok(Expr::or(
        4,
        Expr::shl(4, byte(0xff), Expr::constant(1, 24)),
        Expr::or(
            4,
            Expr::shl(4, byte(0xff00), Expr::constant(1, 8)),
            Expr::or(
                4,
                Expr::lsr(4, byte(0x00ff_0000), Expr::constant(1, 8)),
                Expr::lsr(4, byte(0xff00_0000), Expr::constant(1, 24)),
            ),
        ),
    ))
}
