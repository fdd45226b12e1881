use super::*;
use crate::reg::TempReg;

#[test]
fn test_expr_reg() {
    let expr = Expr::operand(4, "RsV");
    assert!(matches!(expr, Expr::Register { width: 4, signed: true, .. }));
    assert_eq!(expr.to_string(), "il.Register(4, RsV)");
}

#[test]
fn test_expr_const_display() {
    assert_eq!(Expr::constant(4, 0xffff).to_string(), "il.Const(4, 0xffff)");
    assert_eq!(Expr::constant(4, 16).to_string(), "il.Const(4, 0x10)");
    assert_eq!(Expr::constant(1, 1).to_string(), "il.Const(1, 1)");
    assert_eq!(Expr::symbol(4, "riV").to_string(), "il.Const(4, riV)");
}

#[test]
fn test_expr_const_pointer_unsigned() {
    let expr = Expr::const_pointer(4, "pc");
    assert!(!expr.signed());
    assert_eq!(expr.to_string(), "il.ConstPointer(4, pc)");
}

#[test]
fn test_expr_add_follows_left_sign() {
    let pc = Expr::const_pointer(4, "pc");
    let add = Expr::add(4, pc, Expr::symbol(4, "riV"));
    assert!(!add.signed());

    let add = Expr::add(4, Expr::operand(4, "RsV"), Expr::const_pointer(4, "pc"));
    assert!(add.signed());
}

#[test]
fn test_expr_bitwise_unsigned() {
    let a = Expr::operand(4, "RsV");
    let b = Expr::operand(4, "RtV");
    assert!(!Expr::and(4, a.clone(), b.clone()).signed());
    assert!(!Expr::or(4, a.clone(), b.clone()).signed());
    assert!(!Expr::xor(4, a, b).signed());
}

#[test]
fn test_expr_compare() {
    let cmp = Expr::compare(
        BinaryOp::Sgt,
        4,
        Expr::operand(4, "RsV"),
        Expr::symbol(4, "siV"),
    );
    assert!(cmp.is_compare());
    assert!(!cmp.signed());
    assert_eq!(
        cmp.to_string(),
        "il.CompareSignedGreaterThan(4, il.Register(4, RsV), il.Const(4, siV))"
    );
    assert!(!Expr::add(4, Expr::constant(4, 1), Expr::constant(4, 2)).is_compare());
}

#[test]
fn test_expr_shr_picks_kind() {
    let signed = Expr::shr(4, Expr::operand(4, "RsV"), Expr::constant(1, 3));
    assert!(matches!(
        signed,
        Expr::Binary {
            op: BinaryOp::ArithShiftRight,
            ..
        }
    ));

    let unsigned = Expr::shr(
        4,
        Expr::operand(4, "RsV").with_signed(false),
        Expr::constant(1, 3),
    );
    assert!(matches!(
        unsigned,
        Expr::Binary {
            op: BinaryOp::LogicalShiftRight,
            ..
        }
    ));
}

#[test]
fn test_expr_extensions() {
    let ext = Expr::zero_extend(8, Expr::operand(4, "RsV"));
    assert!(!ext.signed());
    assert_eq!(ext.width(), 8);

    let ext = Expr::sign_extend(8, Expr::operand(4, "RsV").with_signed(false));
    assert!(ext.signed());
}

#[test]
fn test_expr_low_part_keeps_sign() {
    let low = Expr::low_part(1, Expr::operand(4, "NtN").with_signed(false));
    assert!(!low.signed());
    assert_eq!(low.width(), 1);
    assert_eq!(low.to_string(), "il.LowPart(1, il.Register(4, NtN))");
}

#[test]
fn test_expr_neg_not_unsigned() {
    assert!(!Expr::neg(4, Expr::operand(4, "RsV")).signed());
    assert!(!Expr::not(4, Expr::operand(4, "RsV")).signed());
    assert!(Expr::bool_to_int(4, Expr::eq(4, Expr::constant(4, 0), Expr::constant(4, 0))).signed());
}

#[test]
fn test_expr_with_signed_rebuilds() {
    let a = Expr::operand(4, "RsV");
    let b = a.clone().with_signed(false);
    assert_ne!(a, b);
    assert_eq!(b.with_signed(true), a);
}

#[test]
fn test_expr_read_gp_display() {
    assert_eq!(
        Expr::read_gp(4).to_string(),
        "(insn.extension_valid ? il.Const(4, 0) : il.Register(4, HEX_REG_GP))"
    );
}

#[test]
fn test_expr_temp_and_split() {
    let tmp = Expr::reg(8, Reg::Temp(TempReg::Tmp));
    assert_eq!(tmp.to_string(), "il.Register(8, TMP_REG)");

    let split = Expr::reg_split(4, Reg::Fixed(FixedReg::Lr), Reg::Fixed(FixedReg::Fp));
    assert_eq!(split.to_string(), "il.RegisterSplit(4, HEX_REG_LR, HEX_REG_FP)");
}

#[test]
fn test_expr_accessors() {
    let e = Expr::operand(4, "RsV");
    assert_eq!(e.as_register(), Some(&Reg::operand("RsV")));
    assert_eq!(e.as_int(), None);
    assert_eq!(Expr::constant(4, 7).as_int(), Some(7));
    assert_eq!(Expr::symbol(4, "uiV").as_int(), None);
}

#[test]
fn test_expr_load_display() {
    let load = Expr::load(1, Expr::reg(4, Reg::Temp(TempReg::Ea)));
    assert_eq!(load.to_string(), "il.Load(1, il.Register(4, EA_REG))");
}
