//! Effect-IR expressions.
//!
//! Every node carries a byte width and a signedness flag. Both are fixed by
//! the constructor from the node's immediate operands and never re-inferred
//! from context later; [`Expr::with_signed`] is the only way to reinterpret a
//! value, and it builds a fresh node.

use std::fmt;

use crate::reg::{FixedReg, Reg};

/// Unary operations.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnaryOp {
    Neg,
    Not,
    LowPart,
    SignExtend,
    ZeroExtend,
    BoolToInt,
}

/// Binary operations, including comparisons.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mult,
    And,
    Or,
    Xor,
    ShiftLeft,
    LogicalShiftRight,
    ArithShiftRight,
    RotateLeft,
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

impl BinaryOp {
    /// True for comparison operators.
    #[must_use]
    pub const fn is_compare(self) -> bool {
        matches!(
            self,
            Self::Eq
                | Self::Ne
                | Self::Slt
                | Self::Sle
                | Self::Sgt
                | Self::Sge
                | Self::Ult
                | Self::Ule
                | Self::Ugt
                | Self::Uge
        )
    }

    const fn host_name(self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Sub => "Sub",
            Self::Mult => "Mult",
            Self::And => "And",
            Self::Or => "Or",
            Self::Xor => "Xor",
            Self::ShiftLeft => "ShiftLeft",
            Self::LogicalShiftRight => "LogicalShiftRight",
            Self::ArithShiftRight => "ArithShiftRight",
            Self::RotateLeft => "RotateLeft",
            Self::Eq => "CompareEqual",
            Self::Ne => "CompareNotEqual",
            Self::Slt => "CompareSignedLessThan",
            Self::Sle => "CompareSignedLessEqual",
            Self::Sgt => "CompareSignedGreaterThan",
            Self::Sge => "CompareSignedGreaterEqual",
            Self::Ult => "CompareUnsignedLessThan",
            Self::Ule => "CompareUnsignedLessEqual",
            Self::Ugt => "CompareUnsignedGreaterThan",
            Self::Uge => "CompareUnsignedGreaterEqual",
        }
    }
}

impl UnaryOp {
    const fn host_name(self) -> &'static str {
        match self {
            Self::Neg => "Neg",
            Self::Not => "Not",
            Self::LowPart => "LowPart",
            Self::SignExtend => "SignExtend",
            Self::ZeroExtend => "ZeroExtend",
            Self::BoolToInt => "BoolToInt",
        }
    }
}

/// Constant payload: a literal or a symbolic immediate (`riV`, `UiV`, ...).
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ConstValue {
    Int(u64),
    Symbol(String),
}

impl ConstValue {
    /// Literal integer value, if any.
    #[must_use]
    pub const fn as_int(&self) -> Option<u64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Symbol(_) => None,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Masks and offsets read as hex; single digits stay decimal.
            Self::Int(v) if *v < 10 => write!(f, "{v}"),
            Self::Int(v) => write!(f, "0x{v:x}"),
            Self::Symbol(s) => f.write_str(s),
        }
    }
}

/// Expression tree node.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Expr {
    Register {
        reg: Reg,
        width: u8,
        signed: bool,
    },
    /// Two 4-byte registers read as one value, `hi:lo`.
    RegisterSplit {
        hi: Reg,
        lo: Reg,
        width: u8,
        signed: bool,
    },
    Const {
        value: ConstValue,
        width: u8,
        signed: bool,
    },
    /// Program-counter based constant (a relocation in the host).
    ConstPointer {
        symbol: String,
        width: u8,
        signed: bool,
    },
    Load {
        addr: Box<Self>,
        width: u8,
        signed: bool,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Self>,
        width: u8,
        signed: bool,
    },
    Binary {
        op: BinaryOp,
        left: Box<Self>,
        right: Box<Self>,
        width: u8,
        signed: bool,
    },
    /// Global pointer, or zero when an immediate extender is active.
    ReadGp {
        width: u8,
        signed: bool,
    },
}

// These are factory methods, not trait implementations
#[allow(clippy::should_implement_trait)]
impl Expr {
    /// Register read.
    #[must_use]
    pub const fn reg(width: u8, reg: Reg) -> Self {
        Self::Register {
            reg,
            width,
            signed: true,
        }
    }

    /// Register read of a bound operand symbol.
    #[must_use]
    pub fn operand(width: u8, symbol: &str) -> Self {
        Self::reg(width, Reg::operand(symbol))
    }

    /// Fixed-register read.
    #[must_use]
    pub const fn fixed(width: u8, reg: FixedReg) -> Self {
        Self::reg(width, Reg::Fixed(reg))
    }

    /// Split register-pair read.
    #[must_use]
    pub const fn reg_split(width: u8, hi: Reg, lo: Reg) -> Self {
        Self::RegisterSplit {
            hi,
            lo,
            width,
            signed: true,
        }
    }

    /// Integer constant.
    #[must_use]
    pub const fn constant(width: u8, value: u64) -> Self {
        Self::Const {
            value: ConstValue::Int(value),
            width,
            signed: true,
        }
    }

    /// Symbolic constant, e.g. an immediate operand.
    #[must_use]
    pub fn symbol(width: u8, name: &str) -> Self {
        Self::Const {
            value: ConstValue::Symbol(name.to_string()),
            width,
            signed: true,
        }
    }

    /// Program-counter relative constant.
    #[must_use]
    pub fn const_pointer(width: u8, symbol: &str) -> Self {
        Self::ConstPointer {
            symbol: symbol.to_string(),
            width,
            signed: false,
        }
    }

    /// Memory load.
    #[must_use]
    pub fn load(width: u8, addr: Self) -> Self {
        Self::Load {
            addr: Box::new(addr),
            width,
            signed: true,
        }
    }

    /// Global-pointer read that collapses to zero under an extender.
    #[must_use]
    pub const fn read_gp(width: u8) -> Self {
        Self::ReadGp {
            width,
            signed: true,
        }
    }

    fn unary(op: UnaryOp, width: u8, expr: Self, signed: bool) -> Self {
        Self::Unary {
            op,
            expr: Box::new(expr),
            width,
            signed,
        }
    }

    fn binary(op: BinaryOp, width: u8, left: Self, right: Self) -> Self {
        // Comparisons and bitwise ops are unsigned; arithmetic, shifts and
        // rotates follow the left operand.
        let signed = match op {
            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => false,
            _ if op.is_compare() => false,
            _ => left.signed(),
        };
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            width,
            signed,
        }
    }

    #[must_use]
    pub fn neg(width: u8, expr: Self) -> Self {
        Self::unary(UnaryOp::Neg, width, expr, false)
    }

    #[must_use]
    pub fn not(width: u8, expr: Self) -> Self {
        Self::unary(UnaryOp::Not, width, expr, false)
    }

    /// Truncate to the low `width` bytes.
    #[must_use]
    pub fn low_part(width: u8, expr: Self) -> Self {
        let signed = expr.signed();
        Self::unary(UnaryOp::LowPart, width, expr, signed)
    }

    #[must_use]
    pub fn sign_extend(width: u8, expr: Self) -> Self {
        Self::unary(UnaryOp::SignExtend, width, expr, true)
    }

    #[must_use]
    pub fn zero_extend(width: u8, expr: Self) -> Self {
        Self::unary(UnaryOp::ZeroExtend, width, expr, false)
    }

    #[must_use]
    pub fn bool_to_int(width: u8, expr: Self) -> Self {
        Self::unary(UnaryOp::BoolToInt, width, expr, true)
    }

    #[must_use]
    pub fn add(width: u8, left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Add, width, left, right)
    }

    #[must_use]
    pub fn sub(width: u8, left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Sub, width, left, right)
    }

    #[must_use]
    pub fn mult(width: u8, left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Mult, width, left, right)
    }

    #[must_use]
    pub fn and(width: u8, left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::And, width, left, right)
    }

    #[must_use]
    pub fn or(width: u8, left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Or, width, left, right)
    }

    #[must_use]
    pub fn xor(width: u8, left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Xor, width, left, right)
    }

    #[must_use]
    pub fn shl(width: u8, left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::ShiftLeft, width, left, right)
    }

    #[must_use]
    pub fn lsr(width: u8, left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::LogicalShiftRight, width, left, right)
    }

    #[must_use]
    pub fn asr(width: u8, left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::ArithShiftRight, width, left, right)
    }

    /// Right shift, arithmetic when the left operand is signed.
    #[must_use]
    pub fn shr(width: u8, left: Self, right: Self) -> Self {
        if left.signed() {
            Self::asr(width, left, right)
        } else {
            Self::lsr(width, left, right)
        }
    }

    #[must_use]
    pub fn rotl(width: u8, left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::RotateLeft, width, left, right)
    }

    /// Comparison node with an explicit operator.
    ///
    /// # Panics
    ///
    /// Debug builds assert that `op` is a comparison.
    #[must_use]
    pub fn compare(op: BinaryOp, width: u8, left: Self, right: Self) -> Self {
        debug_assert!(op.is_compare());
        Self::binary(op, width, left, right)
    }

    #[must_use]
    pub fn eq(width: u8, left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Eq, width, left, right)
    }

    #[must_use]
    pub fn ne(width: u8, left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Ne, width, left, right)
    }

    /// Byte width of the value.
    #[must_use]
    pub const fn width(&self) -> u8 {
        match self {
            Self::Register { width, .. }
            | Self::RegisterSplit { width, .. }
            | Self::Const { width, .. }
            | Self::ConstPointer { width, .. }
            | Self::Load { width, .. }
            | Self::Unary { width, .. }
            | Self::Binary { width, .. }
            | Self::ReadGp { width, .. } => *width,
        }
    }

    /// Signedness used to pick signed vs unsigned lowering of consumers.
    #[must_use]
    pub const fn signed(&self) -> bool {
        match self {
            Self::Register { signed, .. }
            | Self::RegisterSplit { signed, .. }
            | Self::Const { signed, .. }
            | Self::ConstPointer { signed, .. }
            | Self::Load { signed, .. }
            | Self::Unary { signed, .. }
            | Self::Binary { signed, .. }
            | Self::ReadGp { signed, .. } => *signed,
        }
    }

    /// Same value reinterpreted with the given signedness.
    #[must_use]
    pub const fn with_signed(mut self, value: bool) -> Self {
        match &mut self {
            Self::Register { signed, .. }
            | Self::RegisterSplit { signed, .. }
            | Self::Const { signed, .. }
            | Self::ConstPointer { signed, .. }
            | Self::Load { signed, .. }
            | Self::Unary { signed, .. }
            | Self::Binary { signed, .. }
            | Self::ReadGp { signed, .. } => *signed = value,
        }
        self
    }

    /// True for comparison nodes.
    #[must_use]
    pub const fn is_compare(&self) -> bool {
        matches!(self, Self::Binary { op, .. } if op.is_compare())
    }

    /// Register referenced by a plain register read.
    #[must_use]
    pub const fn as_register(&self) -> Option<&Reg> {
        match self {
            Self::Register { reg, .. } => Some(reg),
            _ => None,
        }
    }

    /// Literal integer value of a constant node.
    #[must_use]
    pub const fn as_int(&self) -> Option<u64> {
        match self {
            Self::Const { value, .. } => value.as_int(),
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register { reg, width, .. } => write!(f, "il.Register({width}, {reg})"),
            Self::RegisterSplit { hi, lo, width, .. } => {
                write!(f, "il.RegisterSplit({width}, {hi}, {lo})")
            }
            Self::Const { value, width, .. } => write!(f, "il.Const({width}, {value})"),
            Self::ConstPointer { symbol, width, .. } => {
                write!(f, "il.ConstPointer({width}, {symbol})")
            }
            Self::Load { addr, width, .. } => write!(f, "il.Load({width}, {addr})"),
            Self::Unary {
                op, expr, width, ..
            } => write!(f, "il.{}({width}, {expr})", op.host_name()),
            Self::Binary {
                op,
                left,
                right,
                width,
                ..
            } => write!(f, "il.{}({width}, {left}, {right})", op.host_name()),
            Self::ReadGp { width, .. } => write!(
                f,
                "(insn.extension_valid ? il.Const({width}, 0) : il.Register({width}, {}))",
                FixedReg::Gp
            ),
        }
    }
}

#[cfg(test)]
mod tests;
