//! Effects: the statements of the effect IR.

use std::fmt;

use crate::expr::Expr;
use crate::reg::Reg;

/// Local label of a structured conditional.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Label {
    TrueCase,
    FalseCase,
    Done,
}

impl Label {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TrueCase => "true_case",
            Self::FalseCase => "false_case",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One lifted effect.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Effect {
    SetRegister {
        width: u8,
        reg: Reg,
        value: Expr,
    },
    SetRegisterSplit {
        width: u8,
        hi: Reg,
        lo: Reg,
        value: Expr,
    },
    Store {
        width: u8,
        addr: Expr,
        value: Expr,
    },
    Jump(Expr),
    Call(Expr),
    Return(Expr),
    If {
        cond: Expr,
        then_label: Label,
        else_label: Label,
    },
    Goto(Label),
    Label(Label),
    SystemCall,
    Breakpoint,
    /// Host source passed through verbatim.
    Raw(String),
}

impl Effect {
    #[must_use]
    pub const fn set_reg(width: u8, reg: Reg, value: Expr) -> Self {
        Self::SetRegister { width, reg, value }
    }

    #[must_use]
    pub const fn store(width: u8, addr: Expr, value: Expr) -> Self {
        Self::Store { width, addr, value }
    }

    #[must_use]
    pub fn raw(text: impl Into<String>) -> Self {
        Self::Raw(text.into())
    }

    /// Branches are resolved at packet level and never emitted per instruction.
    #[must_use]
    pub const fn is_branch(&self) -> bool {
        matches!(self, Self::Jump(_) | Self::Call(_) | Self::Return(_))
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetRegister { width, reg, value } => {
                write!(f, "il.SetRegister({width}, {reg}, {value})")
            }
            Self::SetRegisterSplit {
                width,
                hi,
                lo,
                value,
            } => write!(f, "il.SetRegisterSplit({width}, {hi}, {lo}, {value})"),
            Self::Store { width, addr, value } => {
                write!(f, "il.Store({width}, {addr}, {value})")
            }
            Self::Jump(dest) => write!(f, "il.Jump({dest})"),
            Self::Call(dest) => write!(f, "il.Call({dest})"),
            Self::Return(dest) => write!(f, "il.Return({dest})"),
            Self::If {
                cond,
                then_label,
                else_label,
            } => write!(f, "il.If({cond}, {then_label}, {else_label})"),
            Self::Goto(label) => write!(f, "il.Goto({label})"),
            Self::Label(label) => label.fmt(f),
            Self::SystemCall => f.write_str("il.SystemCall()"),
            Self::Breakpoint => f.write_str("il.Breakpoint()"),
            Self::Raw(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reg::SideSlot;

    #[test]
    fn test_is_branch() {
        let dest = Expr::const_pointer(4, "pc");
        assert!(Effect::Jump(dest.clone()).is_branch());
        assert!(Effect::Call(dest.clone()).is_branch());
        assert!(Effect::Return(dest.clone()).is_branch());
        assert!(!Effect::set_reg(4, Reg::Side(SideSlot::BranchrDest), dest).is_branch());
        assert!(!Effect::raw("}").is_branch());
    }

    #[test]
    fn test_display() {
        let set = Effect::set_reg(1, Reg::Side(SideSlot::BranchTaken), Expr::constant(1, 1));
        assert_eq!(
            set.to_string(),
            "il.SetRegister(1, BRANCH_TAKEN_ARRAY + insn_num, il.Const(1, 1))"
        );

        let cond = Effect::If {
            cond: Expr::operand(1, "PuV"),
            then_label: Label::TrueCase,
            else_label: Label::Done,
        };
        assert_eq!(cond.to_string(), "il.If(il.Register(1, PuV), true_case, done)");
        assert_eq!(Effect::Goto(Label::Done).to_string(), "il.Goto(done)");
        assert_eq!(Effect::Label(Label::FalseCase).to_string(), "false_case");
    }
}
