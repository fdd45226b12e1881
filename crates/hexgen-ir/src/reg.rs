//! Register references.

use std::fmt;

/// Architectural registers addressed by name rather than by operand slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum FixedReg {
    Lr,
    Fp,
    Sp,
    Gp,
    Lc0,
    Lc1,
    Sa0,
    Sa1,
    /// Loop-configuration field of USR.
    UsrLpcfg,
    /// Fixed predicate slot `Pd0..Pd3`, bound once per instruction.
    Pred(u8),
}

impl FixedReg {
    /// Loop-count register for loop `n`.
    #[must_use]
    pub const fn lc(n: u8) -> Option<Self> {
        match n {
            0 => Some(Self::Lc0),
            1 => Some(Self::Lc1),
            _ => None,
        }
    }

    /// Loop start-address register for loop `n`.
    #[must_use]
    pub const fn sa(n: u8) -> Option<Self> {
        match n {
            0 => Some(Self::Sa0),
            1 => Some(Self::Sa1),
            _ => None,
        }
    }
}

/// Lifter-local temporaries.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TempReg {
    /// Effective address.
    Ea,
    Tmp,
    Width,
    Offset,
    Shamt,
}

impl TempReg {
    /// Host temporary index (`LLIL_TEMP(n)`).
    #[must_use]
    pub const fn index(self) -> u32 {
        match self {
            Self::Ea => 100,
            Self::Tmp => 101,
            Self::Width => 104,
            Self::Offset => 105,
            Self::Shamt => 106,
        }
    }

    /// Host macro name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ea => "EA_REG",
            Self::Tmp => "TMP_REG",
            Self::Width => "WIDTH_REG",
            Self::Offset => "OFFSET_REG",
            Self::Shamt => "SHAMT_REG",
        }
    }

    /// All temporaries, in prelude order.
    pub const ALL: [Self; 5] = [Self::Ea, Self::Tmp, Self::Width, Self::Offset, Self::Shamt];
}

/// Per-instruction side-channel slots indexed by packet position.
///
/// Branches themselves are deferred to packet-level synthesis; these slots
/// carry what that stage needs to know about each instruction's branch.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SideSlot {
    /// Set when a conditional branch was taken.
    BranchTaken,
    /// Computed target of an indirect branch.
    BranchrDest,
}

/// A register reference as seen by the effect IR.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Reg {
    /// A bound instruction operand (`RdV`, `RssV`, `NtN`, ...).
    Operand(String),
    Fixed(FixedReg),
    Temp(TempReg),
    Side(SideSlot),
}

impl Reg {
    /// Reference a bound operand symbol.
    #[must_use]
    pub fn operand(symbol: &str) -> Self {
        Self::Operand(symbol.to_string())
    }

    /// Fixed predicate slot `Pd{n}`.
    #[must_use]
    pub const fn pred(n: u8) -> Self {
        Self::Fixed(FixedReg::Pred(n))
    }

    /// True for predicate registers, operand or fixed.
    #[must_use]
    pub fn is_predicate(&self) -> bool {
        match self {
            Self::Operand(sym) => sym.starts_with('P'),
            Self::Fixed(FixedReg::Pred(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FixedReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lr => f.write_str("HEX_REG_LR"),
            Self::Fp => f.write_str("HEX_REG_FP"),
            Self::Sp => f.write_str("HEX_REG_SP"),
            Self::Gp => f.write_str("HEX_REG_GP"),
            Self::Lc0 => f.write_str("HEX_REG_LC0"),
            Self::Lc1 => f.write_str("HEX_REG_LC1"),
            Self::Sa0 => f.write_str("HEX_REG_SA0"),
            Self::Sa1 => f.write_str("HEX_REG_SA1"),
            Self::UsrLpcfg => f.write_str("HEX_REG_USR_LPCFG"),
            Self::Pred(n) => write!(f, "Pd{n}"),
        }
    }
}

impl fmt::Display for SideSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BranchTaken => f.write_str("BRANCH_TAKEN_ARRAY + insn_num"),
            Self::BranchrDest => f.write_str("BRANCHR_DEST_ARRAY + insn_num"),
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operand(sym) => f.write_str(sym),
            Self::Fixed(r) => r.fmt(f),
            Self::Temp(t) => f.write_str(t.name()),
            Self::Side(s) => s.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_names() {
        assert_eq!(Reg::operand("RdV").to_string(), "RdV");
        assert_eq!(Reg::pred(2).to_string(), "Pd2");
        assert_eq!(Reg::Fixed(FixedReg::UsrLpcfg).to_string(), "HEX_REG_USR_LPCFG");
        assert_eq!(Reg::Temp(TempReg::Ea).to_string(), "EA_REG");
        assert_eq!(
            Reg::Side(SideSlot::BranchrDest).to_string(),
            "BRANCHR_DEST_ARRAY + insn_num"
        );
    }

    #[test]
    fn test_loop_regs() {
        assert_eq!(FixedReg::lc(1), Some(FixedReg::Lc1));
        assert_eq!(FixedReg::sa(0), Some(FixedReg::Sa0));
        assert_eq!(FixedReg::lc(2), None);
    }

    #[test]
    fn test_is_predicate() {
        assert!(Reg::operand("PdV").is_predicate());
        assert!(Reg::pred(0).is_predicate());
        assert!(!Reg::operand("RsV").is_predicate());
        assert!(!Reg::Fixed(FixedReg::Lr).is_predicate());
    }
}
