//! Instruction attribute sets.

use rustc_hash::FxHashSet;
use serde::Deserialize;

/// Closed attribute set of one tag (`A_JUMP`, `A_NEWCMPJUMP`, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Attributes(FxHashSet<String>);

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.0.insert(name.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn is_jump(&self) -> bool {
        self.contains("A_JUMP")
    }

    #[must_use]
    pub fn is_call(&self) -> bool {
        self.contains("A_CALL")
    }

    #[must_use]
    pub fn is_indirect(&self) -> bool {
        self.contains("A_INDIRECT")
    }

    /// Conditional branch; taken-ness is reported through the side channel.
    #[must_use]
    pub fn is_cond_jump(&self) -> bool {
        self.contains("A_BN_COND_J")
    }

    /// Compare-and-jump whose compare half is marked with `fPART1`.
    #[must_use]
    pub fn is_compound_compare_jump(&self) -> bool {
        self.contains("A_NEWCMPJUMP")
    }

    #[must_use]
    pub fn is_new_value_jump(&self) -> bool {
        self.is_jump() && self.contains("A_DOTNEWVALUE") && self.contains("A_MEMLIKE_PACKET_RULES")
    }

    /// Writes loop start register `SA{n}`.
    #[must_use]
    pub fn writes_loop_start(&self, n: u8) -> bool {
        match n {
            0 => self.contains("A_IMPLICIT_WRITES_SA0"),
            1 => self.contains("A_IMPLICIT_WRITES_SA1"),
            _ => false,
        }
    }

    #[must_use]
    pub fn writes_any_loop_start(&self) -> bool {
        self.writes_loop_start(0) || self.writes_loop_start(1)
    }
}

impl<S: Into<String>> FromIterator<S> for Attributes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
