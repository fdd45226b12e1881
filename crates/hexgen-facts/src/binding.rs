//! Operand bindings: semantics symbols resolved to typed operand slots.

use rustc_hash::FxHashMap;

use crate::{FactsError, RegOperand, Result, TagFacts};

/// Register file an operand lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandKind {
    Register,
    RegisterPair,
    Predicate,
    Control,
}

/// How the instruction accesses the operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// Where the register number comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandSlot {
    /// `insn.regno[i]`.
    Operand(usize),
    /// Fixed predicate `P{n}`.
    FixedPredicate(u8),
}

/// One bound operand symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperandBinding {
    pub symbol: String,
    pub kind: OperandKind,
    pub width: u8,
    pub mode: AccessMode,
    pub slot: OperandSlot,
    pub class: char,
    /// Bound through the new-value (`N`) symbol.
    pub new_value: bool,
}

impl OperandBinding {
    #[must_use]
    pub const fn is_pair(&self) -> bool {
        self.width == 8
    }

    fn fixed_predicate(n: u8) -> Self {
        Self {
            symbol: format!("Pd{n}"),
            kind: OperandKind::Predicate,
            width: 1,
            mode: AccessMode::ReadWrite,
            slot: OperandSlot::FixedPredicate(n),
            class: 'P',
            new_value: false,
        }
    }
}

/// Insertion-ordered binding table of one tag.
#[derive(Clone, Debug, Default)]
pub struct OperandBindings {
    bindings: Vec<OperandBinding>,
    index: FxHashMap<String, usize>,
}

impl OperandBindings {
    /// Bind every register operand of `facts`, in operand order.
    ///
    /// # Errors
    ///
    /// Returns [`FactsError::UnsupportedOperand`] for an operand whose
    /// class, id and value form have no access mode.
    pub fn build(facts: &TagFacts) -> Result<Self> {
        let mut table = Self::default();
        for (i, reg) in facts.regs.iter().enumerate() {
            table.push(bind(reg, i, &facts.semantics)?);
        }
        Ok(table)
    }

    /// Add read-write bindings for fixed predicate slots `Pd{n}`.
    #[must_use]
    pub fn with_fixed_predicates(mut self, slots: &[u8]) -> Self {
        for &n in slots {
            let binding = OperandBinding::fixed_predicate(n);
            if !self.index.contains_key(&binding.symbol) {
                self.push(binding);
            }
        }
        self
    }

    fn push(&mut self, binding: OperandBinding) {
        self.index.insert(binding.symbol.clone(), self.bindings.len());
        self.bindings.push(binding);
    }

    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&OperandBinding> {
        self.index.get(symbol).map(|&i| &self.bindings[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperandBinding> {
        self.bindings.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

fn unsupported(reg: &RegOperand, what: &'static str) -> FactsError {
    FactsError::UnsupportedOperand {
        class: reg.class,
        id: reg.id.clone(),
        what,
    }
}

fn bind(reg: &RegOperand, index: usize, semantics: &str) -> Result<OperandBinding> {
    // Pairs are always read through their old value.
    let new_value = if reg.is_pair() {
        false
    } else if reg.is_single() {
        if semantics.contains(&reg.old_symbol()) {
            false
        } else if semantics.contains(&reg.new_symbol()) {
            true
        } else {
            return Err(unsupported(reg, "not referenced by semantics"));
        }
    } else {
        return Err(unsupported(reg, "bad id"));
    };

    let (kind, mode) = if new_value {
        new_value_mode(reg)
    } else {
        old_value_mode(reg)
    }
    .ok_or_else(|| unsupported(reg, "no access mode"))?;

    let width = match kind {
        OperandKind::Predicate => 1,
        _ if reg.is_pair() => 8,
        _ => 4,
    };
    let symbol = if new_value {
        reg.new_symbol()
    } else {
        reg.old_symbol()
    };

    Ok(OperandBinding {
        symbol,
        kind,
        width,
        mode,
        slot: OperandSlot::Operand(index),
        class: reg.class,
        new_value,
    })
}

fn old_value_mode(reg: &RegOperand) -> Option<(OperandKind, AccessMode)> {
    use AccessMode::{ReadOnly, ReadWrite, WriteOnly};
    use OperandKind::{Control, Predicate, Register, RegisterPair};

    let mode = match (reg.class, reg.id.as_str()) {
        ('R', "ss" | "tt") => (RegisterPair, ReadOnly),
        ('R', "dd" | "ee") => (RegisterPair, WriteOnly),
        ('R', "xx" | "yy") => (RegisterPair, ReadWrite),
        ('R', "s" | "t" | "u" | "v") => (Register, ReadOnly),
        ('R', "d" | "e") => (Register, WriteOnly),
        ('R', "x" | "y") => (Register, ReadWrite),
        ('P', "s" | "t" | "u" | "v") => (Predicate, ReadOnly),
        ('P', "d" | "e") => (Predicate, WriteOnly),
        ('P', "x") => (Predicate, ReadWrite),
        ('C', "ss" | "s") => (Control, ReadOnly),
        ('C', "dd" | "d") => (Control, WriteOnly),
        _ => return None,
    };
    Some(mode)
}

fn new_value_mode(reg: &RegOperand) -> Option<(OperandKind, AccessMode)> {
    match (reg.class, reg.id.as_str()) {
        ('N', "s" | "t") => Some((OperandKind::Register, AccessMode::WriteOnly)),
        ('P', "t" | "u" | "v") => Some((OperandKind::Predicate, AccessMode::WriteOnly)),
        _ => None,
    }
}
