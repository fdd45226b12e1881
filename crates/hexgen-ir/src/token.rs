//! Disassembly tokens.
//!
//! A tokenizer body is a flat list of [`Token`]s in display order. Some
//! tokens are only fully known once an instruction is decoded (register
//! numbers, immediates, whether an immediate extender is active); those are
//! kept symbolic here and either serialized as host code or evaluated with
//! [`Token::resolve`].

use thiserror::Error;

/// Register token.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum RegToken {
    /// Fixed text, e.g. `P0`, `SP` or a `.new` suffix.
    Named(String),
    /// Register operand looked up through `insn.regno[slot]`.
    Operand {
        class: char,
        subfield: String,
        slot: usize,
        /// High half of a pair, `regno[slot] + 1`.
        pair_high: bool,
    },
}

/// Integer token.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IntToken {
    Literal(i64),
    /// Immediate slot `insn.immed[i]`.
    Immediate(u8),
}

/// One element of a tokenizer body.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Token {
    Text(String),
    Instruction(String),
    Register(RegToken),
    Integer(IntToken),
    /// Code-relative address `pc + insn.immed[slot]`.
    Address { slot: u8 },
    /// `##` when an immediate extender is active, `#` otherwise.
    ImmPrefix,
    /// Named register, or integer zero when an immediate extender is active.
    GpOrZero(String),
}

impl Token {
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    #[must_use]
    pub fn insn(s: impl Into<String>) -> Self {
        Self::Instruction(s.into())
    }

    #[must_use]
    pub fn named_reg(s: impl Into<String>) -> Self {
        Self::Register(RegToken::Named(s.into()))
    }

    /// Evaluate the token for one decoded instruction.
    ///
    /// # Errors
    ///
    /// Fails when an operand slot is out of range for `ctx` or the namer does
    /// not know the register number.
    pub fn resolve(
        &self,
        ctx: &InsnContext,
        namer: &dyn RegisterNamer,
    ) -> Result<DisplayToken, ResolveError> {
        let token = match self {
            Self::Text(s) => DisplayToken::Text(s.clone()),
            Self::Instruction(s) => DisplayToken::Instruction(s.clone()),
            Self::Register(RegToken::Named(s)) => DisplayToken::Register(s.clone()),
            Self::Register(RegToken::Operand {
                class,
                subfield,
                slot,
                pair_high,
            }) => {
                let base = *ctx
                    .regno
                    .get(*slot)
                    .ok_or(ResolveError::MissingOperand(*slot))?;
                let regno = if *pair_high { base + 1 } else { base };
                let mut name = namer
                    .register_name(*class, regno)
                    .ok_or(ResolveError::UnknownRegister {
                        class: *class,
                        regno,
                    })?;
                if !subfield.is_empty() {
                    name.push('.');
                    name.push_str(subfield);
                }
                DisplayToken::Register(name)
            }
            Self::Integer(IntToken::Literal(v)) => DisplayToken::integer(*v),
            Self::Integer(IntToken::Immediate(i)) => DisplayToken::integer(ctx.immediate(*i)?),
            Self::Address { slot } => {
                let target = ctx.pc.wrapping_add_signed(ctx.immediate(*slot)?);
                DisplayToken::Address {
                    target,
                    text: format!("0x{target:x}"),
                }
            }
            Self::ImmPrefix => {
                DisplayToken::Text(if ctx.extension_valid { "##" } else { "#" }.to_string())
            }
            Self::GpOrZero(name) => {
                if ctx.extension_valid {
                    DisplayToken::Integer {
                        value: 0,
                        text: "0".to_string(),
                    }
                } else {
                    DisplayToken::Register(name.clone())
                }
            }
        };
        Ok(token)
    }
}

/// Resolve a whole token stream.
///
/// # Errors
///
/// Returns the first token resolution failure.
pub fn resolve_all(
    tokens: &[Token],
    ctx: &InsnContext,
    namer: &dyn RegisterNamer,
) -> Result<Vec<DisplayToken>, ResolveError> {
    tokens.iter().map(|t| t.resolve(ctx, namer)).collect()
}

/// A concrete token, ready for display.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DisplayToken {
    Text(String),
    Instruction(String),
    Register(String),
    Integer { value: i64, text: String },
    Address { target: u64, text: String },
}

impl DisplayToken {
    /// Integers are 32 bits wide on the target, so negatives print as
    /// eight hex digits.
    fn integer(value: i64) -> Self {
        let bits = value & 0xffff_ffff;
        Self::Integer {
            value,
            text: format!("0x{bits:x}"),
        }
    }

    /// Display text of the token.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Text(s) | Self::Instruction(s) | Self::Register(s) => s,
            Self::Integer { text, .. } | Self::Address { text, .. } => text,
        }
    }
}

/// Render resolved tokens as one line of disassembly.
#[must_use]
pub fn render(tokens: &[DisplayToken]) -> String {
    tokens.iter().map(DisplayToken::text).collect()
}

/// Decoded-instruction fields the tokens refer to.
#[derive(Clone, Debug, Default)]
pub struct InsnContext {
    pub pc: u64,
    pub regno: Vec<u32>,
    pub immed: [i64; 2],
    pub extension_valid: bool,
}

impl InsnContext {
    fn immediate(&self, slot: u8) -> Result<i64, ResolveError> {
        self.immed
            .get(usize::from(slot))
            .copied()
            .ok_or(ResolveError::MissingImmediate(slot))
    }
}

/// Maps a register class and number to its display name.
pub trait RegisterNamer {
    fn register_name(&self, class: char, regno: u32) -> Option<String>;
}

/// Hexagon register naming.
#[derive(Clone, Copy, Debug, Default)]
pub struct HexRegisterNamer;

impl RegisterNamer for HexRegisterNamer {
    fn register_name(&self, class: char, regno: u32) -> Option<String> {
        let name = match class {
            'R' | 'N' => match regno {
                0..=28 => format!("R{regno}"),
                29 => "SP".to_string(),
                30 => "FP".to_string(),
                31 => "LR".to_string(),
                _ => return None,
            },
            'C' => control_name(regno)?,
            'P' => match regno {
                0..=3 => format!("P{regno}"),
                _ => return None,
            },
            'S' => match regno {
                0 => "SGP0".to_string(),
                1 => "SGP1".to_string(),
                2..=127 => format!("S{regno}"),
                _ => return None,
            },
            _ => format!("{class}{regno}"),
        };
        Some(name)
    }
}

fn control_name(regno: u32) -> Option<String> {
    const NAMED: [&str; 14] = [
        "SA0", "LC0", "SA1", "LC1", "P3:0", "C5", "M0", "M1", "USR", "PC", "UGP", "GP", "CS0",
        "CS1",
    ];
    match regno {
        0..=13 => NAMED.get(regno as usize).map(|s| (*s).to_string()),
        14..=31 => Some(format!("C{regno}")),
        _ => None,
    }
}

/// Token resolution failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no register operand in slot {0}")]
    MissingOperand(usize),

    #[error("no immediate in slot {0}")]
    MissingImmediate(u8),

    #[error("no name for {class} register {regno}")]
    UnknownRegister { class: char, regno: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx(extension_valid: bool) -> InsnContext {
        InsnContext {
            pc: 0x1000,
            regno: vec![2, 4],
            immed: [-8, 0x20],
            extension_valid,
        }
    }

    #[test]
    fn test_gp_or_zero() {
        let tok = Token::GpOrZero("GP".to_string());
        assert_eq!(
            tok.resolve(&ctx(false), &HexRegisterNamer).unwrap(),
            DisplayToken::Register("GP".to_string())
        );
        assert_eq!(
            tok.resolve(&ctx(true), &HexRegisterNamer).unwrap(),
            DisplayToken::Integer {
                value: 0,
                text: "0".to_string()
            }
        );
    }

    #[test]
    fn test_imm_prefix() {
        let tok = Token::ImmPrefix;
        assert_eq!(tok.resolve(&ctx(false), &HexRegisterNamer).unwrap().text(), "#");
        assert_eq!(tok.resolve(&ctx(true), &HexRegisterNamer).unwrap().text(), "##");
    }

    #[test]
    fn test_address_is_pc_relative() {
        let tok = Token::Address { slot: 0 };
        assert_eq!(
            tok.resolve(&ctx(false), &HexRegisterNamer).unwrap(),
            DisplayToken::Address {
                target: 0xff8,
                text: "0xff8".to_string()
            }
        );
    }

    #[test]
    fn test_register_pair() {
        let hi = Token::Register(RegToken::Operand {
            class: 'R',
            subfield: String::new(),
            slot: 1,
            pair_high: true,
        });
        let lo = Token::Register(RegToken::Operand {
            class: 'R',
            subfield: String::new(),
            slot: 1,
            pair_high: false,
        });
        let tokens = [hi, Token::text(":"), lo];
        let out = resolve_all(&tokens, &ctx(false), &HexRegisterNamer).unwrap();
        assert_eq!(render(&out), "R5:R4");
    }

    #[test]
    fn test_register_subfield() {
        let tok = Token::Register(RegToken::Operand {
            class: 'R',
            subfield: "L".to_string(),
            slot: 0,
            pair_high: false,
        });
        assert_eq!(tok.resolve(&ctx(false), &HexRegisterNamer).unwrap().text(), "R2.L");
    }

    #[test]
    fn test_missing_operand() {
        let tok = Token::Register(RegToken::Operand {
            class: 'R',
            subfield: String::new(),
            slot: 5,
            pair_high: false,
        });
        assert_eq!(
            tok.resolve(&ctx(false), &HexRegisterNamer),
            Err(ResolveError::MissingOperand(5))
        );
    }

    #[test]
    fn test_immediate_hex() {
        let tokens = [Token::text("#"), Token::Integer(IntToken::Immediate(1))];
        let out = resolve_all(&tokens, &ctx(false), &HexRegisterNamer).unwrap();
        assert_eq!(render(&out), "#0x20");
    }

    #[test]
    fn test_negative_immediate_is_32_bit() {
        let tok = Token::Integer(IntToken::Immediate(0));
        assert_eq!(
            tok.resolve(&ctx(false), &HexRegisterNamer).unwrap(),
            DisplayToken::Integer {
                value: -8,
                text: "0xfffffff8".to_string()
            }
        );
        let lit = Token::Integer(IntToken::Literal(-1));
        assert_eq!(lit.resolve(&ctx(false), &HexRegisterNamer).unwrap().text(), "0xffffffff");
    }

    #[test]
    fn test_namer() {
        let namer = HexRegisterNamer;
        assert_eq!(namer.register_name('R', 29).as_deref(), Some("SP"));
        assert_eq!(namer.register_name('C', 9).as_deref(), Some("PC"));
        assert_eq!(namer.register_name('C', 20).as_deref(), Some("C20"));
        assert_eq!(namer.register_name('P', 4), None);
        assert_eq!(namer.register_name('M', 1).as_deref(), Some("M1"));
    }
}
