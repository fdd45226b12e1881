//! Per-tag state for turning operands into tokens.

use std::sync::LazyLock;

use hexgen_facts::{Attributes, RegOperand, TagFacts};
use hexgen_ir::{IntToken, RegToken, Token};
use regex::Regex;

use crate::grammar::Reg;
use crate::{Result, SyntaxError};

static IMMEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"IMMEXT\(([A-Za-z])").expect("valid IMMEXT pattern"));

/// Tags with two immediates whose second one is the branch target.
const TWO_IMM_JUMPS: &[&str] = &["J4_jumpseti"];

pub struct TokenCtx<'a> {
    tag: &'a str,
    attrs: &'a Attributes,
    regs: &'a [RegOperand],
    num_imms: usize,
    /// Letter named by `IMMEXT`; only its case matters.
    extended: Option<char>,
    seen_cmpjump: bool,
    seen_loop: bool,
}

impl<'a> TokenCtx<'a> {
    pub fn new(facts: &'a TagFacts) -> Self {
        let extended = IMMEXT
            .captures(&facts.semantics)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().chars().next());
        Self {
            tag: &facts.tag,
            attrs: &facts.attributes,
            regs: &facts.regs,
            num_imms: facts.imms.len(),
            extended,
            seen_cmpjump: false,
            seen_loop: false,
        }
    }

    fn ambiguous(&self, letter: char, reason: &'static str) -> SyntaxError {
        SyntaxError::AmbiguousPlacement {
            tag: self.tag.to_string(),
            letter,
            reason,
        }
    }

    /// Tokens for immediate `letter`. Called once per immediate, left to
    /// right, since the branch-target choice depends on order.
    pub fn immediate(&mut self, letter: char) -> Result<Vec<Token>> {
        let slot = u8::from(letter.is_ascii_uppercase());

        let mut place = self.attrs.is_jump() || self.attrs.is_call();
        if place && self.num_imms > 1 {
            if self.num_imms > 2 {
                return Err(self.ambiguous(letter, "more than two immediates"));
            }
            let paired = TWO_IMM_JUMPS.contains(&self.tag)
                || self.attrs.is_compound_compare_jump()
                || self.attrs.is_new_value_jump();
            if !paired {
                return Err(self.ambiguous(letter, "two immediates on a plain branch"));
            }
            place = self.seen_cmpjump;
            self.seen_cmpjump = true;
        }
        if self.attrs.writes_any_loop_start() {
            place = !self.seen_loop;
            self.seen_loop = true;
        }

        if place {
            return Ok(vec![Token::Address { slot }]);
        }
        let extendable = self
            .extended
            .is_some_and(|c| c.is_ascii_uppercase() == letter.is_ascii_uppercase());
        let prefix = if extendable {
            Token::ImmPrefix
        } else {
            Token::text("#")
        };
        Ok(vec![prefix, Token::Integer(IntToken::Immediate(slot))])
    }

    /// Tokens for a register operand; pairs print as `hi:lo`.
    pub fn register(&self, reg: &Reg) -> Result<Vec<Token>> {
        let slot = self
            .regs
            .iter()
            .rposition(|r| r.id == reg.id)
            .ok_or_else(|| SyntaxError::UnknownRegister {
                tag: self.tag.to_string(),
                text: reg.text.clone(),
            })?;
        let operand = |pair_high| {
            Token::Register(RegToken::Operand {
                class: reg.class,
                subfield: reg.half.clone(),
                slot,
                pair_high,
            })
        };
        match reg.id.len() {
            1 => Ok(vec![operand(false)]),
            2 if reg.half.is_empty() => Ok(vec![operand(true), Token::text(":"), operand(false)]),
            _ => Err(SyntaxError::BadPair {
                tag: self.tag.to_string(),
                text: reg.text.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn facts(tag: &str, syntax: &str, sem: &str, attrs: &[&str]) -> TagFacts {
        TagFacts::new(tag, syntax, sem, attrs.iter().copied().collect())
    }

    fn reg(class: char, id: &str, half: &str) -> Reg {
        Reg {
            class,
            id: id.to_string(),
            half: half.to_string(),
            text: format!("{class}{id}{half}32"),
        }
    }

    fn imm(slot: u8) -> Token {
        Token::Integer(IntToken::Immediate(slot))
    }

    #[test]
    fn test_plain_immediates() {
        let f = facts(
            "A4_combineii",
            "Rdd32=combine(#s8,#U6)",
            "{ fIMMEXT(UiV); RddV = fCOMBINE(siV, UiV); }",
            &[],
        );
        let mut ctx = TokenCtx::new(&f);
        assert_eq!(ctx.immediate('s').unwrap(), [Token::text("#"), imm(0)]);
        assert_eq!(ctx.immediate('U').unwrap(), [Token::ImmPrefix, imm(1)]);
    }

    #[test]
    fn test_extension_follows_letter_case() {
        let f = facts(
            "A2_addi",
            "Rd32=add(Rs32,#s16)",
            "{ fIMMEXT(siV); RdV=RsV+siV; }",
            &[],
        );
        let mut ctx = TokenCtx::new(&f);
        assert_eq!(ctx.immediate('s').unwrap(), [Token::ImmPrefix, imm(0)]);

        let f = facts("A2_tfrsi", "Rd32=#s16", "{ RdV=siV; }", &[]);
        let mut ctx = TokenCtx::new(&f);
        assert_eq!(ctx.immediate('s').unwrap(), [Token::text("#"), imm(0)]);
    }

    #[test]
    fn test_single_branch_target() {
        let f = facts("J2_jump", "jump #r22:2", "", &["A_JUMP"]);
        let mut ctx = TokenCtx::new(&f);
        assert_eq!(ctx.immediate('r').unwrap(), [Token::Address { slot: 0 }]);
    }

    #[test]
    fn test_compare_jump_places_second_immediate() {
        let f = facts(
            "J4_cmpeqi_tp0_jump_nt",
            "p0=cmp.eq(Rs16,#U5); if (p0.new) jump:nt #r9:2",
            "",
            &["A_JUMP", "A_NEWCMPJUMP"],
        );
        let mut ctx = TokenCtx::new(&f);
        assert_eq!(ctx.immediate('U').unwrap(), [Token::text("#"), imm(1)]);
        assert_eq!(ctx.immediate('r').unwrap(), [Token::Address { slot: 0 }]);
    }

    #[test]
    fn test_loop_places_first_immediate() {
        let f = facts(
            "J2_loop0i",
            "loop0(#r7:2,#U10)",
            "",
            &["A_IMPLICIT_WRITES_SA0"],
        );
        let mut ctx = TokenCtx::new(&f);
        assert_eq!(ctx.immediate('r').unwrap(), [Token::Address { slot: 0 }]);
        assert_eq!(ctx.immediate('U').unwrap(), [Token::text("#"), imm(1)]);
    }

    #[test]
    fn test_ambiguous_placement() {
        let f = facts("J2_odd", "jump(#r9:2,#U5)", "", &["A_JUMP"]);
        let mut ctx = TokenCtx::new(&f);
        assert!(matches!(
            ctx.immediate('r'),
            Err(SyntaxError::AmbiguousPlacement { letter: 'r', .. })
        ));

        let f = facts("J2_odder", "jump(#r9:2,#U5,#s4)", "", &["A_JUMP", "A_NEWCMPJUMP"]);
        let mut ctx = TokenCtx::new(&f);
        assert!(matches!(
            ctx.immediate('r'),
            Err(SyntaxError::AmbiguousPlacement { .. })
        ));
    }

    #[test]
    fn test_registers() {
        let f = facts("A2_addp", "Rdd32=add(Rss32,Rtt32)", "", &[]);
        let ctx = TokenCtx::new(&f);
        let operand = |slot, pair_high| {
            Token::Register(RegToken::Operand {
                class: 'R',
                subfield: String::new(),
                slot,
                pair_high,
            })
        };
        assert_eq!(
            ctx.register(&reg('R', "ss", "")).unwrap(),
            [operand(1, true), Token::text(":"), operand(1, false)]
        );
        assert!(matches!(
            ctx.register(&reg('R', "dd", "L")),
            Err(SyntaxError::BadPair { .. })
        ));
        assert!(matches!(
            ctx.register(&reg('R', "u", "")),
            Err(SyntaxError::UnknownRegister { .. })
        ));
    }

    #[test]
    fn test_last_operand_with_id_wins() {
        let mut f = facts("X", "Rd32=add(Rs32,Rt32)", "", &[]);
        f.regs.push(RegOperand::new('N', "s"));
        let ctx = TokenCtx::new(&f);
        assert!(matches!(
            ctx.register(&reg('R', "s", "")).unwrap().as_slice(),
            [Token::Register(RegToken::Operand { slot: 3, .. })]
        ));
    }
}
