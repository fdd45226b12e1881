//! Register and immediate operands of an instruction syntax.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

static REG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([MNORCPQXSGVZA])([stuvwxyzdefg]+)([.]?[LlHh]?)(\d+S?)")
        .expect("valid register pattern")
});
static IMM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#([rRsSuUm])(\d+)(?::(\d+))?").expect("valid immediate pattern")
});

/// Register operand, e.g. `Rss32` is class `R`, id `ss`, bits `32`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct RegOperand {
    pub class: char,
    pub id: String,
    /// Half-word selector as written, e.g. `.L` in `Rt.L32`.
    #[serde(default)]
    pub subfield: String,
    #[serde(default)]
    pub bits: String,
}

impl RegOperand {
    #[must_use]
    pub fn new(class: char, id: &str) -> Self {
        Self {
            class,
            id: id.to_string(),
            subfield: String::new(),
            bits: String::new(),
        }
    }

    #[must_use]
    pub fn is_pair(&self) -> bool {
        self.id.len() == 2
    }

    #[must_use]
    pub fn is_single(&self) -> bool {
        self.id.len() == 1
    }

    /// Old-value symbol, `RsV`.
    #[must_use]
    pub fn old_symbol(&self) -> String {
        format!("{}{}V", self.class, self.id)
    }

    /// New-value symbol, `NtN`.
    #[must_use]
    pub fn new_symbol(&self) -> String {
        format!("{}{}N", self.class, self.id)
    }
}

/// Immediate operand, e.g. `#s11:2` is letter `s`, 11 bits, shift 2.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ImmOperand {
    pub letter: char,
    #[serde(default)]
    pub bits: u32,
    #[serde(default)]
    pub shift: u32,
}

impl ImmOperand {
    /// Index into `insn.immed`: uppercase letters name the second immediate.
    #[must_use]
    pub const fn slot(&self) -> u8 {
        if self.letter.is_ascii_uppercase() { 1 } else { 0 }
    }

    /// Semantics symbol, `siV`.
    #[must_use]
    pub fn symbol(&self) -> String {
        format!("{}iV", self.letter)
    }
}

/// Register operands of a syntax string, in order of first appearance.
///
/// Operands directly preceded by `DUP` are not operands.
#[must_use]
pub fn derive_regs(syntax: &str) -> Vec<RegOperand> {
    let re = &*REG_PATTERN;
    let mut regs: Vec<RegOperand> = Vec::new();
    let mut start = 0;
    while let Some(caps) = re.captures_at(syntax, start) {
        let Some(whole) = caps.get(0) else { break };
        if syntax[..whole.start()].ends_with("DUP") {
            start = whole.start() + 1;
            continue;
        }
        start = whole.end();

        let reg = RegOperand {
            class: caps[1].chars().next().unwrap_or('R'),
            id: caps[2].to_string(),
            subfield: caps[3].to_string(),
            bits: caps[4].to_string(),
        };
        if !regs.contains(&reg) {
            regs.push(reg);
        }
    }
    regs
}

/// Immediate operands of a syntax string, in order of first appearance.
#[must_use]
pub fn derive_imms(syntax: &str) -> Vec<ImmOperand> {
    let re = &*IMM_PATTERN;
    let mut imms: Vec<ImmOperand> = Vec::new();
    for caps in re.captures_iter(syntax) {
        let imm = ImmOperand {
            letter: caps[1].chars().next().unwrap_or('u'),
            bits: caps[2].parse().unwrap_or(0),
            shift: caps.get(3).and_then(|m| m.as_str().parse().ok()).unwrap_or(0),
        };
        if !imms.contains(&imm) {
            imms.push(imm);
        }
    }
    imms
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reg(class: char, id: &str, subfield: &str, bits: &str) -> RegOperand {
        RegOperand {
            class,
            id: id.to_string(),
            subfield: subfield.to_string(),
            bits: bits.to_string(),
        }
    }

    #[test]
    fn test_derive_regs_simple() {
        assert_eq!(
            derive_regs("Rd32=add(Rs32,Rt32)"),
            vec![reg('R', "d", "", "32"), reg('R', "s", "", "32"), reg('R', "t", "", "32")]
        );
    }

    #[test]
    fn test_derive_regs_subfield_and_pairs() {
        assert_eq!(
            derive_regs("Rd32=add(Rt.L32,Rs.H32)"),
            vec![reg('R', "d", "", "32"), reg('R', "t", ".L", "32"), reg('R', "s", ".H", "32")]
        );
        assert_eq!(
            derive_regs("Rdd32=add(Rss32,Rtt32):sat"),
            vec![reg('R', "dd", "", "32"), reg('R', "ss", "", "32"), reg('R', "tt", "", "32")]
        );
    }

    #[test]
    fn test_derive_regs_new_value() {
        assert_eq!(
            derive_regs("if (cmp.eq(Ns8.new,#U5)) jump:t #r9:2"),
            vec![reg('N', "s", "", "8")]
        );
    }

    #[test]
    fn test_derive_regs_dedup() {
        assert_eq!(
            derive_regs("Rx32=add(Rx32,Rs32)"),
            vec![reg('R', "x", "", "32"), reg('R', "s", "", "32")]
        );
    }

    #[test]
    fn test_derive_regs_skips_dup() {
        assert_eq!(derive_regs("Vd32=DUPVs32"), vec![reg('V', "d", "", "32")]);
    }

    #[test]
    fn test_derive_regs_circ() {
        let regs = derive_regs("Rd32=memub(Rx32++#s4:0:circ(Mu2))");
        assert_eq!(
            regs,
            vec![reg('R', "d", "", "32"), reg('R', "x", "", "32"), reg('M', "u", "", "2")]
        );
    }

    #[test]
    fn test_derive_imms() {
        let imms = derive_imms("Rdd32=combine(#s8,#U6)");
        assert_eq!(
            imms,
            vec![
                ImmOperand {
                    letter: 's',
                    bits: 8,
                    shift: 0
                },
                ImmOperand {
                    letter: 'U',
                    bits: 6,
                    shift: 0
                }
            ]
        );
        assert_eq!(imms[0].slot(), 0);
        assert_eq!(imms[1].slot(), 1);
        assert_eq!(imms[1].symbol(), "UiV");
    }

    #[test]
    fn test_derive_imms_shift() {
        let imms = derive_imms("memd(r29+#s6:3)=Rtt8");
        assert_eq!(imms.len(), 1);
        assert_eq!(imms[0].bits, 6);
        assert_eq!(imms[0].shift, 3);
        assert!(derive_imms("p0=cmp.eq(Rs16,#-1)").is_empty());
    }

    #[test]
    fn test_symbols() {
        let r = RegOperand::new('N', "t");
        assert_eq!(r.old_symbol(), "NtV");
        assert_eq!(r.new_symbol(), "NtN");
        assert!(r.is_single());
        assert!(RegOperand::new('R', "xx").is_pair());
    }
}
