//! Semantics normalization and compound compare-jump splitting.

use hexgen_facts::Attributes;
use tracing::trace;

use crate::macros::{MacroTable, PpKind, PpToken, pp_tokenize, render};
use crate::{Result, SemError};

const PART1: &str = "fPART1";

/// One normalized semantics part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    pub tokens: Vec<PpToken>,
    /// Canonical spelling of `tokens`.
    pub text: String,
}

impl Part {
    fn new(tokens: Vec<PpToken>) -> Self {
        let text = render(&tokens);
        Self { tokens, text }
    }
}

/// Normalized semantics: one part, or compare part then branch part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Normalized {
    pub parts: Vec<Part>,
}

impl Normalized {
    #[must_use]
    pub const fn is_split(&self) -> bool {
        self.parts.len() == 2
    }
}

/// Normalizes semantics strings against a macro table.
#[derive(Clone, Debug)]
pub struct Normalizer {
    table: MacroTable,
}

impl Normalizer {
    /// Normalizer with the standard Hexagon rules.
    ///
    /// # Errors
    ///
    /// Fails only if a built-in rule does not parse.
    pub fn new() -> Result<Self> {
        Ok(Self {
            table: MacroTable::standard()?,
        })
    }

    #[must_use]
    pub const fn with_table(table: MacroTable) -> Self {
        Self { table }
    }

    #[must_use]
    pub const fn table(&self) -> &MacroTable {
        &self.table
    }

    /// Expand `semantics` and split it when `attrs` mark a compound
    /// compare-jump.
    ///
    /// # Errors
    ///
    /// Returns expansion errors, or [`SemError::MissingPartOne`] for a
    /// compound compare-jump without an `fPART1` marker.
    pub fn normalize(&self, semantics: &str, attrs: &Attributes) -> Result<Normalized> {
        let tokens = pp_tokenize(semantics)?;
        let (rest, work) = strip_part1(tokens)?;

        let mut parts = Vec::with_capacity(2);
        if attrs.is_compound_compare_jump() {
            let work = work.ok_or(SemError::MissingPartOne)?;
            let pos = work.first().map_or(0, |t| t.pos);
            let mut part1 = vec![PpToken::new(PpKind::Punct, "{", pos)];
            part1.extend(self.table.expand(work)?);
            part1.push(PpToken::new(PpKind::Punct, ";", pos));
            part1.push(PpToken::new(PpKind::Punct, "}", pos));
            parts.push(Part::new(part1));
        }
        parts.push(Part::new(self.table.expand(rest)?));

        for (i, part) in parts.iter().enumerate() {
            trace!(part = i + 1, text = %part.text, "normalized");
        }
        Ok(Normalized { parts })
    }
}

/// Normalize with the standard rules.
///
/// # Errors
///
/// See [`Normalizer::normalize`].
pub fn normalize(semantics: &str, attrs: &Attributes) -> Result<Normalized> {
    Normalizer::new()?.normalize(semantics, attrs)
}

/// Remove every `fPART1(...)` call, returning the remaining tokens and the
/// arguments of all calls in order, one statement each.
fn strip_part1(tokens: Vec<PpToken>) -> Result<(Vec<PpToken>, Option<Vec<PpToken>>)> {
    let mut rest = Vec::with_capacity(tokens.len());
    let mut bodies: Vec<Vec<PpToken>> = Vec::new();
    let mut iter = tokens.into_iter().peekable();

    while let Some(tok) = iter.next() {
        if !(tok.is_ident(PART1) && iter.peek().is_some_and(|t| t.is_punct("("))) {
            rest.push(tok);
            continue;
        }
        iter.next();
        let mut arg = Vec::new();
        let mut depth = 0usize;
        loop {
            let Some(t) = iter.next() else {
                return Err(SemError::Macro(format!("unterminated call to {PART1}")));
            };
            if t.is_punct("(") {
                depth += 1;
            } else if t.is_punct(")") {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            arg.push(t);
        }
        bodies.push(arg);
    }

    if bodies.is_empty() {
        return Ok((rest, None));
    }
    let mut work = Vec::new();
    for (i, body) in bodies.into_iter().enumerate() {
        if i > 0 {
            let pos = body.first().map_or(0, |t| t.pos);
            work.push(PpToken::new(PpKind::Punct, ";", pos));
        }
        work.extend(body);
    }
    Ok((rest, Some(work)))
}

/// Fixed predicate slots `0..=3` referenced by `parts`, ascending.
///
/// A slot is referenced by `fLSBNEW(n)`, `fWRITE_Pn(...)` or `fREAD_P0()`.
#[must_use]
pub fn fixed_predicates(parts: &[Part]) -> Vec<u8> {
    let mut seen = [false; 4];
    for part in parts {
        let toks = &part.tokens;
        for (i, tok) in toks.iter().enumerate() {
            if tok.kind != PpKind::Ident || !toks.get(i + 1).is_some_and(|t| t.is_punct("(")) {
                continue;
            }
            let slot = match tok.text.as_str() {
                "fLSBNEW" => toks
                    .get(i + 2)
                    .filter(|t| t.kind == PpKind::Number)
                    .filter(|_| toks.get(i + 3).is_some_and(|t| t.is_punct(")")))
                    .and_then(|t| t.text.parse::<u8>().ok()),
                "fWRITE_P0" | "fREAD_P0" => Some(0),
                "fWRITE_P1" => Some(1),
                "fWRITE_P2" => Some(2),
                "fWRITE_P3" => Some(3),
                _ => None,
            };
            if let Some(n) = slot.filter(|n| *n < 4) {
                seen[usize::from(n)] = true;
            }
        }
    }
    (0u8..4).filter(|n| seen[usize::from(*n)]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn attrs(names: &[&str]) -> Attributes {
        names.iter().copied().collect()
    }

    fn texts(n: &Normalized) -> Vec<&str> {
        n.parts.iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn test_single_part() {
        let n = normalize(
            "{fIMMEXT(siV); fEA_RI(RsV,siV); fSTORE(1,4,EA,RtV); }",
            &attrs(&["A_STORE"]),
        )
        .unwrap();
        assert!(!n.is_split());
        assert_eq!(
            texts(&n),
            ["{fIMMEXT(siV);{EA=RsV+siV;};fSTORE(1,4,EA,RtV);}"]
        );
    }

    #[test]
    fn test_compound_compare_jump_split() {
        let sem = "{fPART1(fWRITE_P0(f8BITSOF((RsV==UiV)))) \
                   fBRANCH_SPECULATE_STALL(fLSBNEW0,,SPECULATE_TAKEN,13,0) \
                   if (fLSBNEW0) {fIMMEXT(riV); fPCALIGN(riV); fBRANCH(fREAD_PC()+riV,COF_TYPE_JUMP);}}";
        let n = normalize(sem, &attrs(&["A_JUMP", "A_NEWCMPJUMP"])).unwrap();
        assert!(n.is_split());
        assert_eq!(
            texts(&n),
            [
                "{fWRITE_P0(f8BITSOF((RsV==UiV)));}",
                "{if(fLSBNEW(0)){fIMMEXT(riV);fPCALIGN(riV);fBRANCH(fREAD_PC()+riV,COF_TYPE_JUMP);}}",
            ]
        );
    }

    #[test]
    fn test_every_part1_body_kept() {
        let sem = "{fPART1(RdV=RsV) fPART1(fWRITE_P0(RdV==0)) \
                   if (fLSBNEW0) {fBRANCH(fREAD_PC()+riV,COF_TYPE_JUMP);}}";
        let n = normalize(sem, &attrs(&["A_JUMP", "A_NEWCMPJUMP"])).unwrap();
        assert_eq!(
            texts(&n),
            [
                "{RdV=RsV;fWRITE_P0(RdV==0);}",
                "{if(fLSBNEW(0)){fBRANCH(fREAD_PC()+riV,COF_TYPE_JUMP);}}",
            ]
        );
    }

    #[test]
    fn test_part1_erased_without_attribute() {
        let n = normalize("{fPART1(RdV=1) RsV=2;}", &Attributes::new()).unwrap();
        assert_eq!(texts(&n), ["{RsV=2;}"]);
    }

    #[test]
    fn test_missing_part1() {
        assert!(matches!(
            normalize("{ RdV=1; }", &attrs(&["A_NEWCMPJUMP"])),
            Err(SemError::MissingPartOne)
        ));
    }

    #[test]
    fn test_fixed_predicates() {
        let n = normalize(
            "{ fWRITE_P2(1); if (fLSBNEW0) { fWRITE_P0(0); } RdV = fLSBNEW(PtN); }",
            &Attributes::new(),
        )
        .unwrap();
        assert_eq!(fixed_predicates(&n.parts), [0, 2]);

        let n = normalize("{ if (fLSBOLD(fREAD_P0())) { RdV=1; } }", &Attributes::new()).unwrap();
        assert_eq!(fixed_predicates(&n.parts), [0]);

        let n = normalize("{ RdV=RsV; }", &Attributes::new()).unwrap();
        assert!(fixed_predicates(&n.parts).is_empty());
    }

    #[test]
    fn test_hidden_code_removed() {
        let n = normalize(
            "{ if (fGET_LPCFG) { fHIDE( if (fGET_LPCFG >= 2) { } else ) if (fGET_LPCFG==1) { fWRITE_P3(0xff); } } }",
            &Attributes::new(),
        )
        .unwrap();
        assert_eq!(
            texts(&n),
            ["{if(fREAD_LPCFG()){if(fREAD_LPCFG()==1){fWRITE_P3(0xff);}}}"]
        );
        assert_eq!(fixed_predicates(&n.parts), [3]);
    }
}
