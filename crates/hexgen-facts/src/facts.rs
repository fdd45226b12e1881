//! Tag facts and the JSON facts document.

use std::path::Path;

use rustc_hash::FxHashSet;
use serde::Deserialize;
use tracing::debug;

use crate::{Attributes, ImmOperand, RegOperand, Result, derive_imms, derive_regs};

/// Everything known about one instruction tag.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "RawTagFacts")]
pub struct TagFacts {
    pub tag: String,
    pub syntax: String,
    pub semantics: String,
    pub attributes: Attributes,
    pub regs: Vec<RegOperand>,
    pub imms: Vec<ImmOperand>,
}

/// Facts as written in JSON; operand lists may be omitted.
#[derive(Deserialize)]
struct RawTagFacts {
    tag: String,
    #[serde(default)]
    syntax: String,
    #[serde(default)]
    semantics: String,
    #[serde(default)]
    attributes: Attributes,
    regs: Option<Vec<RegOperand>>,
    imms: Option<Vec<ImmOperand>>,
}

impl From<RawTagFacts> for TagFacts {
    fn from(raw: RawTagFacts) -> Self {
        let regs = raw.regs.unwrap_or_else(|| derive_regs(&raw.syntax));
        let imms = raw.imms.unwrap_or_else(|| derive_imms(&raw.syntax));
        Self {
            tag: raw.tag,
            syntax: raw.syntax,
            semantics: raw.semantics,
            attributes: raw.attributes,
            regs,
            imms,
        }
    }
}

impl TagFacts {
    /// Facts with operand lists derived from `syntax`.
    #[must_use]
    pub fn new(tag: &str, syntax: &str, semantics: &str, attributes: Attributes) -> Self {
        Self {
            tag: tag.to_string(),
            syntax: syntax.to_string(),
            semantics: semantics.to_string(),
            attributes,
            regs: derive_regs(syntax),
            imms: derive_imms(syntax),
        }
    }

    /// Replace syntax and semantics, re-deriving the operand lists.
    #[must_use]
    pub fn with_overridden(self, syntax: &str, semantics: &str) -> Self {
        Self::new(&self.tag, syntax, semantics, self.attributes)
    }

    #[must_use]
    pub fn has_semantics(&self) -> bool {
        !self.semantics.trim().is_empty()
    }

    /// Semantics read the old value of `reg`.
    #[must_use]
    pub fn is_old_value(&self, reg: &RegOperand) -> bool {
        self.semantics.contains(&reg.old_symbol())
    }

    /// Semantics read the new value of `reg`.
    #[must_use]
    pub fn is_new_value(&self, reg: &RegOperand) -> bool {
        self.semantics.contains(&reg.new_symbol())
    }
}

/// The facts document: all tags in declaration order.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FactsFile {
    pub tags: Vec<TagFacts>,
    /// Tags that get a lifter function; every tag with semantics when absent.
    #[serde(default)]
    pub lift: Option<FxHashSet<String>>,
}

impl FactsFile {
    #[must_use]
    pub const fn new(tags: Vec<TagFacts>) -> Self {
        Self { tags, lift: None }
    }

    /// Parse a facts document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FactsError::Json`] on malformed input.
    pub fn from_json(text: &str) -> Result<Self> {
        let facts: Self = serde_json::from_str(text)?;
        debug!(tags = facts.tags.len(), "parsed facts");
        Ok(facts)
    }

    /// Read and parse a facts file.
    ///
    /// # Errors
    ///
    /// Returns an IO or JSON error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading facts");
        Self::from_json(&text)
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&TagFacts> {
        self.tags.iter().find(|t| t.tag == tag)
    }

    /// Whether `tag` gets a lifter function.
    #[must_use]
    pub fn is_lifted(&self, facts: &TagFacts) -> bool {
        facts.has_semantics() && self.lift.as_ref().is_none_or(|l| l.contains(&facts.tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = r#"{
        "tags": [
            {
                "tag": "A2_add",
                "syntax": "Rd32=add(Rs32,Rt32)",
                "semantics": "{ RdV=RsV+RtV;}",
                "attributes": ["A_ARCHV2"]
            },
            {
                "tag": "J2_jump",
                "syntax": "jump #r22:2",
                "semantics": "{fIMMEXT(riV); fPCALIGN(riV); fBRANCH(fREAD_PC()+riV,COF_TYPE_JUMP);}",
                "attributes": ["A_JUMP"],
                "regs": [],
                "imms": [{"letter": "r", "bits": 22, "shift": 2}]
            },
            { "tag": "Y2_nop", "syntax": "nop" }
        ]
    }"#;

    #[test]
    fn test_from_json_derives_operands() {
        let file = FactsFile::from_json(DOC).unwrap();
        assert_eq!(file.tags.len(), 3);
        let add = file.get("A2_add").unwrap();
        let ids: Vec<_> = add.regs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["d", "s", "t"]);
        assert!(add.imms.is_empty());
        assert!(add.attributes.contains("A_ARCHV2"));
    }

    #[test]
    fn test_from_json_explicit_operands() {
        let file = FactsFile::from_json(DOC).unwrap();
        let jump = file.get("J2_jump").unwrap();
        assert!(jump.regs.is_empty());
        assert_eq!(
            jump.imms,
            vec![ImmOperand {
                letter: 'r',
                bits: 22,
                shift: 2
            }]
        );
        assert!(jump.attributes.is_jump());
    }

    #[test]
    fn test_lift_selection() {
        let mut file = FactsFile::from_json(DOC).unwrap();
        let nop = file.get("Y2_nop").unwrap().clone();
        assert!(!nop.has_semantics());
        assert!(!file.is_lifted(&nop));
        let add = file.get("A2_add").unwrap().clone();
        assert!(file.is_lifted(&add));

        file.lift = Some(["J2_jump".to_string()].into_iter().collect());
        assert!(!file.is_lifted(&add));
        let jump = file.get("J2_jump").unwrap().clone();
        assert!(file.is_lifted(&jump));
    }

    #[test]
    fn test_with_overridden() {
        let facts = TagFacts::new("A2_swiz", "Rd32=swiz(Rs32)", "", Attributes::new())
            .with_overridden("Rd32=swiz(Rs32)", "{ RdV = fBYTESWAP(RsV); }");
        assert!(facts.has_semantics());
        assert_eq!(facts.regs.len(), 2);
        assert!(facts.is_old_value(&facts.regs[1]));
        assert!(!facts.is_new_value(&facts.regs[1]));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            FactsFile::from_json("{\"tags\": 3}"),
            Err(crate::FactsError::Json(_))
        ));
    }
}
