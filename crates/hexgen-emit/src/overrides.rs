//! Per-tag replacements of syntax and semantics.
//!
//! A handful of upstream definitions do not lift as written; an override
//! swaps both strings before anything is parsed, and the operand lists are
//! re-derived from the new syntax.

use std::borrow::Cow;

use hexgen_facts::TagFacts;
use rustc_hash::FxHashMap;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Override {
    pub syntax: String,
    pub semantics: String,
}

#[derive(Clone, Debug, Default)]
pub struct Overrides {
    by_tag: FxHashMap<String, Override>,
}

impl Overrides {
    /// No overrides.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in overrides.
    #[must_use]
    pub fn standard() -> Self {
        // The upstream definition reads bytes through a macro that has no
        // effect-IR form; the byte swap is equivalent.
        Self::empty().with("A2_swiz", "Rd32=swiz(Rs32)", "{ RdV = fBYTESWAP(RsV); }")
    }

    #[must_use]
    pub fn with(mut self, tag: &str, syntax: &str, semantics: &str) -> Self {
        self.by_tag.insert(
            tag.to_string(),
            Override {
                syntax: syntax.to_string(),
                semantics: semantics.to_string(),
            },
        );
        self
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&Override> {
        self.by_tag.get(tag)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    /// `facts` with its override applied, if it has one.
    #[must_use]
    pub fn apply<'a>(&self, facts: &'a TagFacts) -> Cow<'a, TagFacts> {
        self.get(&facts.tag).map_or(Cow::Borrowed(facts), |o| {
            debug!(tag = %facts.tag, syntax = %o.syntax, "applying override");
            Cow::Owned(facts.clone().with_overridden(&o.syntax, &o.semantics))
        })
    }
}
