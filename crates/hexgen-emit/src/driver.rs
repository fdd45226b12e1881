//! Per-tag compilation and artifact assembly.

use std::time::Instant;

use hexgen_facts::{FactsFile, TagFacts};
use hexgen_sem::{Normalizer, lift};
use hexgen_syntax::tokenize;
use rayon::prelude::*;
use tracing::{debug, info, trace};

use crate::lifter::{gen_lift_fn, gen_lifter_file};
use crate::overrides::Overrides;
use crate::tokens::{gen_text_file, gen_tokenize_fn};
use crate::{EmitError, Result, TagError};

/// Which sources to generate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Artifacts {
    Lift,
    Text,
    #[default]
    Both,
}

impl Artifacts {
    #[must_use]
    pub const fn lifter(self) -> bool {
        matches!(self, Self::Lift | Self::Both)
    }

    #[must_use]
    pub const fn text(self) -> bool {
        matches!(self, Self::Text | Self::Both)
    }
}

/// Generation options.
#[derive(Clone, Debug)]
pub struct GenOptions {
    /// Worker threads; 0 uses rayon's default.
    pub jobs: usize,
    /// Base name of the output files.
    pub base_name: String,
    pub artifacts: Artifacts,
}

impl Default for GenOptions {
    fn default() -> Self {
        Self {
            jobs: 0,
            base_name: "hexagon".to_string(),
            artifacts: Artifacts::Both,
        }
    }
}

impl GenOptions {
    #[must_use]
    pub const fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    #[must_use]
    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = base_name.into();
        self
    }

    #[must_use]
    pub const fn with_artifacts(mut self, artifacts: Artifacts) -> Self {
        self.artifacts = artifacts;
        self
    }
}

/// Generated sources, fully assembled in memory.
#[derive(Clone, Debug, Default)]
pub struct Generated {
    pub lifter: Option<String>,
    pub text: Option<String>,
    /// Tags with a lifter function.
    pub lifted: usize,
    /// Tags with a tokenizer function.
    pub tokenized: usize,
}

/// Functions generated for one tag.
struct TagOutput {
    lift_fn: Option<String>,
    text_fn: Option<String>,
}

fn compile_tag(
    file: &FactsFile,
    normalizer: &Normalizer,
    facts: &TagFacts,
    artifacts: Artifacts,
) -> std::result::Result<TagOutput, TagError> {
    let lift_fn = if artifacts.lifter() && file.is_lifted(facts) {
        let body = lift(normalizer, facts)?;
        Some(gen_lift_fn(facts, &body))
    } else {
        None
    };
    let text_fn = if artifacts.text() && !facts.syntax.trim().is_empty() {
        let tokens = tokenize(facts)?;
        Some(gen_tokenize_fn(facts, &tokens))
    } else {
        None
    };
    trace!(
        tag = %facts.tag,
        lifted = lift_fn.is_some(),
        tokenized = text_fn.is_some(),
        "compiled tag"
    );
    Ok(TagOutput { lift_fn, text_fn })
}

/// Compile every tag of `file` and assemble the requested sources.
///
/// Tags are compiled in parallel. Function order and table order follow the
/// order of `file.tags`; when several tags fail, the earliest one is
/// reported.
///
/// # Errors
///
/// Returns [`EmitError::Tag`] for the first tag that fails to compile.
pub fn generate(file: &FactsFile, overrides: &Overrides, opts: &GenOptions) -> Result<Generated> {
    let start = Instant::now();
    let normalizer = Normalizer::new().map_err(EmitError::Rules)?;
    let tags: Vec<TagFacts> = file
        .tags
        .iter()
        .map(|t| overrides.apply(t).into_owned())
        .collect();
    info!(tags = tags.len(), jobs = opts.jobs, "generating");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs)
        .build()?;
    let results: Vec<_> = pool.install(|| {
        tags.par_iter()
            .map(|facts| compile_tag(file, &normalizer, facts, opts.artifacts))
            .collect()
    });

    let mut outputs = Vec::with_capacity(results.len());
    for (facts, result) in tags.iter().zip(results) {
        let output = result.map_err(|source| EmitError::Tag {
            tag: facts.tag.clone(),
            source,
        })?;
        outputs.push(output);
    }

    let mut generated = Generated::default();
    if opts.artifacts.lifter() {
        let entries: Vec<(&str, Option<&str>)> = tags
            .iter()
            .zip(&outputs)
            .map(|(t, o)| (t.tag.as_str(), o.lift_fn.as_deref()))
            .collect();
        generated.lifted = entries.iter().filter(|(_, f)| f.is_some()).count();
        generated.lifter = Some(gen_lifter_file(&entries));
        debug!(functions = generated.lifted, "assembled lifter source");
    }
    if opts.artifacts.text() {
        let entries: Vec<(&str, Option<&str>)> = tags
            .iter()
            .zip(&outputs)
            .map(|(t, o)| (t.tag.as_str(), o.text_fn.as_deref()))
            .collect();
        generated.tokenized = entries.iter().filter(|(_, f)| f.is_some()).count();
        generated.text = Some(gen_text_file(&entries));
        debug!(functions = generated.tokenized, "assembled tokenizer source");
    }

    info!(
        lifted = generated.lifted,
        tokenized = generated.tokenized,
        secs = start.elapsed().as_secs_f64(),
        "generated"
    );
    Ok(generated)
}
