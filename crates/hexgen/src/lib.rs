//! hexgen - Hexagon lifter and disassembly-tokenizer generator
//!
//! Reads a JSON facts file describing every instruction tag and writes two
//! host sources: a lifter with one function per tag, and a tokenizer that
//! renders instructions as disassembly text.
//!
//! # Example
//!
//! ```ignore
//! use hexgen::{GenOptions, generate_to_dir};
//!
//! let written = generate_to_dir("facts.json", "output/", &GenOptions::default())?;
//! ```

// Re-export from sub-crates
pub use hexgen_emit::{
    Artifacts, EmitError, GenOptions, GenProject, Generated, Override, Overrides, generate,
    token_line,
};
pub use hexgen_facts::{Attributes, FactsError, FactsFile, TagFacts};
pub use hexgen_ir::{DisplayToken, Effect, HexRegisterNamer, InsnContext, Token, render, resolve_all};
pub use hexgen_sem::{LiftedBody, Normalized, Normalizer, SemError, lift};
pub use hexgen_syntax::{SyntaxError, tokenize};

mod error;
pub use error::{Error, Result};

use std::path::{Path, PathBuf};

use tracing::info;

/// Read a facts file.
///
/// # Errors
///
/// Returns [`Error::Facts`] when the file cannot be read or parsed.
pub fn load_facts(path: impl AsRef<Path>) -> Result<FactsFile> {
    Ok(FactsFile::load(path)?)
}

/// Facts for `tag` with the standard overrides applied.
///
/// # Errors
///
/// Returns [`Error::UnknownTag`] when `file` has no such tag.
pub fn find_tag(file: &FactsFile, tag: &str) -> Result<TagFacts> {
    let facts = file
        .get(tag)
        .ok_or_else(|| Error::UnknownTag(tag.to_string()))?;
    Ok(Overrides::standard().apply(facts).into_owned())
}

/// Generate the sources for `facts_path` and write them under `output_dir`.
///
/// Nothing is written unless every tag compiles.
///
/// # Errors
///
/// Returns the facts error, the first failing tag, or the IO error of the
/// write.
pub fn generate_to_dir(
    facts_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    opts: &GenOptions,
) -> Result<Vec<PathBuf>> {
    let file = load_facts(facts_path)?;
    let generated = generate(&file, &Overrides::standard(), opts)?;
    let project = GenProject::new(output_dir, opts.base_name.clone());
    let written = project.write(&generated)?;
    info!(
        dir = %project.output_dir.display(),
        lifted = generated.lifted,
        tokenized = generated.tokenized,
        "wrote sources"
    );
    Ok(written)
}

/// Normalized semantics of one tag.
///
/// # Errors
///
/// Fails for an unknown tag or a semantics string the macro table rejects.
pub fn normalize_tag(file: &FactsFile, tag: &str) -> Result<Normalized> {
    let facts = find_tag(file, tag)?;
    Ok(Normalizer::new()?.normalize(&facts.semantics, &facts.attributes)?)
}

/// Lowered body of one tag.
///
/// # Errors
///
/// Fails for an unknown tag or semantics that cannot be lowered.
pub fn lift_tag(file: &FactsFile, tag: &str) -> Result<LiftedBody> {
    let facts = find_tag(file, tag)?;
    Ok(lift(&Normalizer::new()?, &facts)?)
}

/// Token stream of one tag.
///
/// # Errors
///
/// Fails for an unknown tag or a syntax string the grammar rejects.
pub fn tokenize_tag(file: &FactsFile, tag: &str) -> Result<Vec<Token>> {
    let facts = find_tag(file, tag)?;
    Ok(tokenize(&facts)?)
}
