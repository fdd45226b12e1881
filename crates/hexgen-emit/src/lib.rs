//! Host-source emission for the Hexagon lifter and tokenizer.
//!
//! The driver compiles every tag's semantics into a lifter function and every
//! tag's syntax into a tokenizer function, then writes two C++ sources with
//! dense opcode dispatch tables:
//! - `<base>_il.cc` with `lift_<tag>` functions and `opcode_liftptr`
//! - `<base>_text.cc` with `tokenize_<tag>` functions and `opcode_textptr`

mod dispatch;
mod driver;
mod lifter;
mod overrides;
mod project;
mod tokens;

pub use dispatch::gen_dispatch_table;
pub use driver::{Artifacts, GenOptions, Generated, generate};
pub use lifter::{gen_lift_fn, gen_lifter_file};
pub use overrides::{Override, Overrides};
pub use project::GenProject;
pub use tokens::{gen_text_file, gen_tokenize_fn, token_line};

use hexgen_sem::SemError;
use hexgen_syntax::SyntaxError;
use thiserror::Error;

/// Failure while compiling one tag.
#[derive(Error, Debug)]
pub enum TagError {
    #[error("semantics: {0}")]
    Sem(#[from] SemError),
    #[error("syntax: {0}")]
    Syntax(#[from] SyntaxError),
}

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("tag {tag}: {source}")]
    Tag {
        tag: String,
        #[source]
        source: TagError,
    },
    #[error("macro rules: {0}")]
    Rules(SemError),
    #[error("thread pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl EmitError {
    /// Tag the failure belongs to, if any.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Tag { tag, .. } => Some(tag),
            Self::Rules(_) | Self::Pool(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EmitError>;
