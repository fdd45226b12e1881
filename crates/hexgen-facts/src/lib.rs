//! Per-tag instruction facts for the Hexagon lifter generator.
//!
//! Facts are the externally supplied inputs for one instruction tag: its
//! syntax and semantics strings, its attribute set and its operand lists.
//! Operand bindings are derived from them once per tag and then shared,
//! read-only, by the semantics lowering and the syntax tokenizer.

mod attrs;
mod binding;
mod facts;
mod operand;

pub use attrs::*;
pub use binding::*;
pub use facts::*;
pub use operand::*;

use thiserror::Error;

/// Facts loading and binding errors.
#[derive(Error, Debug)]
pub enum FactsError {
    #[error("unsupported operand {class}{id} ({what})")]
    UnsupportedOperand {
        class: char,
        id: String,
        what: &'static str,
    },
    #[error("invalid facts JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FactsError>;
