//! Semantics compiler: normalize, parse and lower instruction semantics.
//!
//! A semantics string goes through three stages:
//!
//! 1. [`normalize`] expands the pseudocode macro vocabulary into canonical
//!    calls and splits compound compare-jumps into two parts.
//! 2. [`parse`] turns each part into a statement list.
//! 3. [`lower`] rewrites the statements into effect-IR.
//!
//! [`lift`] runs all three for one tag and adds the operand declarations.

mod ast;
mod lexer;
mod lower;
mod macros;
mod normalize;
mod parser;

pub use ast::{Assign, BinOp, Expr, LogOp, RelOp, Stmt, UnOp};
pub use lexer::{Token, TokenKind, lex, lex_tokens};
pub use lower::{LiftedBody, LowerCtx, lift};
pub use macros::{MacroDef, MacroTable, PpKind, PpToken, pp_tokenize, render};
pub use normalize::{Normalized, Normalizer, Part, fixed_predicates, normalize};
pub use parser::{parse, parse_tokens};

use hexgen_facts::FactsError;
use thiserror::Error;

/// Semantics compilation errors.
#[derive(Error, Debug)]
pub enum SemError {
    #[error("unrecognized token '{text}' at {pos}")]
    Lex { text: String, pos: usize },
    #[error("parse error at {pos}: expected {expected}, found '{found}'")]
    Parse {
        pos: usize,
        expected: String,
        found: String,
    },
    #[error("unknown macro {0}")]
    UnknownMacro(String),
    #[error("{name} takes {expected} arguments, got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("{name}: {detail}")]
    Operand { name: String, detail: String },
    #[error("unbound operand {0}")]
    UnboundOperand(String),
    #[error("unsupported construct: {0}")]
    Unsupported(String),
    #[error("compound compare-jump without fPART1")]
    MissingPartOne,
    #[error("macro expansion failed: {0}")]
    Macro(String),
    #[error(transparent)]
    Facts(#[from] FactsError),
}

pub type Result<T> = std::result::Result<T, SemError>;
