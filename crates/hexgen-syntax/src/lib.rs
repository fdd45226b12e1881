//! Hexagon assembly syntax to disassembly tokens.
//!
//! Each tag's syntax string (`Rd32=add(Rs32,Rt32)`) is parsed with its own
//! grammar and flattened into [`hexgen_ir::Token`]s. Register and immediate
//! operands stay symbolic and refer to decoded-instruction slots.

mod grammar;
mod placement;
mod scanner;
mod tokens;

pub use grammar::{Args, Assign, Call, CircBase, Cond, Exp, Operand, Reg, Value, parse};
pub use tokens::tokenize;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("{tag}: cannot parse syntax {text:?} at offset {position}")]
    Parse {
        tag: String,
        text: String,
        position: usize,
    },

    #[error("{tag}: register {text} has no operand slot")]
    UnknownRegister { tag: String, text: String },

    #[error("{tag}: register pair {text} must have a two-letter id and no half selector")]
    BadPair { tag: String, text: String },

    #[error("{tag}: cannot place immediate #{letter}: {reason}")]
    AmbiguousPlacement {
        tag: String,
        letter: char,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, SyntaxError>;
