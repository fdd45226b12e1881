//! Effect IR and display tokens for the Hexagon lifter generator.
//!
//! This crate holds pure data: register references, effect-IR expressions and
//! effects, and disassembly tokens. Nothing here knows about semantics strings
//! or syntax strings; those are lowered into these types by `hexgen-sem` and
//! `hexgen-syntax`.

mod effect;
mod expr;
mod reg;
mod token;

pub use effect::*;
pub use expr::*;
pub use reg::*;
pub use token::*;
