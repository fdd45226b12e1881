//! Single-tag inspection commands: lift, tokens, normalize.

use std::path::Path;

use hexgen::{FactsFile, token_line};
use tracing::error;

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal;

/// Load `facts` and print the lines produced by `show` for `tag`.
fn inspect(
    facts: &Path,
    tag: &str,
    what: &str,
    show: impl FnOnce(&FactsFile) -> hexgen::Result<Vec<String>>,
) -> i32 {
    let lines = hexgen::load_facts(facts).and_then(|file| show(&file));
    match lines {
        Ok(lines) => {
            terminal::header(&format!("{tag} ({what})"));
            for line in lines {
                println!("{line}");
            }
            EXIT_SUCCESS
        }
        Err(e) => {
            terminal::error(&format!("{tag}: {e}"));
            error!(tag, error = %e, "{what} failed");
            EXIT_FAILURE
        }
    }
}

/// Handle the `lift` command.
pub fn cmd_lift(facts: &Path, tag: &str) -> i32 {
    inspect(facts, tag, "effects", |file| {
        let body = hexgen::lift_tag(file, tag)?;
        Ok(body.effects().iter().map(ToString::to_string).collect())
    })
}

/// Handle the `tokens` command.
pub fn cmd_tokens(facts: &Path, tag: &str) -> i32 {
    inspect(facts, tag, "tokens", |file| {
        let tokens = hexgen::tokenize_tag(file, tag)?;
        Ok(tokens.iter().map(token_line).collect())
    })
}

/// Handle the `normalize` command.
pub fn cmd_normalize(facts: &Path, tag: &str) -> i32 {
    inspect(facts, tag, "normalized", |file| {
        let normalized = hexgen::normalize_tag(file, tag)?;
        Ok(normalized
            .parts
            .iter()
            .enumerate()
            .map(|(i, part)| format!("part{}: {}", i + 1, part.text))
            .collect())
    })
}
