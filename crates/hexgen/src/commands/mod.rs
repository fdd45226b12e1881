//! Command implementations.

mod generate;
mod inspect;

use crate::cli::{Cli, Commands};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Generate { .. } => handle_generate(cli),
        Commands::Lift { facts, tag } => inspect::cmd_lift(facts, tag),
        Commands::Tokens { facts, tag } => inspect::cmd_tokens(facts, tag),
        Commands::Normalize { facts, tag } => inspect::cmd_normalize(facts, tag),
    }
}

fn handle_generate(cli: &Cli) -> i32 {
    let Commands::Generate {
        facts,
        output,
        base_name,
        jobs,
        only,
    } = &cli.command
    else {
        unreachable!("generate command variant mismatch");
    };

    generate::cmd_generate(facts, output, base_name, *jobs, *only, cli.quiet)
}
