//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use hexgen::Artifacts;

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "hexgen")]
#[command(about = "Hexagon lifter generator - compiles instruction facts to host sources")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default tracing directive for the chosen verbosity.
    pub const fn log_directive(&self) -> &'static str {
        if self.verbose {
            "hexgen=debug"
        } else if self.quiet {
            "hexgen=error"
        } else {
            "hexgen=info"
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the lifter and tokenizer sources
    Generate {
        /// Input facts file (JSON)
        #[arg(value_name = "FACTS")]
        facts: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Base name of the generated files
        #[arg(long = "base", default_value = "hexagon")]
        base_name: String,

        /// Number of parallel jobs (0 = auto)
        #[arg(short = 'j', long, default_value = "0")]
        jobs: usize,

        /// Which sources to generate
        #[arg(long, value_enum, default_value = "both")]
        only: OnlyArg,
    },

    /// Print the lowered effects of one tag
    Lift {
        #[arg(value_name = "FACTS")]
        facts: PathBuf,
        tag: String,
    },

    /// Print the disassembly tokens of one tag
    Tokens {
        #[arg(value_name = "FACTS")]
        facts: PathBuf,
        tag: String,
    },

    /// Print the normalized semantics of one tag
    Normalize {
        #[arg(value_name = "FACTS")]
        facts: PathBuf,
        tag: String,
    },
}

/// Sources to generate.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OnlyArg {
    /// Lifter only
    Lift,
    /// Tokenizer only
    Text,
    /// Both sources
    Both,
}

impl From<OnlyArg> for Artifacts {
    fn from(arg: OnlyArg) -> Self {
        match arg {
            OnlyArg::Lift => Self::Lift,
            OnlyArg::Text => Self::Text,
            OnlyArg::Both => Self::Both,
        }
    }
}
