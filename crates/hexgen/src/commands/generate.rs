//! Generate command.

use std::path::Path;

use hexgen::GenOptions;
use tracing::{error, info};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS, OnlyArg};
use crate::terminal::{self, Spinner};

/// Handle the `generate` command.
pub fn cmd_generate(
    facts: &Path,
    output: &Path,
    base_name: &str,
    jobs: usize,
    only: OnlyArg,
    quiet: bool,
) -> i32 {
    info!(facts = %facts.display(), output = %output.display(), "generating");

    let options = GenOptions::default()
        .with_jobs(jobs)
        .with_base_name(base_name)
        .with_artifacts(only.into());

    let spinner = Spinner::new(format!("Generating from {}", facts.display()), quiet);
    match hexgen::generate_to_dir(facts, output, &options) {
        Ok(written) => {
            spinner.finish_with_success(&format!("Generated {} file(s)", written.len()));
            if !quiet {
                for path in &written {
                    terminal::path_output(path);
                }
            }
            EXIT_SUCCESS
        }
        Err(e) => {
            spinner.finish_with_failure("Generation failed");
            error!(error = %e, "generation failed");
            EXIT_FAILURE
        }
    }
}
