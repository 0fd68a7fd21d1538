//! Toolbench CLI

use std::process::ExitCode;

use tracing::error;

use crate::cli::Cli;

mod cli;

/// Toolbench CLI entry point
#[tokio::main]
pub async fn main() -> ExitCode {
    let cli = match Cli::load() {
        Ok(cli) => cli,
        Err(error) => {
            // clap renders help, version and usage errors itself
            _ = error.print();

            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(error) = cli::logging::init(&cli.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized, must use eprintln for setup errors"
        )]
        {
            eprintln!("Logging error: {error}");
        }

        return ExitCode::FAILURE;
    }

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(source) => {
            error!(%source, "command failed");

            #[expect(clippy::print_stderr, reason = "final error report to the user")]
            {
                eprintln!("{source}");
            }

            ExitCode::FAILURE
        }
    }
}
