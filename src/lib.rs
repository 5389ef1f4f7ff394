pub mod commands;
pub mod data;
pub mod errors;
pub mod models;
pub mod utils;

use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::errors::PipelineError;

/// Process exit status for a runtime failure.
pub const EXIT_FAILURE: u8 = 1;
/// Process exit status when the base directory does not exist.
pub const EXIT_BASE_DIR_MISSING: u8 = 3;

/// Map a failed run to its exit status.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::BaseDirMissing(_)) => EXIT_BASE_DIR_MISSING,
        _ => EXIT_FAILURE,
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

pub fn run() -> ExitCode {
    let cli = commands::Cli::parse();
    init_tracing(cli.verbose);

    info!("Starting day-shard");
    match commands::execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes() {
        let missing = anyhow::Error::new(PipelineError::BaseDirMissing(PathBuf::from("x")));
        assert_eq!(exit_code(&missing), EXIT_BASE_DIR_MISSING);
        let other = anyhow::Error::new(PipelineError::Io("boom".into())).context("split");
        assert_eq!(exit_code(&other), EXIT_FAILURE);
    }
}
