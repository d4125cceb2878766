//! speclint CLI - Main entry point.
//!
//! Exit codes:
//! - 0: All specs passed
//! - 1: General error
//! - 2: Invalid arguments or configuration
//! - 3: Validation failure

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use speclint_lint::LintError;

mod commands;
mod config;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only the report.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.default_log_filter()));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let result = match cli.command {
        Commands::Lint(args) => commands::lint::execute(args).await,
        Commands::Rules(args) => commands::rules::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            // A failed lint has already printed its report.
            if exit_code != ExitCodes::VALIDATION_FAILURE {
                eprintln!("error: {:#}", e);
            }
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<LintError>() {
        Some(LintError::Informative(_)) => ExitCodes::VALIDATION_FAILURE,
        Some(LintError::Configuration(_)) => ExitCodes::INVALID_ARGS,
        Some(LintError::Io(_)) => ExitCodes::GENERAL_ERROR,
        None if e.downcast_ref::<config::ConfigError>().is_some() => ExitCodes::INVALID_ARGS,
        None => ExitCodes::GENERAL_ERROR,
    }
}
