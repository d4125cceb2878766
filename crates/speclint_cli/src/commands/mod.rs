//! CLI command definitions.
//!
//! This module defines the command structure for the speclint CLI.

use clap::{Parser, Subcommand};

pub mod lint;
pub mod rules;

/// speclint - package specification linter
#[derive(Parser)]
#[command(name = "speclint")]
#[command(version, about = "speclint - package specification linter")]
#[command(long_about = r#"
speclint checks package specifications (*.pkgspec) for metadata problems
and, unless --quick is given, fetches each spec's source to check that its
files exist and build.

COMMANDS:
  lint   → Lint spec files, directories or named spec repositories
  rules  → List the rule catalog

EXIT CODES:
  0 - All specs passed
  1 - General error
  2 - Invalid arguments or configuration
  3 - Validation failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "speclint=debug,info"
        } else if self.quiet {
            "error"
        } else {
            "speclint=info,warn"
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lint package specifications
    Lint(lint::LintArgs),

    /// List the lint rules
    Rules(rules::RulesArgs),
}
