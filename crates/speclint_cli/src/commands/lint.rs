//! Lint command - Lint package specifications.
//!
//! Inputs may be spec files, directories searched recursively, or the name
//! of a spec repository under the repos directory. Without inputs the
//! current directory is searched.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::info;

use speclint_lint::{LintOptions, LintSession};

use crate::config::{session_config, FileConfig, Overrides};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct LintArgs {
    /// Spec files, directories or spec repository names
    inputs: Vec<String>,

    /// Only run checks that do not fetch or build the source
    #[arg(long)]
    quick: bool,

    /// Only show errors (warnings are still counted)
    #[arg(long)]
    only_errors: bool,

    /// Only lint these platforms (comma separated)
    #[arg(long, value_delimiter = ',')]
    platforms: Vec<String>,

    /// Directory holding named spec repositories
    #[arg(long, env = "SPECLINT_REPOS_DIR")]
    repos_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum number of specs linted at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl LintArgs {
    fn options(&self) -> LintOptions {
        LintOptions {
            quick: self.quick,
            only_errors: self.only_errors,
            platforms: if self.platforms.is_empty() {
                None
            } else {
                Some(self.platforms.clone())
            },
        }
    }
}

pub async fn execute(args: LintArgs) -> Result<()> {
    let working_dir = std::env::current_dir().context("Failed to determine current directory")?;

    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let overrides = Overrides {
        repos_dir: args.repos_dir.clone(),
        concurrency: args.concurrency,
    };
    let config = session_config(&working_dir, file, overrides)?;
    info!(
        "Linting with concurrency {}{}",
        config.concurrency,
        if args.quick { " (quick)" } else { "" }
    );

    let session = LintSession::new(config);
    let outcome = session.run(&args.inputs, &args.options()).await?;

    match args.format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&outcome).context("Failed to serialize result")?;
            println!("{}", json);
        }
        OutputFormat::Text => println!("{}", outcome.report),
    }

    outcome.into_result()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Commands};
    use clap::Parser;
    use speclint_lint::LintError;

    fn lint_args(argv: &[&str]) -> LintArgs {
        let mut full = vec!["speclint", "lint"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Lint(args) => args,
            _ => panic!("expected lint command"),
        }
    }

    #[test]
    fn test_defaults() {
        let args = lint_args(&[]);
        assert!(args.inputs.is_empty());
        assert_eq!(args.format, OutputFormat::Text);
        let options = args.options();
        assert!(!options.quick);
        assert!(!options.only_errors);
        assert!(options.platforms.is_none());
    }

    #[test]
    fn test_flags() {
        let args = lint_args(&[
            "Bananas.pkgspec",
            "master",
            "--quick",
            "--only-errors",
            "--platforms",
            "ios,osx",
            "--concurrency",
            "2",
            "--format",
            "json",
        ]);
        assert_eq!(args.inputs, vec!["Bananas.pkgspec", "master"]);
        assert_eq!(args.concurrency, Some(2));
        assert_eq!(args.format, OutputFormat::Json);

        let options = args.options();
        assert!(options.quick);
        assert!(options.only_errors);
        assert_eq!(options.platforms, Some(vec!["ios".to_string(), "osx".to_string()]));
    }

    const NO_LICENSE_FILE: &str = r#"
name: Bananas
version: "0.0.1"
summary: A short description of Bananas.
homepage: https://bananas.example.org
license: MIT
authors: Banana Corp
source:
  git: https://bananas.example.org/bananas.git
  tag: "0.0.1"
source_files:
  ios: Classes
"#;

    /// Test a failing lint surfaces the informative error, with or without warnings shown.
    #[tokio::test]
    async fn test_failing_lint_is_informative() {
        let temp = tempfile::tempdir().unwrap();
        let spec = temp.path().join("Bananas.pkgspec");
        std::fs::write(&spec, NO_LICENSE_FILE).unwrap();
        let spec = spec.to_string_lossy().to_string();

        for extra in [None, Some("--only-errors")] {
            let mut argv = vec![spec.as_str(), "--quick"];
            argv.extend(extra);
            let err = execute(lint_args(&argv)).await.unwrap_err();
            match err.downcast_ref::<LintError>() {
                Some(LintError::Informative(report)) => {
                    assert!(report.contains("- ERROR | Missing license[:file] or [:text]"));
                    assert_eq!(report.contains("WARN"), extra.is_none());
                }
                other => panic!("expected informative error, got {:?}", other),
            }
        }
    }

    /// Test an unresolvable input is a configuration error.
    #[tokio::test]
    async fn test_unknown_input_is_configuration_error() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("trunk").to_string_lossy().to_string();
        let repos = temp.path().to_string_lossy().to_string();
        let args = lint_args(&[missing.as_str(), "--quick", "--repos-dir", repos.as_str()]);
        let err = execute(args).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<LintError>(), Some(LintError::Configuration(_))));
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["speclint", "lint", "--format", "xml"]).is_err());
    }
}
