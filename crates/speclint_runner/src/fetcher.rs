//! Source fetching.
//!
//! Deep linting needs the spec's declared source on disk. The default
//! fetcher shells out to the git CLI; tests use [`crate::MockFetcher`].

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use speclint_spec::{GitReference, Source};

use crate::error::{RunnerError, RunnerResult};
use crate::process::{run_command, CommandOutput};

/// Fetches a declared source into a destination directory.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Check out `source` into `destination`, which must not exist yet or be empty.
    async fn fetch(&self, source: &Source, destination: &Path) -> RunnerResult<()>;
}

/// Fetcher backed by the `git` command line tool.
#[derive(Debug, Clone)]
pub struct GitFetcher {
    program: String,
    timeout: Duration,
}

impl GitFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "git".to_string(),
            timeout,
        }
    }

    /// Use a different git executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    async fn git(&self, args: &[&str], cwd: Option<&Path>) -> RunnerResult<CommandOutput> {
        let mut command = Command::new(&self.program);
        command.args(args).env("GIT_TERMINAL_PROMPT", "0");
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = run_command(command, self.timeout).await?;
        if !output.success() {
            let stderr = output.stderr.trim();
            let reason = if stderr.is_empty() {
                format!("git {} exited with {:?}", args.first().unwrap_or(&""), output.exit_code)
            } else {
                stderr.lines().last().unwrap_or(stderr).to_string()
            };
            return Err(RunnerError::FetchFailed(reason));
        }
        Ok(output)
    }
}

#[async_trait]
impl SourceFetcher for GitFetcher {
    async fn fetch(&self, source: &Source, destination: &Path) -> RunnerResult<()> {
        let url = source.git.trim();
        if url.is_empty() {
            return Err(RunnerError::InvalidSource("no git URL declared".to_string()));
        }
        let reference = source.reference().ok_or_else(|| {
            RunnerError::InvalidSource("expected exactly one of tag, commit or branch".to_string())
        })?;

        info!("Fetching {} ({}) into {:?}", url, reference, destination);
        let dest = destination.to_string_lossy().to_string();

        match &reference {
            GitReference::Tag(name) | GitReference::Branch(name) => {
                self.git(
                    &["clone", "--quiet", "--depth", "1", "--branch", name.as_str(), "--", url, dest.as_str()],
                    None,
                )
                .await?;
            }
            GitReference::Commit(sha) => {
                self.git(&["clone", "--quiet", "--no-checkout", "--", url, dest.as_str()], None)
                    .await?;
                self.git(&["checkout", "--quiet", sha.as_str()], Some(destination)).await?;
            }
        }

        debug!("Fetched {} at {}", url, reference);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rejects_source_without_reference() {
        let temp = tempdir().unwrap();
        let fetcher = GitFetcher::new(Duration::from_secs(5));
        let source = Source {
            git: "https://example.com/x.git".into(),
            ..Default::default()
        };

        let err = fetcher.fetch(&source, &temp.path().join("src")).await.unwrap_err();
        assert!(matches!(err, RunnerError::InvalidSource(_)));
    }

    #[tokio::test]
    async fn test_rejects_source_without_url() {
        let temp = tempdir().unwrap();
        let fetcher = GitFetcher::new(Duration::from_secs(5));
        let source = Source::tagged("  ", "1.0");

        let err = fetcher.fetch(&source, &temp.path().join("src")).await.unwrap_err();
        assert!(matches!(err, RunnerError::InvalidSource(_)));
    }

    #[tokio::test]
    async fn test_missing_git_binary() {
        let temp = tempdir().unwrap();
        let fetcher =
            GitFetcher::new(Duration::from_secs(5)).with_program("speclint-no-such-git");
        let source = Source::tagged("https://example.com/x.git", "1.0");

        let err = fetcher.fetch(&source, &temp.path().join("src")).await.unwrap_err();
        assert!(matches!(err, RunnerError::ToolNotFound(_)));
    }
}
