//! Mock fetcher and builder for testing.
//!
//! Provides configurable implementations of [`SourceFetcher`] and
//! [`BuildInvoker`] that never touch the network or a toolchain.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use speclint_spec::Source;

use crate::builder::{BuildInvoker, BuildOutput, BuildRequest};
use crate::error::{RunnerError, RunnerResult};
use crate::fetcher::SourceFetcher;

/// Captured fetch call information for verification.
#[derive(Debug, Clone)]
pub struct FetchCall {
    pub git: String,
    pub destination: PathBuf,
}

/// Mock source fetcher.
///
/// On success it materializes the configured files below the destination,
/// standing in for a checkout.
#[derive(Clone, Default)]
pub struct MockFetcher {
    /// Files written into every checkout (relative path, contents).
    files: Arc<RwLock<Vec<(String, String)>>>,
    /// Repository URLs whose fetch fails, with the failure message.
    failures: Arc<RwLock<Vec<(String, String)>>>,
    /// Failure applied to every fetch.
    simulate_failure: Arc<RwLock<Option<String>>>,
    captured_calls: Arc<RwLock<Vec<FetchCall>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file that every successful checkout contains.
    pub fn with_file(self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.files.write().push((path.into(), contents.into()));
        self
    }

    /// Fail fetches of one repository URL.
    pub fn fail_for(self, git: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.write().push((git.into(), message.into()));
        self
    }

    /// Fail every fetch.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<FetchCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }
}

#[async_trait]
impl SourceFetcher for MockFetcher {
    async fn fetch(&self, source: &Source, destination: &Path) -> RunnerResult<()> {
        self.captured_calls.write().push(FetchCall {
            git: source.git.clone(),
            destination: destination.to_path_buf(),
        });

        if let Some(message) = self.simulate_failure.read().clone() {
            return Err(RunnerError::FetchFailed(message));
        }
        let failure = self
            .failures
            .read()
            .iter()
            .find(|(git, _)| *git == source.git)
            .map(|(_, message)| message.clone());
        if let Some(message) = failure {
            return Err(RunnerError::FetchFailed(message));
        }

        std::fs::create_dir_all(destination)?;
        let files = self.files.read().clone();
        for (relative, contents) in files {
            let path = destination.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, contents)?;
        }
        Ok(())
    }
}

/// Mock build invoker.
#[derive(Clone)]
pub struct MockBuilder {
    output: Arc<RwLock<BuildOutput>>,
    simulate_failure: Arc<RwLock<Option<String>>>,
    captured_requests: Arc<RwLock<Vec<BuildRequest>>>,
}

impl Default for MockBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBuilder {
    /// A builder whose builds succeed cleanly.
    pub fn new() -> Self {
        Self {
            output: Arc::new(RwLock::new(BuildOutput::succeeded())),
            simulate_failure: Arc::new(RwLock::new(None)),
            captured_requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Return `output` from every build.
    pub fn with_output(self, output: BuildOutput) -> Self {
        *self.output.write() = output;
        self
    }

    /// Make every build fail to run.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    pub fn get_requests(&self) -> Vec<BuildRequest> {
        self.captured_requests.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.captured_requests.read().len()
    }
}

#[async_trait]
impl BuildInvoker for MockBuilder {
    async fn build(&self, request: &BuildRequest) -> RunnerResult<BuildOutput> {
        self.captured_requests.write().push(request.clone());
        if let Some(message) = self.simulate_failure.read().clone() {
            return Err(RunnerError::BuildFailed(message));
        }
        Ok(self.output.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_mock_fetcher_materializes_files() {
        let temp = tempdir().unwrap();
        let fetcher = MockFetcher::new().with_file("Classes/A.m", "int a;");
        let dest = temp.path().join("source");

        fetcher
            .fetch(&Source::tagged("https://example.com/a.git", "1.0"), &dest)
            .await
            .unwrap();

        assert!(dest.join("Classes/A.m").exists());
        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(fetcher.get_calls()[0].git, "https://example.com/a.git");
    }

    #[tokio::test]
    async fn test_mock_fetcher_failure_per_url() {
        let temp = tempdir().unwrap();
        let fetcher = MockFetcher::new().fail_for("https://example.com/down.git", "unreachable");

        let err = fetcher
            .fetch(&Source::tagged("https://example.com/down.git", "1.0"), temp.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unreachable"));

        fetcher
            .fetch(&Source::tagged("https://example.com/up.git", "1.0"), temp.path())
            .await
            .unwrap();
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_builder_records_requests() {
        let builder = MockBuilder::new().with_output(BuildOutput::failed(Vec::new()));
        let request = BuildRequest {
            workspace: PathBuf::from("/tmp/x"),
            platform: "ios".into(),
            source_files: vec![PathBuf::from("A.m")],
            requires_arc: true,
        };

        let output = builder.build(&request).await.unwrap();
        assert!(!output.success);
        assert_eq!(builder.get_requests(), vec![request]);
    }
}
