//! Error types for the runner module.

use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur while fetching sources or invoking builds.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Tool not available: {0}")]
    ToolNotFound(String),

    #[error("Invalid source: {0}")]
    InvalidSource(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Build failed: {0}")]
    BuildFailed(String),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
