//! Error types for the lint module.

use thiserror::Error;

/// Result type alias for lint operations.
pub type LintResult<T> = Result<T, LintError>;

/// Errors surfaced by a lint session.
///
/// Rule violations, unparsable specs and fetch or build problems are
/// findings, not errors. Only a session that cannot start is an error.
#[derive(Error, Debug)]
pub enum LintError {
    /// No input could be resolved to a spec; no report is produced.
    #[error("{0}")]
    Configuration(String),

    /// Linting finished and at least one spec failed; carries the report.
    #[error("{0}")]
    Informative(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LintError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, LintError::Configuration(_))
    }
}
