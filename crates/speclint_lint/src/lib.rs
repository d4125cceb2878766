//! # speclint_lint
//!
//! Linting of package specifications.
//!
//! This crate provides:
//! - **Rule Catalog**: static whole-spec and per-platform rules
//! - **Analyzer**: runs the catalog over one spec, fetching and building its
//!   source unless in quick mode
//! - **Report Builder**: groups findings into a per-spec text report
//! - **Lint Session**: resolves inputs and lints many specs concurrently
//!
//! ## Example
//!
//! ```rust,ignore
//! use speclint_lint::{LintOptions, LintSession, SessionConfig};
//!
//! let session = LintSession::new(SessionConfig::new("."));
//! let options = LintOptions { quick: true, ..Default::default() };
//! let outcome = session.run(&["Bananas.pkgspec".to_string()], &options).await?;
//!
//! println!("{}", outcome.report);
//! ```

pub mod analyzer;
pub mod error;
pub mod finding;
pub mod report;
pub mod rules;
pub mod session;
pub mod sources;

pub use analyzer::{Analysis, Analyzer, AnalyzerOptions};
pub use error::{LintError, LintResult};
pub use finding::{Finding, Severity, SpecIdentity, Verdict};
pub use report::{FindingCounts, RenderOptions, RenderedSpec, ReportBuilder};
pub use rules::{catalog, Rule, RuleScope};
pub use session::{LintOptions, LintSession, SessionConfig, SessionOutcome, SessionSummary};
pub use sources::resolve_patterns;
