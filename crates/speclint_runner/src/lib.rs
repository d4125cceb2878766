//! # speclint_runner
//!
//! Side-effecting collaborators used by deep linting.
//!
//! # Features
//!
//! - **Source Fetcher**: check out a spec's declared git source
//! - **Build Invoker**: run an external build against the checkout and
//!   collect compiler diagnostics
//! - **Source Workspace**: per-spec transient directory, deleted on drop
//! - **Mocks**: call-capturing fetcher and builder for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use speclint_runner::{GitFetcher, SourceFetcher, SourceWorkspace};
//! use speclint_spec::Source;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let workspace = SourceWorkspace::create("Bananas")?;
//!     let fetcher = GitFetcher::new(Duration::from_secs(120));
//!     let source = Source::tagged("https://github.com/example/Bananas.git", "0.0.1");
//!     fetcher.fetch(&source, &workspace.checkout_dir()).await?;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod error;
pub mod fetcher;
pub mod mock;
pub mod process;
pub mod workspace;

pub use builder::{
    parse_diagnostics, BuildConfig, BuildInvoker, BuildOutput, BuildRequest, CommandBuilder,
    Diagnostic, DiagnosticLevel,
};
pub use error::{RunnerError, RunnerResult};
pub use fetcher::{GitFetcher, SourceFetcher};
pub use mock::{FetchCall, MockBuilder, MockFetcher};
pub use process::{run_command, CommandOutput};
pub use workspace::SourceWorkspace;
