//! Lint sessions: resolve inputs, analyze specs concurrently, combine reports.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use speclint_runner::{BuildConfig, BuildInvoker, CommandBuilder, GitFetcher, SourceFetcher};
use speclint_spec::SpecReader;

use crate::analyzer::{Analyzer, AnalyzerOptions};
use crate::error::{LintError, LintResult};
use crate::finding::Verdict;
use crate::report::{FindingCounts, RenderOptions, RenderedSpec, ReportBuilder};

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(300);

/// Everything a session needs to know about its environment.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Relative inputs are resolved here; also searched when no input is given.
    pub working_dir: PathBuf,
    /// Directory holding named spec repositories.
    pub repos_dir: Option<PathBuf>,
    /// Maximum number of specs analyzed at once.
    pub concurrency: usize,
    pub fetch_timeout: Duration,
    /// Build command for deep linting. Without it, no build runs.
    pub build: Option<BuildConfig>,
}

impl SessionConfig {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            repos_dir: None,
            concurrency: DEFAULT_CONCURRENCY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            build: None,
        }
    }

    pub fn with_repos_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.repos_dir = Some(dir.into());
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_build(mut self, build: BuildConfig) -> Self {
        self.build = Some(build);
        self
    }
}

/// Per-run lint options.
#[derive(Debug, Clone, Default)]
pub struct LintOptions {
    pub quick: bool,
    pub only_errors: bool,
    pub platforms: Option<Vec<String>>,
}

impl LintOptions {
    fn analyzer_options(&self) -> AnalyzerOptions {
        AnalyzerOptions {
            quick: self.quick,
            platforms: self.platforms.clone(),
        }
    }

    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            only_errors: self.only_errors,
        }
    }
}

/// Totals across all specs of a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSummary {
    pub total_specs: usize,
    pub failed_specs: usize,
    pub errors: usize,
    pub warnings: usize,
}

/// Outcome of a completed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub verdict: Verdict,
    pub summary: SessionSummary,
    pub specs: Vec<RenderedSpec>,
    /// The combined text report, specs in input order followed by a footer.
    pub report: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl SessionOutcome {
    pub fn passed(&self) -> bool {
        self.verdict.passed()
    }

    /// `Err(LintError::Informative(report))` when any spec failed.
    pub fn into_result(self) -> LintResult<SessionOutcome> {
        if self.passed() {
            Ok(self)
        } else {
            Err(LintError::Informative(self.report))
        }
    }
}

/// A lint session over one or more inputs.
pub struct LintSession {
    config: SessionConfig,
    analyzer: Analyzer,
}

impl LintSession {
    /// Session using git for fetching and the configured build command, if any.
    pub fn new(config: SessionConfig) -> Self {
        let fetcher: Arc<dyn SourceFetcher> = Arc::new(GitFetcher::new(config.fetch_timeout));
        let builder = config
            .build
            .clone()
            .map(|build| Arc::new(CommandBuilder::new(build)) as Arc<dyn BuildInvoker>);
        Self::with_collaborators(config, fetcher, builder)
    }

    /// Session with explicit fetcher and builder.
    pub fn with_collaborators(
        config: SessionConfig,
        fetcher: Arc<dyn SourceFetcher>,
        builder: Option<Arc<dyn BuildInvoker>>,
    ) -> Self {
        let mut analyzer = Analyzer::new(fetcher);
        if let Some(builder) = builder {
            analyzer = analyzer.with_builder(builder);
        }
        Self { config, analyzer }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Lint the given inputs. Only unresolvable inputs are errors; everything
    /// found while linting is reported in the outcome.
    pub async fn run(&self, inputs: &[String], options: &LintOptions) -> LintResult<SessionOutcome> {
        let started_at = Utc::now();
        let paths = self.resolve_inputs(inputs)?;
        info!("Linting {} spec(s)", paths.len());

        let analyzer_options = options.analyzer_options();
        let render_options = options.render_options();
        let specs: Vec<RenderedSpec> = stream::iter(paths.iter())
            .map(|path| {
                let analyzer_options = &analyzer_options;
                async move {
                    let analysis = self.analyzer.analyze_path(path, analyzer_options).await;
                    ReportBuilder::render(&analysis.identity, &analysis.findings, &render_options)
                        .with_not_run(analysis.not_run)
                }
            })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut counts = FindingCounts::default();
        for spec in &specs {
            counts.add(spec.counts);
        }
        let summary = SessionSummary {
            total_specs: specs.len(),
            failed_specs: specs.iter().filter(|s| !s.verdict.passed()).count(),
            errors: counts.errors,
            warnings: counts.warnings,
        };
        let verdict = Verdict::all(specs.iter().map(|s| s.verdict));
        let report = combine_report(&specs, &summary);

        debug!(
            "Session finished: {} of {} specs failed",
            summary.failed_specs, summary.total_specs
        );
        Ok(SessionOutcome {
            verdict,
            summary,
            specs,
            report,
            started_at,
            completed_at: Utc::now(),
        })
    }

    /// Turn inputs into spec paths, in input order.
    pub fn resolve_inputs(&self, inputs: &[String]) -> LintResult<Vec<PathBuf>> {
        let paths = if inputs.is_empty() {
            let dir = &self.config.working_dir;
            let found = SpecReader::discover_shallow(dir).map_err(|e| {
                LintError::Configuration(format!("Unable to search {}: {}", dir.display(), e))
            })?;
            if found.is_empty() {
                return Err(LintError::Configuration(format!(
                    "No specs found in {}",
                    dir.display()
                )));
            }
            found
        } else {
            let mut paths = Vec::new();
            for input in inputs {
                paths.extend(self.resolve_input(input)?);
            }
            paths
        };

        if paths.is_empty() {
            return Err(LintError::Configuration(format!(
                "No specs found in {}",
                inputs.join(", ")
            )));
        }
        Ok(paths)
    }

    fn resolve_input(&self, input: &str) -> LintResult<Vec<PathBuf>> {
        let path = self.config.working_dir.join(input);
        if path.is_file() {
            return Ok(vec![path]);
        }
        if path.is_dir() {
            return discover(&path);
        }
        if let Some(repos_dir) = &self.config.repos_dir {
            let repo = repos_dir.join(input);
            if repo.is_dir() {
                debug!("Resolved '{}' to spec repository {:?}", input, repo);
                return discover(&repo);
            }
        }
        Err(LintError::Configuration(format!(
            "Unable to find a spec repository or spec file named `{}`",
            input
        )))
    }
}

fn discover(dir: &Path) -> LintResult<Vec<PathBuf>> {
    SpecReader::discover(dir)
        .map_err(|e| LintError::Configuration(format!("Unable to search {}: {}", dir.display(), e)))
}

fn combine_report(specs: &[RenderedSpec], summary: &SessionSummary) -> String {
    let mut report = String::new();
    for spec in specs {
        report.push_str(&spec.text);
        report.push_str("\n\n");
    }

    if summary.failed_specs == 0 {
        let noun = if summary.total_specs == 1 { "spec" } else { "specs" };
        report.push_str(&format!("{} {} passed validation.", summary.total_specs, noun));
    } else {
        report.push_str(&format!(
            "[!] {} out of {} specs failed validation.",
            summary.failed_specs, summary.total_specs
        ));
    }
    report
}
