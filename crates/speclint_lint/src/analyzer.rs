//! Per-spec analysis.
//!
//! Runs the rule catalog over one spec: whole-spec rules first, then each
//! selected platform. Unless in quick mode, the spec's source is fetched
//! once into a transient workspace, patterns are resolved against it and
//! the configured build runs before the fetch rules are evaluated.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use speclint_runner::{BuildInvoker, BuildRequest, SourceFetcher, SourceWorkspace};
use speclint_spec::{LoadedSpec, PlatformPatterns, SpecReader};

use crate::finding::{Finding, SpecIdentity, BUILD_RULE_ID, FETCH_RULE_ID, LOAD_RULE_ID};
use crate::rules::{catalog, PlatformContext, Rule, RuleScope, SpecContext};
use crate::sources::resolve_patterns;

/// Options for analyzing a single spec.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOptions {
    /// Skip every rule that needs the fetched source.
    pub quick: bool,
    /// Restrict per-platform rules to these platforms. Names the spec does
    /// not declare are ignored.
    pub platforms: Option<Vec<String>>,
}

impl AnalyzerOptions {
    pub fn quick() -> Self {
        Self {
            quick: true,
            platforms: None,
        }
    }

    pub fn with_platforms(mut self, platforms: Vec<String>) -> Self {
        self.platforms = Some(platforms);
        self
    }

    fn selects(&self, platform: &str) -> bool {
        self.platforms
            .as_ref()
            .map_or(true, |list| list.iter().any(|p| p == platform))
    }
}

/// Findings for one spec file.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub identity: SpecIdentity,
    pub findings: Vec<Finding>,
    /// Ids of rules that needed the fetched source but were skipped.
    pub not_run: Vec<String>,
}

/// Fetched source for one spec. The workspace is deleted when this is dropped.
enum Checkout {
    Pending,
    Ready {
        _workspace: SourceWorkspace,
        root: PathBuf,
    },
    Failed(String),
}

/// Analyzes specs against the rule catalog.
pub struct Analyzer {
    rules: &'static [Rule],
    fetcher: Arc<dyn SourceFetcher>,
    builder: Option<Arc<dyn BuildInvoker>>,
}

impl Analyzer {
    pub fn new(fetcher: Arc<dyn SourceFetcher>) -> Self {
        Self {
            rules: catalog(),
            fetcher,
            builder: None,
        }
    }

    /// Build each platform's files after fetching.
    pub fn with_builder(mut self, builder: Arc<dyn BuildInvoker>) -> Self {
        self.builder = Some(builder);
        self
    }

    /// Load the spec at `path` and analyze it. A spec that cannot be loaded
    /// yields a single `load` finding.
    pub async fn analyze_path(&self, path: &Path, options: &AnalyzerOptions) -> Analysis {
        match SpecReader::read_spec(path) {
            Ok(loaded) => {
                let platforms = loaded
                    .spec
                    .platforms()
                    .filter(|p| options.selects(&p.platform))
                    .map(|p| p.platform.clone())
                    .collect();
                let identity = SpecIdentity::from_loaded(&loaded, platforms);
                let findings = self.analyze(&loaded, options).await;
                let not_run = self.not_run(options, &identity.platforms);
                Analysis {
                    identity,
                    findings,
                    not_run,
                }
            }
            Err(e) => {
                warn!("Unable to load {:?}: {}", path, e);
                let identity = SpecIdentity::unloaded(path);
                let finding = Finding::error(
                    identity.name.clone(),
                    LOAD_RULE_ID,
                    format!("Unable to load spec: {}", e),
                );
                Analysis {
                    identity,
                    findings: vec![finding],
                    not_run: Vec::new(),
                }
            }
        }
    }

    /// Run the rule catalog over a loaded spec.
    pub async fn analyze(&self, loaded: &LoadedSpec, options: &AnalyzerOptions) -> Vec<Finding> {
        let spec = &loaded.spec;
        let file_stem = loaded.file_stem();
        let owner = if spec.name.trim().is_empty() {
            file_stem.clone()
        } else {
            spec.name.clone()
        };
        info!("Linting {} ({})", owner, if options.quick { "quick" } else { "deep" });

        let mut findings = Vec::new();
        let ctx = SpecContext {
            spec,
            file_stem: &file_stem,
        };
        for rule in self.rules.iter().filter(|r| r.scope() == RuleScope::WholeSpec) {
            for message in rule.check_spec(&ctx) {
                findings.push(Finding::new(&owner, rule.severity, rule.id, message));
            }
        }

        let mut checkout = Checkout::Pending;
        for platform in spec.platforms().filter(|p| options.selects(&p.platform)) {
            let static_ctx = PlatformContext {
                spec,
                platform: &platform.platform,
                patterns: &platform.patterns,
                files: None,
                build: None,
            };
            findings.extend(self.platform_findings(&owner, &static_ctx, false));

            if options.quick || platform.patterns.is_empty() {
                continue;
            }

            let root = match self.ensure_checkout(&mut checkout, loaded, &owner).await {
                Ok(root) => root,
                Err(reason) => {
                    findings.push(
                        Finding::error(
                            &owner,
                            FETCH_RULE_ID,
                            format!("Unable to fetch source: {}", reason),
                        )
                        .on_platform(&platform.platform),
                    );
                    continue;
                }
            };

            findings.extend(self.deep_platform(loaded, &owner, platform, &root).await);
        }

        debug!("{}: {} findings", owner, findings.len());
        findings
    }

    /// Rules that quick mode leaves out for the linted platforms.
    pub fn not_run(&self, options: &AnalyzerOptions, platforms: &[String]) -> Vec<String> {
        if !options.quick || platforms.is_empty() {
            return Vec::new();
        }
        self.rules
            .iter()
            .filter(|r| r.scope() == RuleScope::PerPlatform && r.requires_fetch)
            .map(|r| r.id.to_string())
            .collect()
    }

    async fn deep_platform(
        &self,
        loaded: &LoadedSpec,
        owner: &str,
        platform: &PlatformPatterns,
        root: &Path,
    ) -> Vec<Finding> {
        let mut findings = Vec::new();
        let files = resolve_patterns(root, &platform.patterns);

        let build = match &self.builder {
            Some(builder) if !files.is_empty() => {
                let request = BuildRequest {
                    workspace: root.to_path_buf(),
                    platform: platform.platform.clone(),
                    source_files: files.clone(),
                    requires_arc: loaded.spec.requires_arc(&platform.platform),
                };
                match builder.build(&request).await {
                    Ok(output) => Some(output),
                    Err(e) => {
                        warn!("Build of {} for {} did not run: {}", owner, platform.platform, e);
                        findings.push(
                            Finding::error(owner, BUILD_RULE_ID, format!("Unable to build: {}", e))
                                .on_platform(&platform.platform),
                        );
                        None
                    }
                }
            }
            _ => None,
        };

        let ctx = PlatformContext {
            spec: &loaded.spec,
            platform: &platform.platform,
            patterns: &platform.patterns,
            files: Some(files.as_slice()),
            build: build.as_ref(),
        };
        findings.extend(self.platform_findings(owner, &ctx, true));
        findings
    }

    fn platform_findings(
        &self,
        owner: &str,
        ctx: &PlatformContext<'_>,
        requires_fetch: bool,
    ) -> Vec<Finding> {
        self.rules
            .iter()
            .filter(|r| r.scope() == RuleScope::PerPlatform && r.requires_fetch == requires_fetch)
            .flat_map(|rule| {
                rule.check_platform(ctx).into_iter().map(move |message| {
                    Finding::new(owner, rule.severity, rule.id, message).on_platform(ctx.platform)
                })
            })
            .collect()
    }

    /// Fetch the spec's source on first use. Later calls reuse the outcome.
    async fn ensure_checkout(
        &self,
        checkout: &mut Checkout,
        loaded: &LoadedSpec,
        owner: &str,
    ) -> Result<PathBuf, String> {
        if let Checkout::Pending = checkout {
            *checkout = self.fetch(loaded, owner).await;
        }
        match checkout {
            Checkout::Ready { root, .. } => Ok(root.clone()),
            Checkout::Failed(reason) => Err(reason.clone()),
            Checkout::Pending => Err("source was not fetched".to_string()),
        }
    }

    async fn fetch(&self, loaded: &LoadedSpec, owner: &str) -> Checkout {
        let Some(source) = loaded.spec.source.as_ref() else {
            return Checkout::Failed("no source declared".to_string());
        };

        let workspace = match SourceWorkspace::create(owner) {
            Ok(workspace) => workspace,
            Err(e) => return Checkout::Failed(e.to_string()),
        };
        let root = workspace.checkout_dir();

        match self.fetcher.fetch(source, &root).await {
            Ok(()) => Checkout::Ready {
                _workspace: workspace,
                root,
            },
            Err(e) => {
                warn!("Fetching {} failed: {}", owner, e);
                Checkout::Failed(e.to_string())
            }
        }
    }
}
