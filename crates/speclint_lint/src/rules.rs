//! The rule catalog.
//!
//! Rules are plain data: an id, a severity, a scope and a check function.
//! Checks are pure; anything that needs the network or a toolchain is
//! gathered by the analyzer beforehand and handed in through
//! [`PlatformContext`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use speclint_runner::BuildOutput;
use speclint_spec::{stub_description, stub_summary, Specification, STUB_HOST};

use crate::finding::Severity;

/// Longest summary that does not draw a warning.
pub const MAX_SUMMARY_LENGTH: usize = 140;

/// What a rule looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleScope {
    WholeSpec,
    PerPlatform,
}

/// Input to whole-spec rules.
#[derive(Debug, Clone, Copy)]
pub struct SpecContext<'a> {
    pub spec: &'a Specification,
    /// File name of the spec without its extension.
    pub file_stem: &'a str,
}

/// Input to per-platform rules.
#[derive(Debug, Clone, Copy)]
pub struct PlatformContext<'a> {
    pub spec: &'a Specification,
    pub platform: &'a str,
    pub patterns: &'a [String],
    /// Files matched by `patterns` in the fetched source. Only set for fetch rules.
    pub files: Option<&'a [PathBuf]>,
    /// Outcome of building `files`, when a build ran.
    pub build: Option<&'a BuildOutput>,
}

type SpecCheck = fn(&SpecContext<'_>) -> Vec<String>;
type PlatformCheck = fn(&PlatformContext<'_>) -> Vec<String>;

#[derive(Clone, Copy)]
enum Check {
    Spec(SpecCheck),
    Platform(PlatformCheck),
}

/// A lint rule.
#[derive(Clone, Copy)]
pub struct Rule {
    pub id: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    /// Needs the fetched source, and possibly a build. Skipped in quick mode.
    pub requires_fetch: bool,
    check: Check,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("severity", &self.severity)
            .field("scope", &self.scope())
            .field("requires_fetch", &self.requires_fetch)
            .finish()
    }
}

impl Rule {
    pub fn scope(&self) -> RuleScope {
        match self.check {
            Check::Spec(_) => RuleScope::WholeSpec,
            Check::Platform(_) => RuleScope::PerPlatform,
        }
    }

    /// Messages for a whole-spec rule. Per-platform rules yield nothing here.
    pub fn check_spec(&self, ctx: &SpecContext<'_>) -> Vec<String> {
        match self.check {
            Check::Spec(check) => check(ctx),
            Check::Platform(_) => Vec::new(),
        }
    }

    /// Messages for a per-platform rule. Whole-spec rules yield nothing here.
    pub fn check_platform(&self, ctx: &PlatformContext<'_>) -> Vec<String> {
        match self.check {
            Check::Platform(check) => check(ctx),
            Check::Spec(_) => Vec::new(),
        }
    }
}

static CATALOG: &[Rule] = &[
    Rule {
        id: "name_matches_file",
        description: "The spec name equals its file name",
        severity: Severity::Error,
        requires_fetch: false,
        check: Check::Spec(name_matches_file),
    },
    Rule {
        id: "version_valid",
        description: "The version is a semantic version",
        severity: Severity::Error,
        requires_fetch: false,
        check: Check::Spec(version_valid),
    },
    Rule {
        id: "license_present",
        description: "A license file or license text is declared",
        severity: Severity::Error,
        requires_fetch: false,
        check: Check::Spec(license_present),
    },
    Rule {
        id: "license_type_present",
        description: "The license type is declared",
        severity: Severity::Warning,
        requires_fetch: false,
        check: Check::Spec(license_type_present),
    },
    Rule {
        id: "summary_present",
        description: "The summary is set and is not the generated placeholder",
        severity: Severity::Warning,
        requires_fetch: false,
        check: Check::Spec(summary_present),
    },
    Rule {
        id: "summary_short",
        description: "The summary fits in 140 characters",
        severity: Severity::Warning,
        requires_fetch: false,
        check: Check::Spec(summary_short),
    },
    Rule {
        id: "description_meaningful",
        description: "The description is not the generated placeholder",
        severity: Severity::Warning,
        requires_fetch: false,
        check: Check::Spec(description_meaningful),
    },
    Rule {
        id: "homepage_reachable_format",
        description: "The homepage is an absolute http(s) URL",
        severity: Severity::Warning,
        requires_fetch: false,
        check: Check::Spec(homepage_reachable_format),
    },
    Rule {
        id: "authors_present",
        description: "At least one author is declared",
        severity: Severity::Warning,
        requires_fetch: false,
        check: Check::Spec(authors_present),
    },
    Rule {
        id: "source_reference_valid",
        description: "The source has a URL and exactly one of tag, commit or branch",
        severity: Severity::Error,
        requires_fetch: false,
        check: Check::Spec(source_reference_valid),
    },
    Rule {
        id: "stub_placeholders_replaced",
        description: "Homepage and source no longer point at the placeholder host",
        severity: Severity::Warning,
        requires_fetch: false,
        check: Check::Spec(stub_placeholders_replaced),
    },
    Rule {
        id: "platform_patterns_declared",
        description: "Each platform declares source file patterns",
        severity: Severity::Error,
        requires_fetch: false,
        check: Check::Platform(platform_patterns_declared),
    },
    Rule {
        id: "source_files_present",
        description: "The source file patterns match files in the fetched source",
        severity: Severity::Error,
        requires_fetch: true,
        check: Check::Platform(source_files_present),
    },
    Rule {
        id: "build_succeeds",
        description: "The source files build without errors",
        severity: Severity::Error,
        requires_fetch: true,
        check: Check::Platform(build_succeeds),
    },
    Rule {
        id: "build_warnings",
        description: "The source files build without warnings",
        severity: Severity::Warning,
        requires_fetch: true,
        check: Check::Platform(build_warnings),
    },
];

/// All rules, in evaluation order.
pub fn catalog() -> &'static [Rule] {
    CATALOG
}

/// Look up a rule by id.
pub fn find(id: &str) -> Option<&'static Rule> {
    CATALOG.iter().find(|r| r.id == id)
}

fn name_matches_file(ctx: &SpecContext<'_>) -> Vec<String> {
    if ctx.spec.name == ctx.file_stem {
        Vec::new()
    } else {
        vec!["The name of the spec should match the name of the file".to_string()]
    }
}

fn version_valid(ctx: &SpecContext<'_>) -> Vec<String> {
    let version = &ctx.spec.version;
    let mut messages = Vec::new();
    if version.is_numeric() {
        messages.push(format!(
            "The version should be quoted (`{}` was read from an unquoted number)",
            version
        ));
    }
    if !ctx.spec.has_valid_version() {
        messages.push(format!(
            "The version of the spec should be a valid semantic version (`{}`)",
            version
        ));
    }
    messages
}

fn license_present(ctx: &SpecContext<'_>) -> Vec<String> {
    let license = &ctx.spec.license;
    if license.has_file() || license.has_text() {
        Vec::new()
    } else {
        vec!["Missing license[:file] or [:text]".to_string()]
    }
}

fn license_type_present(ctx: &SpecContext<'_>) -> Vec<String> {
    if ctx.spec.license.kind.trim().is_empty() {
        vec!["Missing license[:type]".to_string()]
    } else {
        Vec::new()
    }
}

fn summary_present(ctx: &SpecContext<'_>) -> Vec<String> {
    let summary = ctx.spec.summary.trim();
    if summary.is_empty() || summary == stub_summary(&ctx.spec.name) {
        vec!["The summary is not meaningful".to_string()]
    } else {
        Vec::new()
    }
}

fn summary_short(ctx: &SpecContext<'_>) -> Vec<String> {
    if ctx.spec.summary.trim().chars().count() > MAX_SUMMARY_LENGTH {
        vec![format!(
            "The summary should be short ({} characters max)",
            MAX_SUMMARY_LENGTH
        )]
    } else {
        Vec::new()
    }
}

fn description_meaningful(ctx: &SpecContext<'_>) -> Vec<String> {
    match ctx.spec.description.as_deref().map(str::trim) {
        Some(d) if d == stub_description(&ctx.spec.name) => {
            vec!["The description is not meaningful".to_string()]
        }
        _ => Vec::new(),
    }
}

fn homepage_reachable_format(ctx: &SpecContext<'_>) -> Vec<String> {
    let well_formed = Url::parse(ctx.spec.homepage.trim())
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false);
    if well_formed {
        Vec::new()
    } else {
        vec!["The homepage should be a well-formed URL".to_string()]
    }
}

fn authors_present(ctx: &SpecContext<'_>) -> Vec<String> {
    if ctx.spec.authors.is_empty() {
        vec!["Missing authors".to_string()]
    } else {
        Vec::new()
    }
}

fn source_reference_valid(ctx: &SpecContext<'_>) -> Vec<String> {
    let Some(source) = ctx.spec.source.as_ref() else {
        return vec!["Missing source".to_string()];
    };

    let mut messages = Vec::new();
    if source.git.trim().is_empty() {
        messages.push("Missing source[:git]".to_string());
    }
    match source.reference_count() {
        1 => {}
        0 => messages.push(
            "The source should specify one of [:tag], [:commit] or [:branch]".to_string(),
        ),
        _ => messages.push(
            "The source should specify only one of [:tag], [:commit] or [:branch]".to_string(),
        ),
    }
    messages
}

fn stub_placeholders_replaced(ctx: &SpecContext<'_>) -> Vec<String> {
    let mut messages = Vec::new();
    if points_at_stub_host(&ctx.spec.homepage) {
        messages.push("The homepage has not been updated from default".to_string());
    }
    if ctx
        .spec
        .source
        .as_ref()
        .map_or(false, |s| points_at_stub_host(&s.git))
    {
        messages.push("The source has not been updated from default".to_string());
    }
    messages
}

// URL hosts are normalized to lower case, so compare without case.
fn points_at_stub_host(value: &str) -> bool {
    Url::parse(value.trim())
        .ok()
        .and_then(|url| url.host_str().map(|h| h.eq_ignore_ascii_case(STUB_HOST)))
        .unwrap_or(false)
}

fn platform_patterns_declared(ctx: &PlatformContext<'_>) -> Vec<String> {
    if ctx.patterns.iter().all(|p| p.trim().is_empty()) {
        vec!["No source_files patterns declared".to_string()]
    } else {
        Vec::new()
    }
}

fn source_files_present(ctx: &PlatformContext<'_>) -> Vec<String> {
    match ctx.files {
        Some([]) => vec!["The source_files pattern did not match any file".to_string()],
        _ => Vec::new(),
    }
}

fn build_succeeds(ctx: &PlatformContext<'_>) -> Vec<String> {
    let Some(build) = ctx.build else {
        return Vec::new();
    };
    if build.success {
        return Vec::new();
    }

    let errors: Vec<String> = build.errors().map(|d| d.message.clone()).collect();
    if errors.is_empty() {
        match build.exit_code {
            Some(code) => vec![format!("The build failed (exit code {})", code)],
            None => vec!["The build failed".to_string()],
        }
    } else {
        errors
    }
}

fn build_warnings(ctx: &PlatformContext<'_>) -> Vec<String> {
    ctx.build
        .map(|build| build.warnings().map(|d| d.message.clone()).collect())
        .unwrap_or_default()
}
