//! Findings, spec identities and verdicts.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use speclint_spec::reader::{file_stem, LoadedSpec};

/// Rule id of the finding recorded when a spec cannot be loaded.
pub const LOAD_RULE_ID: &str = "load";
/// Rule id of the finding recorded when a source cannot be fetched.
pub const FETCH_RULE_ID: &str = "fetch";
/// Rule id of the finding recorded when a build cannot be run.
pub const BUILD_RULE_ID: &str = "build";

/// Finding severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    /// Label used in rendered reports.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
        }
    }
}

/// Which spec a report is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecIdentity {
    pub name: String,
    /// `None` when the spec could not be loaded.
    pub version: Option<String>,
    pub path: PathBuf,
    /// Platforms that were linted, in declaration order.
    pub platforms: Vec<String>,
}

impl SpecIdentity {
    pub fn from_loaded(loaded: &LoadedSpec, platforms: Vec<String>) -> Self {
        let name = if loaded.spec.name.trim().is_empty() {
            loaded.file_stem()
        } else {
            loaded.spec.name.clone()
        };
        Self {
            name,
            version: Some(loaded.spec.version.to_string()),
            path: loaded.path.clone(),
            platforms,
        }
    }

    /// Identity of a spec that failed to load, named after its file.
    pub fn unloaded(path: &Path) -> Self {
        Self {
            name: file_stem(path),
            version: None,
            path: path.to_path_buf(),
            platforms: Vec::new(),
        }
    }
}

impl fmt::Display for SpecIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version.as_deref() {
            Some(v) if !v.is_empty() => write!(f, "{} ({})", self.name, v),
            _ => write!(f, "{} (unknown)", self.name),
        }
    }
}

/// One rule outcome for a spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Name of the owning spec.
    pub spec: String,
    /// Platform scope; `None` for whole-spec findings.
    pub platform: Option<String>,
    pub severity: Severity,
    pub rule_id: String,
    pub message: String,
}

impl Finding {
    pub fn new(
        spec: impl Into<String>,
        severity: Severity,
        rule_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            spec: spec.into(),
            platform: None,
            severity,
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }

    pub fn error(spec: impl Into<String>, rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(spec, Severity::Error, rule_id, message)
    }

    pub fn warning(spec: impl Into<String>, rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(spec, Severity::Warning, rule_id, message)
    }

    /// Scope the finding to a platform.
    pub fn on_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Pass/fail outcome, decided by ERROR findings only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    /// Reduce a set of findings to a verdict.
    pub fn from_findings<'a>(findings: impl IntoIterator<Item = &'a Finding>) -> Self {
        if findings.into_iter().any(Finding::is_error) {
            Verdict::Fail
        } else {
            Verdict::Pass
        }
    }

    /// Combine verdicts: any failure fails the whole.
    pub fn all(verdicts: impl IntoIterator<Item = Verdict>) -> Self {
        if verdicts.into_iter().any(|v| v == Verdict::Fail) {
            Verdict::Fail
        } else {
            Verdict::Pass
        }
    }

    pub fn passed(&self) -> bool {
        *self == Verdict::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_ignores_warnings() {
        let warnings = vec![
            Finding::warning("A", "summary_present", "The summary is not meaningful"),
            Finding::warning("A", "authors_present", "Missing authors"),
        ];
        assert_eq!(Verdict::from_findings(&warnings), Verdict::Pass);

        let mut mixed = warnings.clone();
        mixed.push(Finding::error("A", "license_present", "Missing license[:file] or [:text]"));
        assert_eq!(Verdict::from_findings(&mixed), Verdict::Fail);
        assert_eq!(Verdict::from_findings(&Vec::<Finding>::new()), Verdict::Pass);
    }

    #[test]
    fn test_verdict_unaffected_by_dropping_warnings() {
        let findings = vec![
            Finding::warning("A", "summary_present", "w"),
            Finding::error("A", "name_matches_file", "e").on_platform("ios"),
        ];
        let errors_only: Vec<Finding> = findings.iter().filter(|f| f.is_error()).cloned().collect();
        assert_eq!(Verdict::from_findings(&findings), Verdict::from_findings(&errors_only));
    }

    #[test]
    fn test_combined_verdict() {
        assert_eq!(Verdict::all([Verdict::Pass, Verdict::Pass]), Verdict::Pass);
        assert_eq!(Verdict::all([Verdict::Pass, Verdict::Fail]), Verdict::Fail);
        assert!(Verdict::all(Vec::<Verdict>::new()).passed());
    }

    #[test]
    fn test_identity_display() {
        let loaded = LoadedSpec {
            path: PathBuf::from("Bananas.pkgspec"),
            spec: speclint_spec::Specification {
                name: "Bananas".into(),
                version: "0.0.1".into(),
                ..Default::default()
            },
        };
        assert_eq!(SpecIdentity::from_loaded(&loaded, vec![]).to_string(), "Bananas (0.0.1)");
        assert_eq!(
            SpecIdentity::unloaded(Path::new("/x/JSONKit.pkgspec")).to_string(),
            "JSONKit (unknown)"
        );
    }
}
