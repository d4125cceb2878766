//! Rendering findings into a per-spec report.

use serde::{Deserialize, Serialize};

use crate::finding::{Finding, Severity, SpecIdentity, Verdict};

/// Display options. They never change the verdict.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Leave WARN lines out of the text.
    pub only_errors: bool,
}

/// Number of findings by severity, including those hidden from the text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingCounts {
    pub errors: usize,
    pub warnings: usize,
}

impl FindingCounts {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let errors = findings.iter().filter(|f| f.is_error()).count();
        Self {
            errors,
            warnings: findings.len() - errors,
        }
    }

    pub fn add(&mut self, other: FindingCounts) {
        self.errors += other.errors;
        self.warnings += other.warnings;
    }
}

/// Report for one spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedSpec {
    pub identity: SpecIdentity,
    pub verdict: Verdict,
    pub counts: FindingCounts,
    pub findings: Vec<Finding>,
    /// Rules skipped because quick mode does not fetch the source.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_run: Vec<String>,
    #[serde(skip)]
    pub text: String,
}

impl RenderedSpec {
    /// Note rules that were not run. Verdict and counts are unchanged.
    pub fn with_not_run(mut self, rule_ids: Vec<String>) -> Self {
        if !rule_ids.is_empty() {
            self.text.push_str("\n  - NOTE  | Not run in quick mode: ");
            self.text.push_str(&rule_ids.join(", "));
        }
        self.not_run = rule_ids;
        self
    }
}

/// Builds per-spec reports.
pub struct ReportBuilder;

impl ReportBuilder {
    /// Render the findings of one spec.
    ///
    /// ```text
    /// Bananas (1.0.0)
    ///   - WARN  | The summary is not meaningful
    ///   [ios]
    ///     - ERROR | The source_files pattern did not match any file
    ///   [osx]
    ///     - ERROR | Unable to fetch source: timed out
    /// ```
    pub fn render(
        identity: &SpecIdentity,
        findings: &[Finding],
        options: &RenderOptions,
    ) -> RenderedSpec {
        let visible: Vec<&Finding> = findings
            .iter()
            .filter(|f| Self::shows(f.severity, options))
            .collect();

        let mut text = identity.to_string();
        let multi_platform = identity.platforms.len() > 1;

        for (platform, members) in &group_by_platform(&visible) {
            let indent = match platform {
                Some(name) if multi_platform => {
                    text.push_str(&format!("\n  [{}]", name));
                    "    "
                }
                _ => "  ",
            };
            for finding in members {
                text.push('\n');
                text.push_str(indent);
                text.push_str(&Self::render_line(finding));
            }
        }

        RenderedSpec {
            identity: identity.clone(),
            verdict: Verdict::from_findings(findings),
            counts: FindingCounts::from_findings(findings),
            findings: findings.to_vec(),
            not_run: Vec::new(),
            text,
        }
    }

    /// One bullet, without indentation.
    pub fn render_line(finding: &Finding) -> String {
        format!("- {:<5} | {}", finding.severity.label(), finding.message)
    }

    /// Whether a severity is shown under the given options.
    pub fn shows(severity: Severity, options: &RenderOptions) -> bool {
        !options.only_errors || severity == Severity::Error
    }
}

// Whole-spec group first, then platforms in order of first appearance.
fn group_by_platform<'a>(findings: &[&'a Finding]) -> Vec<(Option<&'a str>, Vec<&'a Finding>)> {
    let mut groups: Vec<(Option<&'a str>, Vec<&'a Finding>)> = vec![(None, Vec::new())];
    for finding in findings {
        let key = finding.platform.as_deref();
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(*finding),
            None => groups.push((key, vec![*finding])),
        }
    }
    groups.retain(|(_, members)| !members.is_empty());
    groups
}
