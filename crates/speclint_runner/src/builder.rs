//! Build invocation against a fetched source.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{RunnerError, RunnerResult};
use crate::process::{run_command, CommandOutput};

/// External build command configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildConfig {
    /// Program to run inside the checked-out source.
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_build_timeout")]
    pub timeout_secs: u64,
    /// Extra environment passed to the build.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_build_timeout() -> u64 {
    600
}

impl BuildConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout_secs: default_build_timeout(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

/// What to build: one platform of one fetched spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub workspace: PathBuf,
    pub platform: String,
    /// Files resolved from the platform's patterns, relative to `workspace`.
    pub source_files: Vec<PathBuf>,
    pub requires_arc: bool,
}

/// Severity of a compiler diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

/// A single compiler or toolchain message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
}

/// Outcome of a build that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub diagnostics: Vec<Diagnostic>,
    pub output: String,
    pub duration_ms: u64,
}

impl BuildOutput {
    /// A clean, successful build.
    pub fn succeeded() -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            ..Default::default()
        }
    }

    /// A failed build reporting the given diagnostics.
    pub fn failed(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            success: false,
            exit_code: Some(1),
            diagnostics,
            ..Default::default()
        }
    }

    pub fn from_command(output: &CommandOutput) -> Self {
        let combined = output.combined_output();
        Self {
            success: output.success(),
            exit_code: output.exit_code,
            diagnostics: parse_diagnostics(&combined),
            output: combined,
            duration_ms: output.duration_ms,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.level == DiagnosticLevel::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.level == DiagnosticLevel::Warning)
    }
}

/// Extract `error:` / `warning:` lines from build output, in order, without duplicates.
pub fn parse_diagnostics(output: &str) -> Vec<Diagnostic> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(error|warning):\s*\S").expect("diagnostic pattern is valid")
    });

    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for line in output.lines() {
        let Some(caps) = re.captures(line) else {
            continue;
        };
        let level = if caps[1].eq_ignore_ascii_case("error") {
            DiagnosticLevel::Error
        } else {
            DiagnosticLevel::Warning
        };
        let diagnostic = Diagnostic {
            level,
            message: line.trim().to_string(),
        };
        if !diagnostics.contains(&diagnostic) {
            diagnostics.push(diagnostic);
        }
    }
    diagnostics
}

/// Builds a fetched source for a platform.
#[async_trait]
pub trait BuildInvoker: Send + Sync {
    /// Run the build. `Err` means the build could not run at all; a build
    /// that ran and failed is an `Ok` with `success == false`.
    async fn build(&self, request: &BuildRequest) -> RunnerResult<BuildOutput>;
}

/// Build invoker that runs a configured external command.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    config: BuildConfig,
}

impl CommandBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }
}

#[async_trait]
impl BuildInvoker for CommandBuilder {
    async fn build(&self, request: &BuildRequest) -> RunnerResult<BuildOutput> {
        if self.config.program.trim().is_empty() {
            return Err(RunnerError::BuildFailed("no build program configured".to_string()));
        }

        info!(
            "Building {} for {} ({} files)",
            request.workspace.display(),
            request.platform,
            request.source_files.len()
        );

        let files = request
            .source_files
            .iter()
            .map(|f| f.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("\n");

        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .current_dir(&request.workspace)
            .envs(&self.config.env)
            .env("SPECLINT_PLATFORM", &request.platform)
            .env("SPECLINT_SOURCE_FILES", files)
            .env("SPECLINT_REQUIRES_ARC", request.requires_arc.to_string());

        let output = run_command(command, Duration::from_secs(self.config.timeout_secs)).await?;
        let result = BuildOutput::from_command(&output);
        debug!(
            "Build for {} finished: success={} diagnostics={}",
            request.platform,
            result.success,
            result.diagnostics.len()
        );
        Ok(result)
    }
}
