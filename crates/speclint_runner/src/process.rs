//! Child process execution with timeouts.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::debug;

use crate::error::{RunnerError, RunnerResult};

/// Captured result of a finished child process.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Get combined output (stdout + stderr).
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Run `command` to completion, killing it if `timeout` elapses first.
pub async fn run_command(mut command: Command, timeout: Duration) -> RunnerResult<CommandOutput> {
    let program = command.as_std().get_program().to_string_lossy().to_string();
    command.stdin(Stdio::null()).kill_on_drop(true);

    debug!("Running {:?}", command.as_std());
    let start = Instant::now();

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(result) => result.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                RunnerError::ToolNotFound(program.clone())
            } else {
                RunnerError::Io(e)
            }
        })?,
        Err(_) => return Err(RunnerError::Timeout(timeout.as_secs())),
    };

    Ok(CommandOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}
