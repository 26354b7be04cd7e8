//! Script execution over `osascript`
//!
//! The engine only needs a text-in/text-out channel: hand over a script,
//! get back trimmed standard output or a failure message. [`ScriptRunner`]
//! is that seam; [`OsascriptRunner`] is the production implementation.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

use crate::script::ScriptText;

/// Failure to run a script to completion
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunnerError {
    /// The program could not be started
    #[error("failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },
    /// The program exited unsuccessfully
    #[error("{program} exited with {status}: {output}")]
    Failed {
        program: String,
        status: String,
        output: String,
    },
    /// The program did not finish within the configured bound
    #[error("{program} timed out after {timeout_ms} ms")]
    Timeout { program: String, timeout_ms: u64 },
}

/// Runs a script against the automation target
pub trait ScriptRunner: Send + Sync {
    /// Execute `script` and return its trimmed standard output
    fn run(&self, script: &ScriptText) -> impl Future<Output = Result<String, RunnerError>> + Send;
}

/// Runs scripts with `osascript -e`
#[derive(Debug, Clone)]
pub struct OsascriptRunner {
    program: String,
    timeout: Option<Duration>,
}

impl OsascriptRunner {
    /// `timeout_ms == 0` disables the bound
    pub fn new(program: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            program: program.into(),
            timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
        }
    }
}

impl ScriptRunner for OsascriptRunner {
    async fn run(&self, script: &ScriptText) -> Result<String, RunnerError> {
        let mut command = Command::new(&self.program);
        command
            .arg("-e")
            .arg(script.as_str())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => timeout(limit, command.output()).await.map_err(|_| {
                RunnerError::Timeout {
                    program: self.program.clone(),
                    timeout_ms: limit.as_millis().min(u128::from(u64::MAX)) as u64,
                }
            })?,
            None => command.output().await,
        }
        .map_err(|e| RunnerError::Spawn {
            program: self.program.clone(),
            reason: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            let combined = match (stderr.is_empty(), stdout.is_empty()) {
                (false, false) => format!("{stderr}\n{stdout}"),
                (false, true) => stderr,
                _ => stdout,
            };
            return Err(RunnerError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                output: combined,
            });
        }
        Ok(stdout)
    }
}
