//! Process execution for PhpSpec runs.
//!
//! Spawns a command line, captures stdout and stderr together and reports a
//! non-zero exit separately from the TAP-level pass/fail decision.

use crate::error::{AdapterError, Result};
use std::time::Duration;
use tokio::process::Command;

/// Runs an external command and returns its combined output.
///
/// Implementations return [`AdapterError::ProcessFailed`] (carrying the captured
/// output) when the process exits unsuccessfully.
#[allow(async_fn_in_trait)]
pub trait ProcessRunner {
    async fn run(&self, command_line: &[String]) -> Result<String>;
}

/// [`ProcessRunner`] backed by `tokio::process`, with a wall-clock timeout.
#[derive(Debug, Clone)]
pub struct TokioProcessRunner {
    timeout: Duration,
}

impl TokioProcessRunner {
    pub fn new(timeout_seconds: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_seconds),
        }
    }
}

impl Default for TokioProcessRunner {
    fn default() -> Self {
        Self::new(300) // 5 minutes
    }
}

impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command_line: &[String]) -> Result<String> {
        let Some((program, args)) = command_line.split_first() else {
            return Err(AdapterError::Config("empty command line".to_string()));
        };

        tracing::debug!("Running {}", command_line.join(" "));

        let result = tokio::time::timeout(
            self.timeout,
            Command::new(program).args(args).kill_on_drop(true).output(),
        )
        .await;

        match result {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let combined = if stderr.is_empty() {
                    stdout.into_owned()
                } else {
                    format!("{}\n{}", stdout, stderr)
                };

                if output.status.success() {
                    Ok(combined)
                } else {
                    Err(AdapterError::ProcessFailed {
                        program: program.clone(),
                        exit_code: output.status.code(),
                        output: combined,
                    })
                }
            }
            Ok(Err(e)) => Err(AdapterError::ProcessSpawn {
                program: program.clone(),
                source: e,
            }),
            Err(_) => {
                tracing::debug!("{} timed out after {:?}", program, self.timeout);
                Err(AdapterError::ProcessTimeout {
                    program: program.clone(),
                    timeout_seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}

/// Cap stored output at `max_bytes`, cutting on a character boundary.
pub fn truncate_output(output: &str, max_bytes: usize) -> String {
    if output.len() <= max_bytes {
        return output.to_string();
    }

    let mut end = max_bytes;
    while !output.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &output[..end])
}
