// Bounded external command execution

use super::TierError;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// A program plus arguments, run directly (no shell).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs `spec` to completion and returns its stdout (lossy UTF-8).
/// The child is killed if `timeout` elapses first.
pub async fn run_command(spec: &CommandSpec, timeout: Duration) -> Result<String, TierError> {
    tracing::debug!(command = %spec, "spawning");
    let child = Command::new(&spec.program)
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| TierError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|source| TierError::Spawn {
            program: spec.program.clone(),
            source,
        })?,
        Err(_) => {
            return Err(TierError::Timeout {
                program: spec.program.clone(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
    };

    if !output.status.success() {
        return Err(TierError::NonZeroExit {
            program: spec.program.clone(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
