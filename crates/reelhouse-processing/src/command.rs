//! Bounded execution of external binaries.
//!
//! Every child is spawned with `kill_on_drop(true)`, so when the wait times out
//! (or the caller's future is dropped) the process is killed instead of being
//! left running in the background.

use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Longest stderr excerpt kept in an error.
const STDERR_EXCERPT_BYTES: usize = 2048;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid executable path '{0}'")]
    InvalidExecutable(String),

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

/// Reject executable paths carrying shell metacharacters or traversal.
pub fn validate_executable(path: &str) -> Result<(), CommandError> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty()
        || path.contains("..")
        || path.chars().any(|c| dangerous_chars.contains(&c))
        || !path
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '/' | '-' | '_' | '.' | '\\' | ':'))
    {
        return Err(CommandError::InvalidExecutable(path.to_string()));
    }
    Ok(())
}

fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_EXCERPT_BYTES {
        return text.to_string();
    }
    let mut cut = text.len() - STDERR_EXCERPT_BYTES;
    while !text.is_char_boundary(cut) {
        cut += 1;
    }
    format!("...{}", &text[cut..])
}

/// Run `command` to completion, capturing stdout and stderr, within `timeout`.
///
/// A non-zero exit is an error carrying the tail of stderr.
pub async fn run_with_timeout(
    mut command: Command,
    program: &str,
    timeout: Duration,
) -> Result<Output, CommandError> {
    command
        .kill_on_drop(true)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let child = command.spawn().map_err(|source| CommandError::Launch {
        program: program.to_string(),
        source,
    })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(CommandError::Wait {
                program: program.to_string(),
                source,
            })
        }
        Err(_) => {
            tracing::warn!(
                process.executable.name = program,
                timeout_secs = timeout.as_secs_f64(),
                "External command timed out and was killed"
            );
            return Err(CommandError::TimedOut {
                program: program.to_string(),
                timeout,
            });
        }
    };

    if !output.status.success() {
        return Err(CommandError::Failed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: stderr_excerpt(&output.stderr),
        });
    }

    Ok(output)
}
