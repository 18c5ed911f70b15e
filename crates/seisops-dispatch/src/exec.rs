//! Subprocess invocation for the external tools.
//!
//! Each call owns its child for its whole lifetime. Without a timeout the
//! call waits as long as the tool runs; with one, the child is killed when the
//! deadline passes.

use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::error::{DispatchError, Result};

/// Captured result of one external tool run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    /// Process exit code; -1 when the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run `program` with `args` directly (no shell), capturing stdout/stderr.
///
/// # Errors
///
/// - `Spawn`  : the program could not be started.
/// - `Timeout`: `timeout` elapsed first; the child has been killed.
/// - `Io`     : waiting on the child failed.
pub async fn run_command(
    program: &str,
    args: &[String],
    timeout: Option<Duration>,
) -> Result<ExecResult> {
    debug!(program, ?args, "exec");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // Dropping the wait future on timeout drops the child, which kills it.
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| DispatchError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let output = match timeout {
        None => child.wait_with_output().await?,
        Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(waited) => waited?,
            Err(_elapsed) => {
                return Err(DispatchError::Timeout {
                    program: program.to_string(),
                    secs: limit.as_secs(),
                })
            }
        },
    };

    Ok(ExecResult {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Substitute `(placeholder, value)` pairs into every argument of `template`.
pub fn render_args(template: &[String], vars: &[(&str, &str)]) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            vars.iter()
                .fold(arg.clone(), |acc, (key, value)| acc.replace(key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[test]
    fn render_substitutes_every_occurrence() {
        let template: Vec<String> = ["-E", "{event_id}", "--tag={event_id}-{origin_id}"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = render_args(&template, &[("{event_id}", "EVT1_5"), ("{origin_id}", "abc")]);
        assert_eq!(out, vec!["-E", "EVT1_5", "--tag=EVT1_5-abc"]);
    }

    #[test]
    fn render_leaves_unknown_braces_alone() {
        let template = vec!["{other}".to_string()];
        assert_eq!(render_args(&template, &[("{event_id}", "x")]), template);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_both_streams_and_exit_code() {
        let result = run_command("sh", &sh("echo out; echo err >&2; exit 3"), None)
            .await
            .unwrap();
        assert_eq!(result.exit_code, 3);
        assert!(!result.success());
        assert_eq!(result.stdout.trim(), "out");
        assert_eq!(result.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn arguments_are_not_shell_split() {
        let args = vec!["a b".to_string(), "$HOME".to_string()];
        let result = run_command("printf", &[vec!["%s|".to_string()], args].concat(), None)
            .await
            .unwrap();
        assert!(result.success());
        assert_eq!(result.stdout, "a b|$HOME|");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let err = run_command("definitely-not-a-real-tool-7f3a", &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_kills_long_running_tool() {
        let err = run_command("sleep", &["5".to_string()], Some(Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Timeout { .. }));
    }
}
