//! Bounded command execution.
//!
//! Commands run as a single argument-vector process invocation — no
//! shell is involved, so there is nothing for a metacharacter to do
//! even if one slipped past the authorizer. The metacharacter scan is
//! still repeated here immediately before spawning.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use termgate_core::error::{Result, TermGateError};

/// Same set the command authorizer rejects on.
const SHELL_METACHARACTERS: &[char] = &[';', '|', '&', '`', '$', '<', '>', '\n', '\r'];

/// Captured result of a finished command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

/// Run an already-authorized command with a hard wall-clock timeout.
///
/// On timeout the child is killed (`kill_on_drop`) and `TimedOut` is
/// returned; the caller is never left waiting past `timeout`. Captured
/// streams are truncated at `max_output` bytes per stream with a
/// visible marker.
pub async fn run_command(
    command: &str,
    cwd: Option<&Path>,
    timeout: Duration,
    max_output: usize,
) -> Result<CommandOutcome> {
    if let Some(c) = command.chars().find(|c| SHELL_METACHARACTERS.contains(c)) {
        return Err(TermGateError::Denied(format!(
            "command contains shell metacharacter {c:?}"
        )));
    }

    let mut argv = command.split_whitespace();
    let program = argv
        .next()
        .ok_or_else(|| TermGateError::Denied("command is empty".into()))?;

    let mut cmd = tokio::process::Command::new(program);
    cmd.args(argv)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let child = cmd
        .spawn()
        .map_err(|e| TermGateError::Io(format!("failed to spawn {program:?}: {e}")))?;

    let start = std::time::Instant::now();
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(TermGateError::Io(format!("wait on {program:?}: {e}"))),
        Err(_) => {
            // The dropped wait future drops the child, which kills it.
            tracing::warn!(command, timeout_ms = timeout.as_millis() as u64, "command timed out");
            return Err(TermGateError::TimedOut(timeout.as_millis() as u64));
        }
    };

    Ok(CommandOutcome {
        exit_code: output.status.code(),
        stdout: truncate_output(&output.stdout, max_output),
        stderr: truncate_output(&output.stderr, max_output),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Lossy-decode up to `cap` bytes; excess is cut with a marker.
fn truncate_output(bytes: &[u8], cap: usize) -> String {
    if bytes.len() <= cap {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    // Lossy decode handles a cut mid-character at the cap boundary.
    let decoded = String::from_utf8_lossy(&bytes[..cap]);
    format!("{}\n[truncated, {} bytes total]", decoded, bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_stdout_and_exit() {
        let out = run_command("echo hello", None, Duration::from_secs(5), 4096)
            .await
            .unwrap();
        assert_eq!(out.exit_code, Some(0));
        assert!(out.stdout.contains("hello"));
        assert!(out.stderr.is_empty());
    }

    #[tokio::test]
    async fn test_nonzero_exit_reported() {
        let out = run_command("false", None, Duration::from_secs(5), 4096)
            .await
            .unwrap();
        assert_eq!(out.exit_code, Some(1));
    }

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = run_command("pwd", Some(dir.path()), Duration::from_secs(5), 4096)
            .await
            .unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        assert!(out.stdout.trim().ends_with(canonical.to_str().unwrap()));
    }

    #[tokio::test]
    async fn test_timeout_returns_within_bound_and_kills_child() {
        // Distinctive argument so the process can be found by name below.
        let command = "sleep 31487";
        let start = std::time::Instant::now();
        let err = run_command(command, None, Duration::from_millis(200), 4096)
            .await
            .unwrap_err();
        assert!(matches!(err, TermGateError::TimedOut(200)));
        assert!(start.elapsed() < Duration::from_secs(2));

        // The child must be gone, not orphaned past the timeout.
        #[cfg(unix)]
        {
            tokio::time::sleep(Duration::from_millis(200)).await;
            if let Ok(out) = std::process::Command::new("pgrep")
                .args(["-f", command])
                .output()
            {
                assert!(
                    out.stdout.is_empty(),
                    "sleep child still alive after timeout: {}",
                    String::from_utf8_lossy(&out.stdout)
                );
            }
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let err = run_command(
            "definitely-not-a-real-binary-xyz",
            None,
            Duration::from_secs(1),
            4096,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TermGateError::Io(_)));
    }

    #[tokio::test]
    async fn test_metacharacter_rechecked_before_spawn() {
        let err = run_command("echo hi; rm -rf /", None, Duration::from_secs(1), 4096)
            .await
            .unwrap_err();
        assert!(matches!(err, TermGateError::Denied(_)));
    }

    #[test]
    fn test_truncation_marked() {
        let big = vec![b'a'; 100];
        let s = truncate_output(&big, 10);
        assert!(s.starts_with("aaaaaaaaaa"));
        assert!(s.contains("[truncated, 100 bytes total]"));

        let small = b"short";
        assert_eq!(truncate_output(small, 10), "short");
    }
}
