//! Privileged command channel.
//!
//! Display discovery and raw capture need elevated execution rights that
//! normal application APIs do not grant. Both go through this channel,
//! which wraps every command in the configured privilege prefix (e.g.
//! `su -c`) and serializes invocations: the underlying channel must be
//! assumed non-reentrant-safe, so only one privileged command is ever
//! outstanding.

use crate::{Error, Result};
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Captured output of one privileged command.
#[derive(Debug, Clone)]
pub struct ShellOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Capability seam for privileged execution, injected into the capture
/// pipeline instead of reached through a process-wide singleton.
pub trait PrivilegedExec: Send + Sync {
    /// Run one privileged command and capture its output.
    fn run(&self, command: &str) -> impl Future<Output = Result<ShellOutput>> + Send;
}

/// Production privileged channel over an external privilege broker.
pub struct PrivilegedShell {
    prefix: Vec<String>,
    timeout: Duration,
    // Serializes invocations; the broker cannot handle concurrent calls.
    gate: Mutex<()>,
}

impl PrivilegedShell {
    #[must_use]
    pub fn new(prefix: Vec<String>, timeout: Duration) -> Self {
        Self {
            prefix,
            timeout,
            gate: Mutex::new(()),
        }
    }

    async fn run_locked(&self, command: &str) -> Result<ShellOutput> {
        let _guard = self.gate.lock().await;

        let mut cmd = if let Some((program, rest)) = self.prefix.split_first() {
            let mut cmd = Command::new(program);
            cmd.args(rest);
            cmd.arg(command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c");
            cmd.arg(command);
            cmd
        };

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command, "running privileged command");

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| Error::ShellTimeout(self.timeout.as_secs()))?
            .map_err(|e| Error::Shell(format!("failed to spawn privileged command: {e}")))?;

        let result = ShellOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success {
            warn!(
                command,
                stderr = %result.stderr.trim(),
                "privileged command reported failure"
            );
        }

        Ok(result)
    }
}

impl PrivilegedExec for PrivilegedShell {
    fn run(&self, command: &str) -> impl Future<Output = Result<ShellOutput>> + Send {
        self.run_locked(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_shell() -> PrivilegedShell {
        // No prefix: commands run through plain `sh -c`.
        PrivilegedShell::new(Vec::new(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let shell = echo_shell();
        let output = shell.run("echo panel-ids").await.unwrap();
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "panel-ids");
    }

    #[tokio::test]
    async fn test_run_reports_failure_status() {
        let shell = echo_shell();
        let output = shell.run("exit 3").await.unwrap();
        assert!(!output.success);
    }

    #[tokio::test]
    async fn test_run_captures_stderr() {
        let shell = echo_shell();
        let output = shell.run("echo oops 1>&2").await.unwrap();
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let shell = PrivilegedShell::new(Vec::new(), Duration::from_millis(50));
        let err = shell.run("sleep 5").await.unwrap_err();
        assert!(matches!(err, Error::ShellTimeout(_)));
    }

    #[tokio::test]
    async fn test_invocations_are_serialized() {
        use std::sync::Arc;

        let shell = Arc::new(echo_shell());
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("gate-marker");

        // Two concurrent calls: each appends then reads the marker file.
        // Serialized execution means neither sees a half-written state.
        let cmd = format!("echo x >> {m} && cat {m}", m = marker.display());
        let a = shell.clone();
        let b = shell.clone();
        let cmd_a = cmd.clone();
        let (ra, rb) = tokio::join!(
            tokio::spawn(async move { a.run(&cmd_a).await }),
            tokio::spawn(async move { b.run(&cmd).await }),
        );
        let lines_a = ra.unwrap().unwrap().stdout.lines().count();
        let lines_b = rb.unwrap().unwrap().stdout.lines().count();

        let mut counts = [lines_a, lines_b];
        counts.sort_unstable();
        assert_eq!(counts, [1, 2]);
    }
}
