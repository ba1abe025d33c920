//! Remote executor capability
//!
//! The orchestrator and backup manager talk to target hosts through the
//! [`RemoteExecutor`] trait. The stock implementation drives the system
//! ssh and scp binaries; tests substitute scripted executors.

use crate::error::{RemoteError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Scope and policy for one remote command.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Working directory the command is run in.
    pub cwd: Option<String>,

    /// Shell prefix sourced before the command, e.g. a virtualenv
    /// activation line.
    pub env_prefix: Option<String>,

    /// Run under sudo.
    pub sudo: bool,

    /// Keep captured output out of the progress stream.
    pub quiet: bool,

    /// The caller expects this command may fail; log at debug instead of
    /// warn.
    pub tolerate_failure: bool,
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    pub fn sudo(mut self) -> Self {
        self.sudo = true;
        self
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    pub fn tolerant(mut self) -> Self {
        self.tolerate_failure = true;
        self
    }
}

/// Structured result of a remote command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub succeeded: bool,
    pub output: String,
}

impl CommandOutput {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            output: output.into(),
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            output: output.into(),
        }
    }
}

/// Executes commands and transfers files on one target host.
///
/// Command failure is reported as a value so callers can apply their own
/// failure policy; `Err` is reserved for transport problems.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    async fn execute(&self, command: &str, options: &ExecOptions) -> Result<CommandOutput>;

    async fn upload(&self, local: &Path, remote: &str) -> Result<()>;

    async fn download(&self, remote: &str, local: &Path) -> Result<()>;

    /// Write `content` to a remote path without a local intermediate file.
    async fn write_file(&self, remote_path: &str, content: &str) -> Result<()>;
}

/// Drives the system ssh and scp binaries against one `user@host` target.
pub struct SshExecutor {
    target: String,
}

impl SshExecutor {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Compose the final shell line: env prefix first, then cd, then the
    /// command, optionally wrapped in sudo.
    fn compose(&self, command: &str, options: &ExecOptions) -> String {
        let mut composed = command.to_string();
        if let Some(cwd) = &options.cwd {
            composed = format!("cd {} && {}", shell_escape(cwd), composed);
        }
        if let Some(prefix) = &options.env_prefix {
            composed = format!("{} && {}", prefix, composed);
        }
        if options.sudo {
            composed = format!("sudo bash -c {}", shell_escape(&composed));
        }
        composed
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn execute(&self, command: &str, options: &ExecOptions) -> Result<CommandOutput> {
        let composed = self.compose(command, options);
        debug!(host = %self.target, command = %composed, "Running remote command");

        let output = Command::new("ssh")
            .arg(&self.target)
            .arg(&composed)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| RemoteError::Spawn {
                command: composed.clone(),
                source: e,
            })?;

        let mut captured = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            if !captured.is_empty() {
                captured.push('\n');
            }
            captured.push_str(&stderr);
        }

        if output.status.success() {
            Ok(CommandOutput::ok(captured))
        } else {
            if options.tolerate_failure {
                debug!(command = %composed, "Remote command failed (tolerated)");
            } else {
                warn!(command = %composed, output = %captured, "Remote command failed");
            }
            Ok(CommandOutput::failed(captured))
        }
    }

    async fn upload(&self, local: &Path, remote: &str) -> Result<()> {
        debug!(host = %self.target, local = %local.display(), remote, "Uploading file");
        let status = Command::new("scp")
            .arg(local)
            .arg(format!("{}:{}", self.target, remote))
            .status()
            .await
            .map_err(|e| RemoteError::Spawn {
                command: "scp".to_string(),
                source: e,
            })?;
        if !status.success() {
            return Err(RemoteError::TransferFailed(format!(
                "upload of {} to {}:{} failed",
                local.display(),
                self.target,
                remote
            )));
        }
        Ok(())
    }

    async fn download(&self, remote: &str, local: &Path) -> Result<()> {
        debug!(host = %self.target, remote, local = %local.display(), "Downloading file");
        let status = Command::new("scp")
            .arg(format!("{}:{}", self.target, remote))
            .arg(local)
            .status()
            .await
            .map_err(|e| RemoteError::Spawn {
                command: "scp".to_string(),
                source: e,
            })?;
        if !status.success() {
            return Err(RemoteError::TransferFailed(format!(
                "download of {}:{} failed",
                self.target, remote
            )));
        }
        Ok(())
    }

    async fn write_file(&self, remote_path: &str, content: &str) -> Result<()> {
        debug!(host = %self.target, remote_path, "Writing remote file");
        let mut child = Command::new("ssh")
            .arg(&self.target)
            .arg(format!("cat > {}", shell_escape(remote_path)))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RemoteError::Spawn {
                command: "ssh".to_string(),
                source: e,
            })?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(content.as_bytes()).await?;
        }
        drop(child.stdin.take());

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(RemoteError::TransferFailed(format!(
                "writing {}:{} failed: {}",
                self.target,
                remote_path,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Wrap a string in single quotes for the remote shell.
pub fn shell_escape(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}
