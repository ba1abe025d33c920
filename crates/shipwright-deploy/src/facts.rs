//! Remote host facts
//!
//! Small pieces of remote state detected before pipelines are built, such
//! as the Python version the target's virtualenv runs.

use crate::error::{DeployError, Result};
use shipwright_core::ActiveEnvironment;
use shipwright_remote::{ExecOptions, RemoteExecutor};
use tracing::debug;

/// Prints the remote `major.minor` Python version.
pub const GET_PYTHON_VERSION: &str = "python -V 2>&1 | cut -f2 -d' ' | cut -f-2 -d.";

/// Facts about one target host, detected once per run.
#[derive(Debug, Clone)]
pub struct HostFacts {
    pub python_version: String,
}

impl HostFacts {
    /// The site-packages directory relative to the virtualenv root.
    pub fn site_packages(&self) -> String {
        format!("lib/python{}/site-packages", self.python_version)
    }
}

/// Detect the Python version on the target.
///
/// Tries the environment's virtualenv first; falls back to the system
/// interpreter when the virtualenv does not exist yet.
pub async fn detect_python_version(
    executor: &dyn RemoteExecutor,
    env: &ActiveEnvironment,
) -> Result<String> {
    let in_venv = ExecOptions::new()
        .with_prefix(env.django_prefix())
        .quiet()
        .tolerant();
    let result = executor.execute(GET_PYTHON_VERSION, &in_venv).await?;
    if result.succeeded && looks_like_version(result.output.trim()) {
        debug!(version = %result.output.trim(), "Detected Python version in virtualenv");
        return Ok(result.output.trim().to_string());
    }

    let plain = ExecOptions::new().quiet().tolerant();
    let result = executor.execute(GET_PYTHON_VERSION, &plain).await?;
    if result.succeeded && looks_like_version(result.output.trim()) {
        debug!(version = %result.output.trim(), "Detected system Python version");
        return Ok(result.output.trim().to_string());
    }

    Err(DeployError::PythonVersionUnknown {
        environment: env.name().to_string(),
        detail: result.output,
    })
}

/// Detect all facts needed to build pipelines for `env`.
pub async fn detect(executor: &dyn RemoteExecutor, env: &ActiveEnvironment) -> Result<HostFacts> {
    let python_version = detect_python_version(executor, env).await?;
    Ok(HostFacts { python_version })
}

fn looks_like_version(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| c.is_ascii_digit() || c == '.')
        && s.contains('.')
}
