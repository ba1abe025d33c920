//! Idempotency probes
//!
//! Every provisioning step that can be skipped declares a probe describing
//! the remote state that makes it unnecessary. Probes run immediately
//! before their step; outcomes are never cached, since earlier steps change
//! the remote state.

use crate::executor::{ExecOptions, RemoteExecutor};
use std::fmt;
use tracing::warn;

/// A remote-state predicate.
#[derive(Debug, Clone)]
pub enum Probe {
    /// Satisfied when the path exists on the target.
    PathExists(String),

    /// Satisfied when the path does not exist on the target.
    PathMissing(String),

    /// Satisfied when the command exits zero.
    CommandSucceeds(String),

    /// Satisfied when the command's trimmed output equals `expected`.
    /// The probe itself failing makes the outcome indeterminate.
    OutputEquals { command: String, expected: String },
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probe::PathExists(path) => write!(f, "path exists: {path}"),
            Probe::PathMissing(path) => write!(f, "path missing: {path}"),
            Probe::CommandSucceeds(command) => write!(f, "command succeeds: {command}"),
            Probe::OutputEquals { command, expected } => {
                write!(f, "output of '{command}' equals '{expected}'")
            }
        }
    }
}

/// Tri-state probe result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The step's effect is already present; skip it.
    Satisfied,

    /// The step must run.
    Unsatisfied,

    /// The probe itself could not be evaluated. Policy: proceed with the
    /// step, but surface a warning. Never fatal by itself.
    Indeterminate,
}

impl ProbeOutcome {
    /// Whether the guarded step should run.
    pub fn should_run(self) -> bool {
        !matches!(self, ProbeOutcome::Satisfied)
    }
}

/// Evaluate a probe through the executor.
pub async fn check(executor: &dyn RemoteExecutor, probe: &Probe) -> ProbeOutcome {
    let options = ExecOptions::new().quiet().tolerant();
    match probe {
        Probe::PathExists(path) => {
            match executor
                .execute(&format!("test -e {}", crate::shell_escape(path)), &options)
                .await
            {
                Ok(result) if result.succeeded => ProbeOutcome::Satisfied,
                Ok(_) => ProbeOutcome::Unsatisfied,
                Err(e) => indeterminate(probe, &e.to_string()),
            }
        }
        Probe::PathMissing(path) => {
            match executor
                .execute(&format!("test -e {}", crate::shell_escape(path)), &options)
                .await
            {
                Ok(result) if result.succeeded => ProbeOutcome::Unsatisfied,
                Ok(_) => ProbeOutcome::Satisfied,
                Err(e) => indeterminate(probe, &e.to_string()),
            }
        }
        Probe::CommandSucceeds(command) => match executor.execute(command, &options).await {
            Ok(result) if result.succeeded => ProbeOutcome::Satisfied,
            Ok(_) => ProbeOutcome::Unsatisfied,
            Err(e) => indeterminate(probe, &e.to_string()),
        },
        Probe::OutputEquals { command, expected } => {
            match executor.execute(command, &options).await {
                Ok(result) if result.succeeded => {
                    if result.output.trim() == expected.trim() {
                        ProbeOutcome::Satisfied
                    } else {
                        ProbeOutcome::Unsatisfied
                    }
                }
                Ok(result) => indeterminate(probe, result.output.trim()),
                Err(e) => indeterminate(probe, &e.to_string()),
            }
        }
    }
}

fn indeterminate(probe: &Probe, detail: &str) -> ProbeOutcome {
    warn!(probe = %probe, detail, "Probe could not be evaluated, treating as unsatisfied");
    ProbeOutcome::Indeterminate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RemoteError, Result};
    use crate::executor::CommandOutput;
    use async_trait::async_trait;
    use std::path::Path;

    /// Executor whose answers come from a fixed list of existing paths.
    struct ScriptedFs {
        existing: Vec<String>,
        fail_transport: bool,
    }

    #[async_trait]
    impl RemoteExecutor for ScriptedFs {
        async fn execute(&self, command: &str, _options: &ExecOptions) -> Result<CommandOutput> {
            if self.fail_transport {
                return Err(RemoteError::TransferFailed("connection refused".to_string()));
            }
            if let Some(path) = command
                .strip_prefix("test -e '")
                .and_then(|rest| rest.strip_suffix('\''))
            {
                if self.existing.iter().any(|p| p == path) {
                    return Ok(CommandOutput::ok(""));
                }
                return Ok(CommandOutput::failed(""));
            }
            if command == "echo 2.7" {
                return Ok(CommandOutput::ok("2.7\n"));
            }
            Ok(CommandOutput::failed("unknown command"))
        }

        async fn upload(&self, _local: &Path, _remote: &str) -> Result<()> {
            Ok(())
        }

        async fn download(&self, _remote: &str, _local: &Path) -> Result<()> {
            Ok(())
        }

        async fn write_file(&self, _remote_path: &str, _content: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_path_exists_probe() {
        let executor = ScriptedFs {
            existing: vec!["/opt/envs/beta".to_string()],
            fail_transport: false,
        };

        let outcome = check(&executor, &Probe::PathExists("/opt/envs/beta".to_string())).await;
        assert_eq!(outcome, ProbeOutcome::Satisfied);

        let outcome = check(&executor, &Probe::PathExists("/opt/envs/prod".to_string())).await;
        assert_eq!(outcome, ProbeOutcome::Unsatisfied);
    }

    #[tokio::test]
    async fn test_path_missing_probe_inverts() {
        let executor = ScriptedFs {
            existing: vec!["/opt/envs/beta".to_string()],
            fail_transport: false,
        };

        let outcome = check(&executor, &Probe::PathMissing("/opt/envs/beta".to_string())).await;
        assert_eq!(outcome, ProbeOutcome::Unsatisfied);
    }

    #[tokio::test]
    async fn test_output_equals_probe() {
        let executor = ScriptedFs {
            existing: vec![],
            fail_transport: false,
        };

        let outcome = check(
            &executor,
            &Probe::OutputEquals {
                command: "echo 2.7".to_string(),
                expected: "2.7".to_string(),
            },
        )
        .await;
        assert_eq!(outcome, ProbeOutcome::Satisfied);
    }

    #[tokio::test]
    async fn test_probe_is_deterministic_against_unchanged_state() {
        let executor = ScriptedFs {
            existing: vec!["/opt/envs/beta".to_string()],
            fail_transport: false,
        };
        let probe = Probe::PathExists("/opt/envs/beta".to_string());

        let first = check(&executor, &probe).await;
        let second = check(&executor, &probe).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_transport_error_is_indeterminate() {
        let executor = ScriptedFs {
            existing: vec![],
            fail_transport: true,
        };

        let outcome = check(&executor, &Probe::PathExists("/any".to_string())).await;
        assert_eq!(outcome, ProbeOutcome::Indeterminate);
        assert!(outcome.should_run());
    }
}
