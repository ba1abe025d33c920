//! Step and pipeline model
//!
//! A pipeline is plain data: an ordered list of named steps, each with an
//! optional idempotency probe, a failure policy and the operations to
//! perform. The orchestrator interprets this model against a
//! `RemoteExecutor`.

use shipwright_remote::{ExecOptions, Probe};
use std::fmt;

/// Whether a step failure aborts the remaining pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Failure aborts the run.
    Fatal,
    /// Failure is logged and the run continues.
    Tolerant,
}

/// One remote command with its execution scope.
#[derive(Debug, Clone)]
pub struct RemoteCommand {
    pub command: String,
    pub options: ExecOptions,
}

impl RemoteCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            options: ExecOptions::new(),
        }
    }

    pub fn with_options(command: impl Into<String>, options: ExecOptions) -> Self {
        Self {
            command: command.into(),
            options,
        }
    }
}

/// A single operation inside a step.
#[derive(Debug, Clone)]
pub enum StepOp {
    /// Run a remote command.
    Exec(RemoteCommand),

    /// Write content to a remote path.
    Upload { remote_path: String, content: String },
}

/// Execution states of a step. Terminal states are `Skipped`, `Applied`
/// and `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Skipped,
    Applied,
    Failed,
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepState::Pending => write!(f, "pending"),
            StepState::Skipped => write!(f, "skipped"),
            StepState::Applied => write!(f, "applied"),
            StepState::Failed => write!(f, "failed"),
        }
    }
}

/// A named unit of provisioning work.
#[derive(Debug, Clone)]
pub struct ProvisionStep {
    pub name: String,
    pub mode: FailureMode,
    pub probe: Option<Probe>,
    pub ops: Vec<StepOp>,
}

impl ProvisionStep {
    pub fn fatal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: FailureMode::Fatal,
            probe: None,
            ops: Vec::new(),
        }
    }

    pub fn tolerant(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: FailureMode::Tolerant,
            probe: None,
            ops: Vec::new(),
        }
    }

    pub fn probe(mut self, probe: Probe) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn exec(mut self, command: impl Into<String>, options: ExecOptions) -> Self {
        self.ops.push(StepOp::Exec(RemoteCommand::with_options(command, options)));
        self
    }

    pub fn upload(mut self, remote_path: impl Into<String>, content: impl Into<String>) -> Self {
        self.ops.push(StepOp::Upload {
            remote_path: remote_path.into(),
            content: content.into(),
        });
        self
    }
}

/// An ordered sequence of provisioning steps.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub name: String,
    pub steps: Vec<ProvisionStep>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn push(&mut self, step: ProvisionStep) {
        self.steps.push(step);
    }

    pub fn extend(&mut self, other: Pipeline) {
        self.steps.extend(other.steps);
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_builder() {
        let step = ProvisionStep::fatal("install-git")
            .probe(Probe::CommandSucceeds("command -v git".to_string()))
            .exec("apt-get install -y git", ExecOptions::new().sudo());

        assert_eq!(step.name, "install-git");
        assert_eq!(step.mode, FailureMode::Fatal);
        assert!(step.probe.is_some());
        assert_eq!(step.ops.len(), 1);
    }

    #[test]
    fn test_pipeline_extend_keeps_order() {
        let mut pipeline = Pipeline::new("deploy");
        pipeline.push(ProvisionStep::fatal("first"));

        let mut tail = Pipeline::new("update");
        tail.push(ProvisionStep::tolerant("second"));
        tail.push(ProvisionStep::fatal("third"));

        pipeline.extend(tail);
        assert_eq!(pipeline.step_names(), vec!["first", "second", "third"]);
    }
}
