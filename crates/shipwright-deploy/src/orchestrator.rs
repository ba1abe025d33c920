//! Pipeline orchestrator
//!
//! Runs steps strictly in order against one executor. Each step consults
//! its probe immediately before execution; a fatal failure stops the run,
//! a tolerant failure is recorded and the run continues. Cancellation is
//! checked between steps only, never mid-command.

use crate::error::{DeployError, Result};
use crate::report::RunReport;
use crate::step::{FailureMode, Pipeline, ProvisionStep, StepOp, StepState};
use colored::Colorize;
use shipwright_remote::{ProbeOutcome, RemoteExecutor, probe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Cooperative cancellation signal shared with the CLI's Ctrl-C handler.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives a pipeline against one target host.
pub struct Orchestrator<'a> {
    executor: &'a dyn RemoteExecutor,
    cancel: CancelFlag,
}

impl<'a> Orchestrator<'a> {
    pub fn new(executor: &'a dyn RemoteExecutor) -> Self {
        Self {
            executor,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel(executor: &'a dyn RemoteExecutor, cancel: CancelFlag) -> Self {
        Self { executor, cancel }
    }

    /// Execute all steps in order and report per-step outcomes.
    pub async fn run(&self, pipeline: &Pipeline) -> Result<RunReport> {
        info!(pipeline = %pipeline.name, steps = pipeline.len(), "Starting pipeline");
        let mut report = RunReport::new(&pipeline.name);

        for step in &pipeline.steps {
            if self.cancel.is_cancelled() {
                warn!(step = %step.name, "Cancellation requested, stopping before step");
                return Err(DeployError::Cancelled(step.name.clone()));
            }

            println!("{} {}", "▶".green(), step.name.bold());

            if let Some(probe) = &step.probe {
                let outcome = probe::check(self.executor, probe).await;
                if outcome == ProbeOutcome::Satisfied {
                    println!("  {} already satisfied, skipping", "-".cyan());
                    report.record(&step.name, StepState::Skipped, Some(probe.to_string()));
                    continue;
                }
                if outcome == ProbeOutcome::Indeterminate {
                    // Already warned by the probe layer; proceed with the step.
                    println!("  {} probe indeterminate, running step", "!".yellow());
                }
            }

            match self.run_ops(step).await {
                None => {
                    println!("  {} applied", "✓".green());
                    report.record(&step.name, StepState::Applied, None);
                }
                Some(detail) => {
                    report.record(&step.name, StepState::Failed, Some(detail.clone()));
                    match step.mode {
                        FailureMode::Fatal => {
                            println!("  {} failed, aborting", "✗".red());
                            warn!(step = %step.name, detail = %detail, "Fatal step failed");
                            report.aborted = Some(step.name.clone());
                            break;
                        }
                        FailureMode::Tolerant => {
                            println!("  {} failed (tolerated), continuing", "!".yellow());
                            warn!(step = %step.name, detail = %detail, "Tolerant step failed, continuing");
                        }
                    }
                }
            }
        }

        info!(
            pipeline = %pipeline.name,
            applied = report.count(StepState::Applied),
            skipped = report.count(StepState::Skipped),
            failed = report.count(StepState::Failed),
            "Pipeline finished"
        );
        Ok(report)
    }

    /// Run a step's operations in order. Returns the failure detail of the
    /// first failing operation, or None when all succeed.
    async fn run_ops(&self, step: &ProvisionStep) -> Option<String> {
        for op in &step.ops {
            match op {
                StepOp::Exec(cmd) => {
                    match self.executor.execute(&cmd.command, &cmd.options).await {
                        Ok(result) if result.succeeded => {
                            if !cmd.options.quiet && !result.output.trim().is_empty() {
                                println!("{}", result.output.trim_end().dimmed());
                            }
                        }
                        Ok(result) => {
                            return Some(format!(
                                "command failed: {}\n{}",
                                cmd.command, result.output
                            ));
                        }
                        Err(e) => return Some(e.to_string()),
                    }
                }
                StepOp::Upload {
                    remote_path,
                    content,
                } => {
                    if let Err(e) = self.executor.write_file(remote_path, content).await {
                        return Some(e.to_string());
                    }
                }
            }
        }
        None
    }
}
