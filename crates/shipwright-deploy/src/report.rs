//! Run reports

use crate::error::{DeployError, Result};
use crate::step::StepState;
use colored::Colorize;
use std::fmt;

/// Outcome of one step.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub name: String,
    pub state: StepState,
    /// Captured output for failures, probe notes for skips.
    pub detail: Option<String>,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub pipeline: String,
    pub steps: Vec<StepReport>,
    /// Name of the fatal step that aborted the run, if any.
    pub aborted: Option<String>,
}

impl RunReport {
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
            steps: Vec::new(),
            aborted: None,
        }
    }

    pub fn record(&mut self, name: &str, state: StepState, detail: Option<String>) {
        self.steps.push(StepReport {
            name: name.to_string(),
            state,
            detail,
        });
    }

    pub fn is_success(&self) -> bool {
        self.aborted.is_none()
    }

    pub fn count(&self, state: StepState) -> usize {
        self.steps.iter().filter(|s| s.state == state).count()
    }

    /// Convert an aborted run into its error, keeping successful runs as-is.
    pub fn into_result(self) -> Result<RunReport> {
        match &self.aborted {
            None => Ok(self),
            Some(step) => {
                let cause = self
                    .steps
                    .iter()
                    .find(|s| s.name == *step)
                    .and_then(|s| s.detail.clone())
                    .unwrap_or_default();
                Err(DeployError::ProvisioningAborted {
                    step: step.clone(),
                    cause,
                })
            }
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", format!("Pipeline '{}'", self.pipeline).bold())?;
        for step in &self.steps {
            let marker = match step.state {
                StepState::Applied => "✓".green(),
                StepState::Skipped => "-".cyan(),
                StepState::Failed => "✗".red(),
                StepState::Pending => "•".normal(),
            };
            writeln!(f, "  {} {} ({})", marker, step.name, step.state)?;
        }
        write!(
            f,
            "{}",
            format!(
                "{} applied, {} skipped, {} failed",
                self.count(StepState::Applied),
                self.count(StepState::Skipped),
                self.count(StepState::Failed),
            )
        )?;
        if let Some(step) = &self.aborted {
            write!(f, "{}", format!("\naborted at '{step}'").red())?;
        }
        Ok(())
    }
}
