//! Shared CLI helpers

use shipwright_core::{
    AssumeYes, ConfirmationGate, EnvironmentRegistry, NonInteractive, TerminalGate,
};
use shipwright_deploy::CancelFlag;
use std::io::IsTerminal;
use std::path::PathBuf;

/// Resolve the environment name from the positional argument, the hidden
/// `-e/--env` flag or, when only one environment is registered, that one.
pub fn determine_environment(
    registry: &EnvironmentRegistry,
    positional: Option<String>,
    flag: Option<String>,
) -> anyhow::Result<String> {
    if let Some(name) = positional.or(flag) {
        return Ok(name);
    }
    if registry.len() == 1 {
        return Ok(registry.names()[0].to_string());
    }
    Err(anyhow::anyhow!(
        "Specify an environment: ship <command> <env> or SHIP_ENV=<env>\navailable environments: {}",
        registry.names().join(", ")
    ))
}

/// Pick the confirmation gate: `--yes` confirms, a terminal prompts, and
/// anything non-interactive declines.
pub fn make_gate(yes: bool) -> Box<dyn ConfirmationGate> {
    if yes {
        Box::new(AssumeYes)
    } else if std::io::stdin().is_terminal() {
        Box::new(TerminalGate)
    } else {
        Box::new(NonInteractive)
    }
}

/// Cancellation flag flipped by Ctrl-C. Checked between pipeline steps.
pub fn make_cancel() -> CancelFlag {
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Ctrl-C received, stopping after the current step");
            flag.cancel();
        }
    });
    cancel
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: PathBuf) -> PathBuf {
    let Some(s) = path.to_str() else {
        return path;
    };
    if let Some(rest) = s.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path
}
