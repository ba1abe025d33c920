//! `ship deploy`

use crate::utils;
use colored::Colorize;
use shipwright_core::{ActiveEnvironment, EnvironmentRegistry, TemplateRenderer};
use shipwright_deploy::{CancelFlag, DatabaseDescriptor, Orchestrator, facts, pipeline};
use shipwright_remote::SshExecutor;

pub async fn handle(registry: &EnvironmentRegistry, name: &str, yes: bool) -> anyhow::Result<()> {
    let env = registry.activate(name)?;
    let executor = SshExecutor::new(env.ssh_target());
    let cancel = utils::make_cancel();

    run_deploy(&executor, &env, cancel, yes).await
}

/// Run the deploy sub-pipeline against an already-bootstrapped host.
/// Shared with `ship setup`, which runs it after the system pipeline.
pub async fn run_deploy(
    executor: &SshExecutor,
    env: &ActiveEnvironment,
    cancel: CancelFlag,
    yes: bool,
) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("Deploying '{}' to {}", env.config().project, env.ssh_target()).bold()
    );

    let facts = facts::detect(executor, env).await?;
    println!("  remote Python: {}", facts.python_version.cyan());

    let descriptor: Option<DatabaseDescriptor> =
        env.config().database.as_ref().map(|config| config.into());

    let renderer = TemplateRenderer::embedded();
    let plan = pipeline::deploy_pipeline(env, &facts, &renderer, descriptor.as_ref())?;

    println!("{}", "Plan:".bold());
    for step in plan.step_names() {
        println!("  • {step}");
    }
    if !yes && !utils::make_gate(false).confirm("Run this plan?", true) {
        anyhow::bail!("deploy declined");
    }
    println!();

    let report = Orchestrator::with_cancel(executor, cancel).run(&plan).await?;
    println!();
    println!("{report}");
    report.into_result()?;
    Ok(())
}
