//! `ship update`

use crate::utils;
use colored::Colorize;
use shipwright_core::EnvironmentRegistry;
use shipwright_deploy::{Orchestrator, pipeline};
use shipwright_remote::SshExecutor;

pub async fn handle(registry: &EnvironmentRegistry, name: &str) -> anyhow::Result<()> {
    let env = registry.activate(name)?;
    let executor = SshExecutor::new(env.ssh_target());
    let cancel = utils::make_cancel();

    println!(
        "{}",
        format!(
            "Updating '{}' on {} (branch {})",
            env.config().project,
            env.ssh_target(),
            env.config().branch()
        )
        .bold()
    );

    let plan = pipeline::update_pipeline(&env);
    let report = Orchestrator::with_cancel(&executor, cancel).run(&plan).await?;
    println!();
    println!("{report}");
    report.into_result()?;
    Ok(())
}
