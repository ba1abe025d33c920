//! `ship setup`

use crate::commands::deploy;
use crate::utils;
use colored::Colorize;
use shipwright_core::EnvironmentRegistry;
use shipwright_deploy::{Orchestrator, pipeline};
use shipwright_remote::SshExecutor;

pub async fn handle(registry: &EnvironmentRegistry, name: &str, yes: bool) -> anyhow::Result<()> {
    let env = registry.activate(name)?;
    let executor = SshExecutor::new(env.ssh_target());
    let cancel = utils::make_cancel();

    println!(
        "{}",
        format!("Bootstrapping {} for '{}'", env.ssh_target(), env.name()).bold()
    );

    let plan = pipeline::system_pipeline(&env);
    let report = Orchestrator::with_cancel(&executor, cancel.clone())
        .run(&plan)
        .await?;
    println!();
    println!("{report}");
    report.into_result()?;

    println!();
    deploy::run_deploy(&executor, &env, cancel, yes).await
}
