//! `ship restore`

use crate::utils;
use colored::Colorize;
use shipwright_core::EnvironmentRegistry;
use shipwright_deploy::{BackupManager, resolve_descriptor};
use shipwright_remote::SshExecutor;

pub async fn handle(
    registry: &EnvironmentRegistry,
    name: &str,
    archive: &str,
    yes: bool,
) -> anyhow::Result<()> {
    let env = registry.activate(name)?;
    let executor = SshExecutor::new(env.ssh_target());
    let descriptor = resolve_descriptor(&executor, &env).await?;

    println!(
        "{}",
        format!(
            "Restoring '{}' into database '{}' on {}",
            archive,
            descriptor.name,
            env.ssh_target()
        )
        .bold()
    );

    let gate = utils::make_gate(yes);
    let manager = BackupManager::new(&executor, &*gate);
    manager.restore(&env, &descriptor, archive).await?;

    println!("{} restore finished", "✓".green());
    Ok(())
}
