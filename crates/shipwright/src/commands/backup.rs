//! `ship backup`

use crate::utils;
use colored::Colorize;
use shipwright_core::EnvironmentRegistry;
use shipwright_deploy::{BackupManager, resolve_descriptor};
use shipwright_remote::SshExecutor;
use std::path::PathBuf;

pub async fn handle(
    registry: &EnvironmentRegistry,
    name: &str,
    download: bool,
    dest: PathBuf,
    yes: bool,
) -> anyhow::Result<()> {
    let env = registry.activate(name)?;
    let executor = SshExecutor::new(env.ssh_target());
    let descriptor = resolve_descriptor(&executor, &env).await?;

    println!(
        "{}",
        format!("Backing up database '{}' on {}", descriptor.name, env.ssh_target()).bold()
    );

    let gate = utils::make_gate(yes);
    let manager = BackupManager::new(&executor, &*gate);
    let dest = utils::expand_home(dest);
    let local_dest = download.then_some(dest.as_path());

    let outcome = manager.backup(&env, &descriptor, local_dest).await?;

    println!("{} archive: {}", "✓".green(), outcome.archive.cyan());
    if let Some(path) = outcome.downloaded {
        println!("{} downloaded to {}", "✓".green(), path.display().to_string().cyan());
    }
    Ok(())
}
