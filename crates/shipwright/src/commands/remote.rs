//! `ship remote`, `ship status`, `ship python`
//!
//! One-off commands in the project directory with the virtualenv active.

use colored::Colorize;
use shipwright_core::{ActiveEnvironment, AliasTable, EnvironmentRegistry};
use shipwright_deploy::facts;
use shipwright_remote::{ExecOptions, RemoteExecutor, SshExecutor};

fn project_opts(env: &ActiveEnvironment) -> ExecOptions {
    ExecOptions::new()
        .in_dir(env.project_dir())
        .with_prefix(env.django_prefix())
}

pub async fn handle_remote(
    registry: &EnvironmentRegistry,
    name: &str,
    command: &str,
) -> anyhow::Result<()> {
    let env = registry.activate(name)?;
    let executor = SshExecutor::new(env.ssh_target());

    let aliases = AliasTable::with_defaults();
    let command = if command.trim().is_empty() {
        aliases.expand("gs")
    } else {
        aliases.expand(command)
    };

    println!("{} {}", "$".dimmed(), command.cyan());
    let result = executor.execute(&command, &project_opts(&env)).await?;
    if !result.output.trim().is_empty() {
        println!("{}", result.output.trim_end());
    }
    if !result.succeeded {
        anyhow::bail!("remote command failed on '{}'", env.name());
    }
    Ok(())
}

pub async fn handle_status(registry: &EnvironmentRegistry, name: &str) -> anyhow::Result<()> {
    let aliases = AliasTable::with_defaults();
    let command = format!("{} && echo '' && git status", aliases.expand("glogg -n 20"));
    handle_remote_raw(registry, name, &command).await
}

async fn handle_remote_raw(
    registry: &EnvironmentRegistry,
    name: &str,
    command: &str,
) -> anyhow::Result<()> {
    let env = registry.activate(name)?;
    let executor = SshExecutor::new(env.ssh_target());

    let result = executor.execute(command, &project_opts(&env)).await?;
    if !result.output.trim().is_empty() {
        println!("{}", result.output.trim_end());
    }
    if !result.succeeded {
        anyhow::bail!("remote command failed on '{}'", env.name());
    }
    Ok(())
}

pub async fn handle_python(registry: &EnvironmentRegistry, name: &str) -> anyhow::Result<()> {
    let env = registry.activate(name)?;
    let executor = SshExecutor::new(env.ssh_target());

    let version = facts::detect_python_version(&executor, &env).await?;
    println!(
        "Python version on virtualenv {}: {}",
        env.name().cyan(),
        version.bold()
    );
    Ok(())
}
