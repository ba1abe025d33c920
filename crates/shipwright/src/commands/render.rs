//! `ship apache` and `ship wsgi`
//!
//! Renders the generated artifacts locally: printed to stdout, or written
//! to a file behind the confirmation gate.

use crate::utils;
use shipwright_core::{
    EnvironmentRegistry, RenderDisposition, TemplateContext, TemplateRenderer,
};
use shipwright_deploy::{facts, pipeline};
use shipwright_remote::SshExecutor;
use std::path::PathBuf;

pub async fn handle_apache(
    registry: &EnvironmentRegistry,
    name: &str,
    output: Option<PathBuf>,
    yes: bool,
) -> anyhow::Result<()> {
    let env = registry.activate(name)?;
    let executor = SshExecutor::new(env.ssh_target());
    let facts = facts::detect(&executor, &env).await?;

    render(
        "apache.conf",
        None,
        &pipeline::apache_context(&env, &facts),
        output,
        yes,
    )
}

pub async fn handle_wsgi(
    registry: &EnvironmentRegistry,
    name: &str,
    output: Option<PathBuf>,
    yes: bool,
) -> anyhow::Result<()> {
    let env = registry.activate(name)?;
    let executor = SshExecutor::new(env.ssh_target());
    let facts = facts::detect(&executor, &env).await?;

    render(
        "wsgi.py",
        env.config().django_variant.clone(),
        &pipeline::wsgi_context(&env, &facts),
        output,
        yes,
    )
}

fn render(
    template: &str,
    variant: Option<String>,
    context: &TemplateContext,
    output: Option<PathBuf>,
    yes: bool,
) -> anyhow::Result<()> {
    let renderer = TemplateRenderer::embedded();
    match output {
        None => {
            let rendered = renderer.render(template, variant.as_deref(), context)?;
            print!("{rendered}");
            Ok(())
        }
        Some(path) => {
            let path = utils::expand_home(path);
            let gate = utils::make_gate(yes);
            let disposition =
                renderer.render_to_file(template, variant.as_deref(), context, &path, &*gate)?;
            if disposition == RenderDisposition::Declined {
                anyhow::bail!("write declined, nothing generated");
            }
            Ok(())
        }
    }
}
