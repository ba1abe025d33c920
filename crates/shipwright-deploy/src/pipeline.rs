//! Canonical pipelines
//!
//! One parameterized set of builders replaces per-version copies: the
//! Django variant only selects the WSGI template, and the detected Python
//! version feeds the vhost paths.

use crate::database::DatabaseDescriptor;
use crate::error::Result;
use crate::facts::HostFacts;
use crate::step::{Pipeline, ProvisionStep};
use shipwright_core::{ActiveEnvironment, TemplateContext, TemplateRenderer};
use shipwright_remote::{ExecOptions, Probe};

/// Options for commands run inside the project directory with the
/// virtualenv active.
fn project_opts(env: &ActiveEnvironment) -> ExecOptions {
    ExecOptions::new()
        .in_dir(env.project_dir())
        .with_prefix(env.django_prefix())
}

/// Remote path of the generated Apache vhost file.
pub fn vhost_path(env: &ActiveEnvironment) -> String {
    format!("{}/apache_{}.conf", env.project_dir(), env.name())
}

/// Remote path of the generated WSGI entry point.
pub fn wsgi_path(env: &ActiveEnvironment) -> String {
    format!("{}/wsgi_{}.py", env.project_dir(), env.name())
}

/// Context for the Apache vhost template.
pub fn apache_context(env: &ActiveEnvironment, facts: &HostFacts) -> TemplateContext {
    let project_dir = env.project_dir();
    let host_aliases = match &env.config().host_aliases {
        Some(aliases) if !aliases.trim().is_empty() => format!("ServerAlias {aliases}"),
        _ => String::new(),
    };

    let mut context = TemplateContext::new();
    context.insert("host".to_string(), env.config().host.clone());
    context.insert("host_aliases".to_string(), host_aliases);
    context.insert(
        "static_admin_dir".to_string(),
        format!(
            "{}/{}/django/contrib/admin/media",
            env.venv_dir(),
            facts.site_packages()
        ),
    );
    context.insert("media_dir".to_string(), format!("{project_dir}/media"));
    context.insert("static_dir".to_string(), format!("{project_dir}/static"));
    context.insert("favicon_dir".to_string(), format!("{project_dir}/static/img"));
    context.insert("robots_dir".to_string(), format!("{project_dir}/config"));
    context.insert("wsgi_file".to_string(), wsgi_path(env));
    context.insert("wsgi_dir".to_string(), project_dir);
    context
}

/// Context for the WSGI entry point template.
pub fn wsgi_context(env: &ActiveEnvironment, facts: &HostFacts) -> TemplateContext {
    let mut context = TemplateContext::new();
    context.insert("project".to_string(), env.config().project.clone());
    context.insert("settings".to_string(), env.config().settings.clone());
    context.insert("site_packages".to_string(), facts.site_packages());
    context
}

/// System bootstrap: remote user, hostname and the provisioning stack.
pub fn system_pipeline(env: &ActiveEnvironment) -> Pipeline {
    let sudo = || ExecOptions::new().sudo();
    let host = &env.config().host;
    let user = env.user();

    let mut pipeline = Pipeline::new("bootstrap");
    pipeline.push(
        ProvisionStep::fatal("create-remote-user")
            .probe(Probe::CommandSucceeds(format!("id {user}")))
            .exec(format!("useradd -m -s /bin/bash {user}"), sudo()),
    );
    pipeline.push(
        ProvisionStep::fatal("set-hostname")
            .probe(Probe::OutputEquals {
                command: "hostname".to_string(),
                expected: host.clone(),
            })
            .exec(format!("hostnamectl set-hostname {host}"), sudo()),
    );
    pipeline.push(
        ProvisionStep::fatal("install-python")
            .probe(Probe::CommandSucceeds("command -v virtualenvwrapper.sh || test -e /usr/local/bin/virtualenvwrapper.sh".to_string()))
            .exec(
                "apt-get install -y python python-dev python-pip",
                sudo(),
            )
            .exec("pip install virtualenv virtualenvwrapper", sudo()),
    );
    pipeline.push(
        ProvisionStep::fatal("install-git")
            .probe(Probe::CommandSucceeds("command -v git".to_string()))
            .exec("apt-get install -y git", sudo()),
    );
    pipeline.push(
        ProvisionStep::fatal("install-apache")
            .probe(Probe::CommandSucceeds("command -v apache2ctl".to_string()))
            .exec("apt-get install -y apache2 libapache2-mod-wsgi", sudo()),
    );
    pipeline.push(
        ProvisionStep::fatal("install-mysql")
            .probe(Probe::CommandSucceeds("command -v mysql".to_string()))
            .exec(
                "DEBIAN_FRONTEND=noninteractive apt-get install -y mysql-server mysql-client libmysqlclient-dev",
                sudo(),
            ),
    );
    pipeline
}

/// Project deployment: virtualenv, source checkout, vhost, database,
/// dependencies, then the update procedure.
pub fn deploy_pipeline(
    env: &ActiveEnvironment,
    facts: &HostFacts,
    renderer: &TemplateRenderer,
    descriptor: Option<&DatabaseDescriptor>,
) -> Result<Pipeline> {
    let config = env.config();
    let variant = config.django_variant.as_deref();

    let mut pipeline = Pipeline::new("deploy");

    pipeline.push(
        ProvisionStep::fatal("create-virtualenv")
            .probe(Probe::PathExists(env.venv_dir()))
            .exec(
                format!("mkvirtualenv {}", config.virtualenv()),
                ExecOptions::new().with_prefix(env.virtualenvwrapper_prefix()),
            ),
    );

    pipeline.push(
        ProvisionStep::fatal("clone-repository")
            .probe(Probe::PathExists(env.project_dir()))
            .exec(
                format!("git clone {} {}", config.repository, config.project),
                ExecOptions::new().in_dir(env.venv_dir()),
            ),
    );

    if !config.extra_commands.is_empty() {
        let mut step = ProvisionStep::fatal("extra-commands");
        for command in &config.extra_commands {
            step = step.exec(command.clone(), project_opts(env));
        }
        pipeline.push(step);
    }

    let vhost = renderer.render("apache.conf", None, &apache_context(env, facts))?;
    let wsgi = renderer.render("wsgi.py", variant, &wsgi_context(env, facts))?;
    let site = format!("{}_{}", config.project, env.name());
    pipeline.push(
        ProvisionStep::fatal("configure-vhost")
            .upload(vhost_path(env), vhost)
            .upload(wsgi_path(env), wsgi)
            .exec(
                format!(
                    "ln -sf {} /etc/apache2/sites-available/{site}.conf && a2ensite {site}",
                    vhost_path(env)
                ),
                ExecOptions::new().sudo(),
            ),
    );

    if let Some(descriptor) = descriptor {
        pipeline.push(
            ProvisionStep::fatal("ensure-database")
                .probe(descriptor.exists_probe())
                .exec(descriptor.create_command(), ExecOptions::new().quiet()),
        );
    }

    pipeline.push(
        ProvisionStep::fatal("install-dependencies")
            .probe(Probe::PathMissing(format!(
                "{}/requirements.txt",
                env.project_dir()
            )))
            .exec("pip install -r requirements.txt", project_opts(env)),
    );

    pipeline.extend(update_pipeline(env));
    Ok(pipeline)
}

/// Re-entrant update procedure: refresh the checkout, migrate, restat and
/// reload.
pub fn update_pipeline(env: &ActiveEnvironment) -> Pipeline {
    let branch = env.config().branch();
    let mut pipeline = Pipeline::new("update");

    // Fetching an already-known ref fails on purpose; absence of a remote
    // branch is expected in common configurations.
    pipeline.push(ProvisionStep::tolerant("fetch-branch-ref").exec(
        format!("git fetch origin {branch}:{branch}"),
        project_opts(env).tolerant(),
    ));
    pipeline.push(
        ProvisionStep::fatal("checkout-branch")
            .exec(format!("git checkout {branch}"), project_opts(env)),
    );
    pipeline.push(ProvisionStep::tolerant("pull").exec(
        format!("git pull origin {branch}"),
        project_opts(env).tolerant(),
    ));
    pipeline.push(
        ProvisionStep::fatal("migrate")
            .exec("django-admin.py migrate", project_opts(env)),
    );
    pipeline.push(
        ProvisionStep::fatal("collectstatic")
            .exec("django-admin.py collectstatic --noinput", project_opts(env)),
    );
    pipeline.push(
        ProvisionStep::fatal("touch-wsgi")
            .exec(format!("touch {}", wsgi_path(env)), project_opts(env)),
    );
    pipeline
}
