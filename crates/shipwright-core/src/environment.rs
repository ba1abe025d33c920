//! Environment registry and per-run activation
//!
//! An [`EnvironmentConfig`] describes one deployment target. Configs are
//! registered once at load time and never mutated afterwards; a run obtains
//! an [`ActiveEnvironment`] through [`EnvironmentRegistry::activate`], which
//! fills in run-scoped defaults such as the effective remote user.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Location of the virtualenvwrapper entry script on the target host.
pub const VIRTUALENVWRAPPER_SCRIPT: &str = "/usr/local/bin/virtualenvwrapper.sh";

/// Database connection settings for an environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub name: String,
    pub user: String,
    pub password: String,

    /// Character set used when (re)creating the database.
    pub charset: Option<String>,

    /// Administrative credentials used by restore, so a restore does not
    /// depend on the project's own possibly-revoked account.
    pub admin_user: Option<String>,
    pub admin_password: Option<String>,
}

impl DatabaseConfig {
    pub fn charset(&self) -> &str {
        self.charset.as_deref().unwrap_or("utf8")
    }
}

/// One named deployment target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Unique key, e.g. "beta" or "production".
    pub name: String,

    /// Target host address. Required before activation.
    pub host: String,

    /// Remote user. Defaults to the invoking local user at activation.
    pub user: Option<String>,

    /// Root directory holding virtualenvs on the target (WORKON_HOME).
    pub workon: String,

    /// Virtualenv name. Defaults to the environment name.
    pub virtualenv: Option<String>,

    /// Django project identifier (directory and package name).
    pub project: String,

    /// Settings module name inside the project package.
    pub settings: String,

    /// Git repository URL the project is cloned from.
    pub repository: String,

    /// Branch deployed on this environment.
    pub branch: Option<String>,

    /// Extra names for the vhost ServerAlias line.
    pub host_aliases: Option<String>,

    /// Template variant for the WSGI entry point, e.g. "django1.6".
    pub django_variant: Option<String>,

    /// Commands run inside the project directory after clone/update.
    pub extra_commands: Vec<String>,

    /// Paths (relative to the project directory) included in backups.
    pub backup_paths: Vec<String>,

    /// Directory (relative to the project directory) where backup
    /// archives are created on the target.
    pub backup_dir: Option<String>,

    pub database: Option<DatabaseConfig>,
}

impl EnvironmentConfig {
    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or("master")
    }

    pub fn virtualenv(&self) -> &str {
        self.virtualenv.as_deref().unwrap_or(&self.name)
    }

    pub fn backup_dir(&self) -> &str {
        self.backup_dir.as_deref().unwrap_or("../backup")
    }
}

/// An environment resolved for one orchestration run.
///
/// Wraps the immutable config together with run-scoped derived fields.
/// Never shared across runs; command construction reads from here only.
#[derive(Debug, Clone)]
pub struct ActiveEnvironment {
    config: EnvironmentConfig,
    user: String,
}

impl ActiveEnvironment {
    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Effective remote user for this run.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// `user@host` target accepted by ssh and scp.
    pub fn ssh_target(&self) -> String {
        format!("{}@{}", self.user, self.config.host)
    }

    /// Absolute virtualenv directory on the target.
    pub fn venv_dir(&self) -> String {
        format!("{}/{}", self.config.workon, self.config.virtualenv())
    }

    /// Absolute project directory on the target.
    pub fn project_dir(&self) -> String {
        format!("{}/{}", self.venv_dir(), self.config.project)
    }

    /// Dotted settings module, e.g. "demo.settings_beta".
    pub fn settings_module(&self) -> String {
        format!("{}.{}", self.config.project, self.config.settings)
    }

    /// Shell prefix activating the virtualenv with Django variables set.
    pub fn django_prefix(&self) -> String {
        let venv = self.venv_dir();
        format!(
            "export PYTHONPATH={venv}:{project_dir} DJANGO_SETTINGS_MODULE={settings} && source {venv}/bin/activate",
            project_dir = self.project_dir(),
            settings = self.settings_module(),
        )
    }

    /// Shell prefix making virtualenvwrapper commands available.
    pub fn virtualenvwrapper_prefix(&self) -> String {
        format!(
            "export WORKON_HOME={} && source {}",
            self.config.workon, VIRTUALENVWRAPPER_SCRIPT
        )
    }
}

/// Holds all registered environments, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentRegistry {
    environments: HashMap<String, EnvironmentConfig>,
}

impl EnvironmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a configuration under its name.
    pub fn register(&mut self, config: EnvironmentConfig) -> Result<()> {
        if self.environments.contains_key(&config.name) {
            return Err(CoreError::DuplicateEnvironment(config.name));
        }
        self.environments.insert(config.name.clone(), config);
        Ok(())
    }

    /// Look up a registered configuration.
    pub fn resolve(&self, name: &str) -> Result<&EnvironmentConfig> {
        self.environments
            .get(name)
            .ok_or_else(|| CoreError::UnknownEnvironment(name.to_string()))
    }

    /// Resolve and establish run-scoped derived fields.
    pub fn activate(&self, name: &str) -> Result<ActiveEnvironment> {
        let config = self.resolve(name)?.clone();
        if config.host.trim().is_empty() {
            return Err(CoreError::MissingRequiredField {
                environment: config.name,
                field: "host".to_string(),
            });
        }
        let user = match &config.user {
            Some(user) => user.clone(),
            None => local_user(),
        };
        Ok(ActiveEnvironment { config, user })
    }

    /// Registered environment names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.environments.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnvironmentConfig> {
        self.environments.values()
    }
}

/// Name of the invoking local user, used as the remote-user default.
fn local_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "root".to_string())
}
