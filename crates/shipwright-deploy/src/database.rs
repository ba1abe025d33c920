//! Database descriptor resolution and MySQL command construction
//!
//! The descriptor is resolved once per run, preferring the environment's
//! own configuration and falling back to reading the deployed project's
//! settings over the wire as JSON.

use crate::error::{DeployError, Result};
use serde::Deserialize;
use shipwright_core::{ActiveEnvironment, DatabaseConfig};
use shipwright_remote::{ExecOptions, Probe, RemoteExecutor, shell_escape};
use tracing::debug;

/// Python one-liner printing the project's default database as JSON.
const PRINT_DATABASE_SETTINGS: &str = "python -c \"import json; from django.conf import settings; d = settings.DATABASES['default']; print(json.dumps({'host': d.get('HOST', ''), 'name': d['NAME'], 'user': d['USER'], 'password': d['PASSWORD']}))\"";

/// Database connection settings fixed for one run.
#[derive(Debug, Clone)]
pub struct DatabaseDescriptor {
    pub host: String,
    pub name: String,
    pub user: String,
    pub password: String,
    pub charset: String,
    pub admin_user: Option<String>,
    pub admin_password: Option<String>,
}

/// Shape of the JSON printed by [`PRINT_DATABASE_SETTINGS`].
#[derive(Debug, Deserialize)]
struct RemoteDatabaseSettings {
    #[serde(default)]
    host: String,
    name: String,
    user: String,
    password: String,
}

impl From<&DatabaseConfig> for DatabaseDescriptor {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            host: config.host.clone(),
            name: config.name.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
            charset: config.charset().to_string(),
            admin_user: config.admin_user.clone(),
            admin_password: config.admin_password.clone(),
        }
    }
}

impl DatabaseDescriptor {
    /// Connection arguments for the project-level account.
    fn client_args(&self) -> String {
        let mut args = String::new();
        if !self.host.is_empty() {
            args.push_str(&format!("-h {} ", shell_escape(&self.host)));
        }
        args.push_str(&format!(
            "-u {} -p{}",
            shell_escape(&self.user),
            shell_escape(&self.password)
        ));
        args
    }

    /// Connection arguments for the administrative account.
    fn admin_args(&self, environment: &str) -> Result<String> {
        let user = self
            .admin_user
            .as_deref()
            .ok_or_else(|| DeployError::AdminCredentialsMissing(environment.to_string()))?;
        let password = self
            .admin_password
            .as_deref()
            .ok_or_else(|| DeployError::AdminCredentialsMissing(environment.to_string()))?;
        let mut args = String::new();
        if !self.host.is_empty() {
            args.push_str(&format!("-h {} ", shell_escape(&self.host)));
        }
        args.push_str(&format!(
            "-u {} -p{}",
            shell_escape(user),
            shell_escape(password)
        ));
        Ok(args)
    }

    /// Probe that is satisfied when the database already exists.
    pub fn exists_probe(&self) -> Probe {
        Probe::CommandSucceeds(format!(
            "mysql {} -e 'use {}'",
            self.client_args(),
            self.name
        ))
    }

    pub fn create_command(&self) -> String {
        format!(
            "mysql {} -e 'CREATE DATABASE {} CHARACTER SET {}'",
            self.client_args(),
            self.name,
            self.charset
        )
    }

    /// Dump the database into `dest_sql`.
    pub fn dump_command(&self, dest_sql: &str) -> String {
        format!(
            "mysqldump {} {} > {}",
            self.client_args(),
            self.name,
            shell_escape(dest_sql)
        )
    }

    /// Drop and recreate the database with administrative credentials.
    pub fn recreate_command(&self, environment: &str) -> Result<String> {
        let args = self.admin_args(environment)?;
        Ok(format!(
            "mysql {args} -e 'DROP DATABASE IF EXISTS {name}; CREATE DATABASE {name} CHARACTER SET {charset}'",
            name = self.name,
            charset = self.charset
        ))
    }

    /// Load a SQL dump with administrative credentials.
    pub fn load_command(&self, environment: &str, sql_path: &str) -> Result<String> {
        let args = self.admin_args(environment)?;
        Ok(format!(
            "mysql {args} {} < {}",
            self.name,
            shell_escape(sql_path)
        ))
    }
}

/// Resolve the descriptor for one run.
///
/// Prefers the configured database; otherwise asks the deployed project
/// for its settings. The result is reused for every database operation in
/// the run.
pub async fn resolve_descriptor(
    executor: &dyn RemoteExecutor,
    env: &ActiveEnvironment,
) -> Result<DatabaseDescriptor> {
    if let Some(config) = &env.config().database {
        debug!(environment = %env.name(), "Using configured database settings");
        return Ok(config.into());
    }

    debug!(environment = %env.name(), "Reading database settings from remote project");
    let options = ExecOptions::new()
        .in_dir(env.project_dir())
        .with_prefix(env.django_prefix())
        .quiet()
        .tolerant();
    let result = executor.execute(PRINT_DATABASE_SETTINGS, &options).await?;
    if !result.succeeded {
        return Err(DeployError::DatabaseUnresolved(env.name().to_string()));
    }

    let settings: RemoteDatabaseSettings = serde_json::from_str(result.output.trim())
        .map_err(|_| DeployError::DatabaseUnresolved(env.name().to_string()))?;
    Ok(DatabaseDescriptor {
        host: settings.host,
        name: settings.name,
        user: settings.user,
        password: settings.password,
        charset: "utf8".to_string(),
        admin_user: None,
        admin_password: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shipwright_core::{EnvironmentConfig, EnvironmentRegistry};
    use shipwright_remote::{CommandOutput, Result as RemoteResult};
    use std::path::Path;

    fn descriptor() -> DatabaseDescriptor {
        DatabaseDescriptor {
            host: String::new(),
            name: "demo_beta".to_string(),
            user: "demo".to_string(),
            password: "secret".to_string(),
            charset: "utf8".to_string(),
            admin_user: Some("root".to_string()),
            admin_password: Some("toor".to_string()),
        }
    }

    #[test]
    fn test_dump_command() {
        let command = descriptor().dump_command("../backup/20240101_beta/demo_beta.sql");
        assert_eq!(
            command,
            "mysqldump -u 'demo' -p'secret' demo_beta > '../backup/20240101_beta/demo_beta.sql'"
        );
    }

    #[test]
    fn test_create_command_includes_charset() {
        let command = descriptor().create_command();
        assert!(command.contains("CREATE DATABASE demo_beta CHARACTER SET utf8"));
    }

    #[test]
    fn test_host_argument_only_when_configured() {
        let mut with_host = descriptor();
        with_host.host = "db.example.com".to_string();
        assert!(with_host.create_command().contains("-h 'db.example.com'"));
        assert!(!descriptor().create_command().contains("-h "));
    }

    #[test]
    fn test_recreate_uses_admin_credentials() {
        let command = descriptor().recreate_command("beta").unwrap();
        assert!(command.contains("-u 'root' -p'toor'"));
        assert!(command.contains("DROP DATABASE IF EXISTS demo_beta"));
    }

    #[test]
    fn test_recreate_without_admin_credentials_fails() {
        let mut descriptor = descriptor();
        descriptor.admin_user = None;
        let err = descriptor.recreate_command("beta").unwrap_err();
        assert!(matches!(err, DeployError::AdminCredentialsMissing(env) if env == "beta"));
    }

    struct SettingsHost {
        json: &'static str,
    }

    #[async_trait]
    impl RemoteExecutor for SettingsHost {
        async fn execute(
            &self,
            _command: &str,
            _options: &ExecOptions,
        ) -> RemoteResult<CommandOutput> {
            Ok(CommandOutput::ok(self.json))
        }

        async fn upload(&self, _local: &Path, _remote: &str) -> RemoteResult<()> {
            Ok(())
        }

        async fn download(&self, _remote: &str, _local: &Path) -> RemoteResult<()> {
            Ok(())
        }

        async fn write_file(&self, _remote_path: &str, _content: &str) -> RemoteResult<()> {
            Ok(())
        }
    }

    fn active_env(database: Option<shipwright_core::DatabaseConfig>) -> ActiveEnvironment {
        let mut registry = EnvironmentRegistry::new();
        registry
            .register(EnvironmentConfig {
                name: "beta".to_string(),
                host: "beta.example.com".to_string(),
                user: Some("deploy".to_string()),
                workon: "/opt/envs".to_string(),
                project: "demo".to_string(),
                settings: "settings_beta".to_string(),
                repository: "git@example.com:demo.git".to_string(),
                database,
                ..Default::default()
            })
            .unwrap();
        registry.activate("beta").unwrap()
    }

    #[tokio::test]
    async fn test_resolve_prefers_configured_database() {
        let executor = SettingsHost { json: "{}" };
        let env = active_env(Some(shipwright_core::DatabaseConfig {
            name: "configured".to_string(),
            user: "demo".to_string(),
            password: "secret".to_string(),
            ..Default::default()
        }));

        let resolved = resolve_descriptor(&executor, &env).await.unwrap();
        assert_eq!(resolved.name, "configured");
    }

    #[tokio::test]
    async fn test_resolve_reads_remote_settings() {
        let executor = SettingsHost {
            json: r#"{"host": "", "name": "demo_beta", "user": "demo", "password": "secret"}"#,
        };
        let resolved = resolve_descriptor(&executor, &active_env(None)).await.unwrap();
        assert_eq!(resolved.name, "demo_beta");
        assert_eq!(resolved.user, "demo");
        assert!(resolved.admin_user.is_none());
    }

    #[tokio::test]
    async fn test_resolve_rejects_bad_json() {
        let executor = SettingsHost { json: "not json" };
        let err = resolve_descriptor(&executor, &active_env(None)).await.unwrap_err();
        assert!(matches!(err, DeployError::DatabaseUnresolved(_)));
    }
}
