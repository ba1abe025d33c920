//! Backup and restore of project data
//!
//! A backup is a timestamped directory on the target holding a database
//! dump plus configured extra paths, compressed to `.tar.gz`. Restore
//! reverses the process behind an explicit destructive confirmation.
//! Failed dumps and loads leave their partial artifacts in place; evidence
//! of a failed run is never deleted automatically.

use crate::database::DatabaseDescriptor;
use crate::error::{DeployError, Result};
use shipwright_core::{ActiveEnvironment, ConfirmationGate};
use shipwright_remote::{ExecOptions, RemoteExecutor};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of a successful backup.
#[derive(Debug, Clone)]
pub struct BackupOutcome {
    /// Remote path of the compressed archive.
    pub archive: String,
    /// Local copy, when the download was confirmed.
    pub downloaded: Option<PathBuf>,
}

/// Creates and restores backup archives on one target host.
pub struct BackupManager<'a> {
    executor: &'a dyn RemoteExecutor,
    gate: &'a dyn ConfirmationGate,
}

impl<'a> BackupManager<'a> {
    pub fn new(executor: &'a dyn RemoteExecutor, gate: &'a dyn ConfirmationGate) -> Self {
        Self { executor, gate }
    }

    /// Dump the database and extra paths into a fresh collision-free
    /// directory, compress it, and optionally download the archive.
    pub async fn backup(
        &self,
        env: &ActiveEnvironment,
        descriptor: &DatabaseDescriptor,
        local_dest: Option<&Path>,
    ) -> Result<BackupOutcome> {
        let base = remote_backup_base(env);
        let stamp = chrono::Local::now().format("%Y%m%d");
        let name = self
            .free_backup_name(&base, &format!("{}_{}", stamp, env.name()))
            .await?;
        let dir = format!("{base}/{name}");
        info!(dir = %dir, "Creating backup directory");

        self.run_checked(&format!("mkdir -p {dir}"), ExecOptions::new())
            .await?;

        // Database dump. A failed dump leaves the directory and partial
        // contents in place for inspection.
        let dump = descriptor.dump_command(&format!("{dir}/{}.sql", descriptor.name));
        let result = self
            .executor
            .execute(&dump, &ExecOptions::new().quiet())
            .await?;
        if !result.succeeded {
            return Err(DeployError::DumpFailed {
                dir,
                output: result.output,
            });
        }

        let project_opts = ExecOptions::new()
            .in_dir(env.project_dir())
            .with_prefix(env.django_prefix());
        let auth_dump = format!("django-admin.py dumpdata auth > {dir}/auth.json");
        let result = self
            .executor
            .execute(&auth_dump, &project_opts.clone().tolerant())
            .await?;
        if !result.succeeded {
            warn!(output = %result.output, "auth dump failed, continuing without it");
        }

        for path in &env.config().backup_paths {
            let copy = format!("cp -R {path} {dir}/");
            let result = self
                .executor
                .execute(&copy, &project_opts.clone().tolerant())
                .await?;
            if !result.succeeded {
                warn!(path = %path, "Extra path could not be copied into the backup");
            }
        }

        // Compress from the backup base so member paths stay relative.
        let in_base = ExecOptions::new().in_dir(base.clone()).quiet();
        let result = self
            .executor
            .execute(&format!("tar -czf {name}.tar.gz {name}/"), &in_base)
            .await?;
        if !result.succeeded {
            return Err(DeployError::ArchiveFailed {
                output: result.output,
            });
        }

        let result = self
            .executor
            .execute(&format!("rm -rf {name}/"), &in_base)
            .await?;
        if !result.succeeded {
            warn!(dir = %dir, "Uncompressed backup directory could not be removed");
        }

        let archive = format!("{base}/{name}.tar.gz");
        info!(archive = %archive, "Backup archive created");

        let mut downloaded = None;
        if let Some(dest) = local_dest
            && self.gate.confirm("Download backup archive?", false)
        {
            std::fs::create_dir_all(dest)?;
            let local_path = dest.join(format!("{name}.tar.gz"));
            self.executor.download(&archive, &local_path).await?;
            info!(path = %local_path.display(), "Backup archive downloaded");
            downloaded = Some(local_path);
        }

        Ok(BackupOutcome { archive, downloaded })
    }

    /// Restore a backup archive into the environment's database and
    /// project directory. Destructive; requires explicit confirmation.
    pub async fn restore(
        &self,
        env: &ActiveEnvironment,
        descriptor: &DatabaseDescriptor,
        archive: &str,
    ) -> Result<()> {
        let name = archive.rsplit('/').next().unwrap_or(archive);
        let Some(base_name) = name.strip_suffix(".tar.gz") else {
            return Err(DeployError::InvalidArchive(format!(
                "'{name}' does not end in .tar.gz"
            )));
        };

        let base = remote_backup_base(env);
        let remote_archive = format!("{base}/{name}");

        if !self.remote_exists(&remote_archive).await? {
            // Not on the target yet; upload a local copy when one exists.
            let local = Path::new(archive);
            if !local.exists() {
                return Err(DeployError::ArchiveMissing(archive.to_string()));
            }
            self.run_checked(&format!("mkdir -p {base}"), ExecOptions::new())
                .await?;
            self.executor.upload(local, &remote_archive).await?;
            info!(archive = %remote_archive, "Archive uploaded to target");
        }

        let message = format!(
            "Drop and recreate database '{}' on '{}'? All current data will be lost.",
            descriptor.name,
            env.name()
        );
        if !self.gate.confirm(&message, false) {
            return Err(DeployError::DestructiveActionDeclined(format!(
                "restore of database '{}'",
                descriptor.name
            )));
        }

        let recreate = descriptor.recreate_command(env.name())?;
        let result = self
            .executor
            .execute(&recreate, &ExecOptions::new().quiet())
            .await?;
        if !result.succeeded {
            return Err(DeployError::RecreateFailed {
                output: result.output,
            });
        }

        let in_base = ExecOptions::new().in_dir(base.clone()).quiet();
        let result = self
            .executor
            .execute(&format!("tar -xzf {name}"), &in_base)
            .await?;
        if !result.succeeded {
            return Err(DeployError::CommandFailed {
                command: format!("tar -xzf {name}"),
                output: result.output,
            });
        }

        // Load with administrative credentials; a failed load leaves the
        // database partially loaded and the operator decides how to recover.
        let sql_path = format!("{base}/{base_name}/{}.sql", descriptor.name);
        let load = descriptor.load_command(env.name(), &sql_path)?;
        let result = self
            .executor
            .execute(&load, &ExecOptions::new().quiet())
            .await?;
        if !result.succeeded {
            return Err(DeployError::SchemaLoadFailed {
                output: result.output,
            });
        }

        let project_opts = ExecOptions::new().in_dir(env.project_dir());
        for path in &env.config().backup_paths {
            let leaf = path.rsplit('/').next().unwrap_or(path);
            let parent = match path.rsplit_once('/') {
                Some((parent, _)) => parent,
                None => ".",
            };
            let copy = format!("cp -R {base}/{base_name}/{leaf} {parent}/");
            let result = self
                .executor
                .execute(&copy, &project_opts.clone().tolerant())
                .await?;
            if !result.succeeded {
                warn!(path = %path, "Extra path could not be copied back");
            }
        }

        // Remove the extraction directory only; the archive stays.
        let result = self
            .executor
            .execute(&format!("rm -rf {base_name}/"), &in_base)
            .await?;
        if !result.succeeded {
            warn!(dir = %base_name, "Extraction directory could not be removed");
        }

        info!(archive = %remote_archive, database = %descriptor.name, "Restore finished");
        Ok(())
    }

    /// Find the first backup name that exists neither as a bare directory
    /// nor as a `.tar.gz` archive. Both forms are re-checked for every
    /// candidate index.
    async fn free_backup_name(&self, base: &str, stem: &str) -> Result<String> {
        let mut index = 0;
        loop {
            let candidate = if index == 0 {
                stem.to_string()
            } else {
                format!("{stem}.{index}")
            };
            let dir_taken = self.remote_exists(&format!("{base}/{candidate}")).await?;
            let archive_taken = self
                .remote_exists(&format!("{base}/{candidate}.tar.gz"))
                .await?;
            if !dir_taken && !archive_taken {
                return Ok(candidate);
            }
            index += 1;
        }
    }

    async fn remote_exists(&self, path: &str) -> Result<bool> {
        let result = self
            .executor
            .execute(
                &format!("test -e {}", shipwright_remote::shell_escape(path)),
                &ExecOptions::new().quiet().tolerant(),
            )
            .await?;
        Ok(result.succeeded)
    }

    async fn run_checked(&self, command: &str, options: ExecOptions) -> Result<()> {
        let result = self.executor.execute(command, &options).await?;
        if !result.succeeded {
            return Err(DeployError::CommandFailed {
                command: command.to_string(),
                output: result.output,
            });
        }
        Ok(())
    }
}

/// Absolute backup base directory on the target.
fn remote_backup_base(env: &ActiveEnvironment) -> String {
    let configured = env.config().backup_dir();
    if configured.starts_with('/') {
        configured.to_string()
    } else {
        format!("{}/{}", env.project_dir(), configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseDescriptor;
    use crate::testutil::ScriptedHost;
    use shipwright_core::{AssumeYes, EnvironmentConfig, EnvironmentRegistry, NonInteractive};

    fn active_env() -> ActiveEnvironment {
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
                backup_paths: vec!["media/uploads".to_string()],
                ..Default::default()
            })
            .unwrap();
        registry.activate("beta").unwrap()
    }

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

    fn stamp() -> String {
        chrono::Local::now().format("%Y%m%d").to_string()
    }

    const BASE: &str = "/opt/envs/beta/demo/../backup";

    #[tokio::test]
    async fn test_backup_picks_unsuffixed_name_when_free() {
        let executor = ScriptedHost::new();
        let manager = BackupManager::new(&executor, &NonInteractive);

        let outcome = manager.backup(&active_env(), &descriptor(), None).await.unwrap();
        assert_eq!(outcome.archive, format!("{BASE}/{}_beta.tar.gz", stamp()));
        assert!(outcome.downloaded.is_none());
    }

    #[tokio::test]
    async fn test_backup_skips_colliding_names() {
        // Seed three taken candidates, mixing bare directories and
        // archives; the chosen suffix must be the smallest free integer.
        let stem = format!("{}_beta", stamp());
        let executor = ScriptedHost::with_paths(&[
            &format!("{BASE}/{stem}"),
            &format!("{BASE}/{stem}.1.tar.gz"),
            &format!("{BASE}/{stem}.2"),
        ]);
        let manager = BackupManager::new(&executor, &NonInteractive);

        let outcome = manager.backup(&active_env(), &descriptor(), None).await.unwrap();
        assert_eq!(outcome.archive, format!("{BASE}/{stem}.3.tar.gz"));
    }

    #[tokio::test]
    async fn test_backup_suffix_is_smallest_free_integer() {
        // Seed 0..N consecutive taken names; the next run always picks the
        // first free index.
        let stem = format!("{}_beta", stamp());
        for n in 0..4usize {
            let executor = ScriptedHost::new();
            {
                let mut existing = executor.existing_paths.lock().unwrap();
                for i in 0..n {
                    let name = if i == 0 {
                        stem.clone()
                    } else {
                        format!("{stem}.{i}")
                    };
                    existing.insert(format!("{BASE}/{name}.tar.gz"));
                }
            }
            let manager = BackupManager::new(&executor, &NonInteractive);
            let outcome = manager.backup(&active_env(), &descriptor(), None).await.unwrap();

            let expected = if n == 0 {
                format!("{BASE}/{stem}.tar.gz")
            } else {
                format!("{BASE}/{stem}.{n}.tar.gz")
            };
            assert_eq!(outcome.archive, expected, "with {n} seeded archives");
        }
    }

    #[tokio::test]
    async fn test_backup_dump_failure_leaves_directory() {
        let executor = ScriptedHost::new().fail_on("mysqldump");
        let manager = BackupManager::new(&executor, &NonInteractive);

        let err = manager
            .backup(&active_env(), &descriptor(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::DumpFailed { .. }));

        // No tar, no rm: the partial directory stays for inspection.
        let executed = executor.executed();
        assert!(!executed.iter().any(|c| c.contains("tar -czf")));
        assert!(!executed.iter().any(|c| c.starts_with("rm -rf")));
    }

    #[tokio::test]
    async fn test_backup_runs_dump_extras_and_compression() {
        let executor = ScriptedHost::new();
        let manager = BackupManager::new(&executor, &NonInteractive);

        manager.backup(&active_env(), &descriptor(), None).await.unwrap();

        let executed = executor.executed();
        assert!(executed.iter().any(|c| c.starts_with("mysqldump")));
        assert!(executed.iter().any(|c| c.contains("dumpdata auth")));
        assert!(executed.iter().any(|c| c.contains("cp -R media/uploads")));
        assert!(executed.iter().any(|c| c.contains("tar -czf")));
        assert!(executed.iter().any(|c| c.starts_with("rm -rf")));
    }

    #[tokio::test]
    async fn test_restore_declined_confirmation_touches_nothing() {
        let archive = format!("{}_beta.tar.gz", stamp());
        let executor = ScriptedHost::with_paths(&[&format!("{BASE}/{archive}")]);
        let manager = BackupManager::new(&executor, &NonInteractive);

        let err = manager
            .restore(&active_env(), &descriptor(), &archive)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::DestructiveActionDeclined(_)));

        // The database and the archive were left untouched.
        assert!(executor.executed().is_empty());
    }

    #[tokio::test]
    async fn test_restore_loads_dump_with_admin_credentials() {
        let archive = format!("{}_beta.tar.gz", stamp());
        let executor = ScriptedHost::with_paths(&[&format!("{BASE}/{archive}")]);
        let manager = BackupManager::new(&executor, &AssumeYes);

        manager
            .restore(&active_env(), &descriptor(), &archive)
            .await
            .unwrap();

        let executed = executor.executed();
        assert!(executed.iter().any(|c| c.contains("DROP DATABASE IF EXISTS demo_beta")));
        assert!(executed.iter().any(|c| c.contains("-u 'root' -p'toor'")));
        assert!(executed.iter().any(|c| c.starts_with("tar -xzf")));
        assert!(executed.iter().any(|c| c.contains("demo_beta.sql")));
        // The extraction directory goes away, the archive does not.
        assert!(executed.iter().any(|c| c.starts_with("rm -rf") && !c.contains(".tar.gz")));
    }

    #[tokio::test]
    async fn test_restore_missing_archive_fails() {
        let executor = ScriptedHost::new();
        let manager = BackupManager::new(&executor, &AssumeYes);

        let err = manager
            .restore(&active_env(), &descriptor(), "20240101_beta.tar.gz")
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::ArchiveMissing(_)));
    }

    #[tokio::test]
    async fn test_restore_rejects_non_archive_name() {
        let executor = ScriptedHost::new();
        let manager = BackupManager::new(&executor, &AssumeYes);

        let err = manager
            .restore(&active_env(), &descriptor(), "notanarchive.zip")
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::InvalidArchive(_)));
    }
}
