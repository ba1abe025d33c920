//! Deployment error types

use thiserror::Error;

/// Errors raised by orchestration, database handling and backup/restore.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Provisioning aborted at step '{step}'\n{cause}")]
    ProvisioningAborted { step: String, cause: String },

    #[error("Destructive action declined: {0}")]
    DestructiveActionDeclined(String),

    #[error("Run cancelled before step '{0}'")]
    Cancelled(String),

    #[error("Remote command failed: {command}\n{output}")]
    CommandFailed { command: String, output: String },

    #[error(
        "Database dump failed; partial backup left at '{dir}' for inspection\n{output}"
    )]
    DumpFailed { dir: String, output: String },

    #[error("Backup archive creation failed\n{output}")]
    ArchiveFailed { output: String },

    #[error("Backup archive not found locally or remotely: {0}")]
    ArchiveMissing(String),

    #[error("Invalid backup archive: {0}")]
    InvalidArchive(String),

    #[error("Database drop/recreate failed\n{output}")]
    RecreateFailed { output: String },

    #[error(
        "Schema load failed; the database is left partially loaded, no automatic rollback\n{output}"
    )]
    SchemaLoadFailed { output: String },

    #[error("No database configured for environment '{0}' and remote settings could not be read")]
    DatabaseUnresolved(String),

    #[error("Restore requires administrative database credentials for environment '{0}'")]
    AdminCredentialsMissing(String),

    #[error("Could not determine Python version on '{environment}'\n{detail}")]
    PythonVersionUnknown { environment: String, detail: String },

    #[error(transparent)]
    Core(#[from] shipwright_core::CoreError),

    #[error(transparent)]
    Remote(#[from] shipwright_remote::RemoteError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeployError>;
