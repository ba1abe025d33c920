//! Remote execution error types

use thiserror::Error;

/// Transport-level failures.
///
/// A remote command that runs and exits non-zero is not an error here;
/// that outcome is reported through `CommandOutput`. These variants cover
/// the cases where the command could not be run at all.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Failed to launch '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("File transfer failed: {0}")]
    TransferFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RemoteError>;
