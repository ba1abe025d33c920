//! Core error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by configuration loading, environment resolution and
/// template rendering.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Environment already registered: {0}")]
    DuplicateEnvironment(String),

    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("Environment '{environment}' is missing required field '{field}'")]
    MissingRequiredField { environment: String, field: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("KDL parse error: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error(
        "Configuration root not found\nsearch started at: {0}\nhint: run inside a directory containing ship.kdl"
    )]
    ConfigRootNotFound(PathBuf),

    #[error("Unknown template '{name}' (variant: {variant:?})")]
    MissingTemplate { name: String, variant: Option<String> },

    #[error("Template '{template}' references unresolved placeholder '{name}'")]
    UnresolvedPlaceholder { template: String, name: String },

    #[error("Invalid alias '{name}': {reason}")]
    InvalidAlias { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
