use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for version-machine operations
#[derive(Error, Debug)]
pub enum VersionMachineError {
    #[error("Invalid increment type: '{0}' (expected one of MAJOR, MINOR, PATCH, PHASE)")]
    InvalidIncrement(String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Dirty files in project. Use --force if you wish to ignore.")]
    DirtyTree,

    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Target '{target}' failed on {}: {source}", .path.display())]
    TargetIo {
        target: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Lock file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience type alias for Results in version-machine
pub type Result<T> = std::result::Result<T, VersionMachineError>;

impl VersionMachineError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        VersionMachineError::Config(msg.into())
    }

    /// Create a missing-configuration error with context
    pub fn missing_configuration(msg: impl Into<String>) -> Self {
        VersionMachineError::MissingConfiguration(msg.into())
    }

    /// Create an invalid-version error with context
    pub fn invalid_version(msg: impl Into<String>) -> Self {
        VersionMachineError::InvalidVersion(msg.into())
    }

    /// Create a lock error with context
    pub fn lock(msg: impl Into<String>) -> Self {
        VersionMachineError::Lock(msg.into())
    }

    /// Wrap an I/O failure on a specific target
    pub fn target_io(
        target: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        VersionMachineError::TargetIo {
            target: target.into(),
            path: path.into(),
            source,
        }
    }
}
