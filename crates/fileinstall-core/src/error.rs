//! Error types for fileinstall-core

use std::path::PathBuf;

/// Result type for fileinstall-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fileinstall-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration property holds a value that cannot be interpreted
    #[error("Invalid value {value:?} for property {key}: {reason}")]
    InvalidProperty {
        key: String,
        value: String,
        reason: String,
    },

    /// A resource URL is not of the form `fileinstall:<hash>:<path>`
    #[error("Malformed resource URL: {url}")]
    InvalidUrl { url: String },

    /// A configuration file could not be decoded into a dictionary
    #[error("Cannot decode configuration {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// The monitored root could not be listed
    #[error("Cannot scan {path}: {message}")]
    Scan { path: PathBuf, message: String },

    /// A monitor thread could not be started
    #[error("Failed to start monitor for {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from fileinstall-fs
    #[error(transparent)]
    Fs(#[from] fileinstall_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_property(key: &str, value: &str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidProperty {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
