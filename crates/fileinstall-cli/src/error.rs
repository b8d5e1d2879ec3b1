//! Error types for fileinstall-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from fileinstall-core
    #[error(transparent)]
    Core(#[from] fileinstall_core::Error),

    /// Error from fileinstall-fs
    #[error(transparent)]
    Fs(#[from] fileinstall_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The Ctrl-C handler could not be installed
    #[error("Cannot install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
