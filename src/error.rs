//! Error taxonomy for the translation pipeline.

use crate::mt::MtError;
use std::path::PathBuf;

/// Pipeline-level error type.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Provider not configured, invalid settings, or a target equal to the source locale.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Source resource for the configured source locale is missing.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// A dotted path needs an existing leaf to act as a branch, or the reverse.
    #[error("Structural conflict at '{path}'")]
    StructuralConflict { path: String },

    /// Translation provider failure.
    #[error("Provider error: {0}")]
    Provider(#[from] MtError),

    /// Reading or writing a resource failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A resource is not valid JSON, or its root is not an object.
    #[error("Invalid resource {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// The run was cancelled between batches.
    #[error("Operation cancelled")]
    Cancelled,
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        SyncError::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Result type for pipeline operations.
pub type SyncResult<T> = Result<T, SyncError>;
