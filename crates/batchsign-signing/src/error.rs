//! Error types for signing runs

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for signing operations
pub type Result<T> = std::result::Result<T, SigningError>;

/// Errors that abort a signing run
#[derive(Debug, Error)]
pub enum SigningError {
    /// Every sign attempt for a file failed or was skipped
    #[error("Failed to sign '{}'.", path.display())]
    RetriesExhausted { path: PathBuf },

    /// Missing input or invalid configuration
    #[error(transparent)]
    Core(#[from] batchsign_core::CoreError),

    /// Directory traversal failed
    #[error("Failed to enumerate files: {0}")]
    Enumeration(#[from] walkdir::Error),
}
