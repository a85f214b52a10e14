//! Error types for save files.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for save operations.
pub type SaveResult<T> = Result<T, SaveError>;

/// Errors that can occur while reading or writing saves.
#[derive(Debug, Error)]
pub enum SaveError {
    /// No save file with this name exists.
    #[error("Save file '{0}' not found.")]
    NotFound(String),

    /// The name is empty or would escape the saves directory.
    #[error("invalid save name: {0:?}")]
    InvalidName(String),

    /// Reading or writing the file failed.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file exists but does not hold a valid save.
    #[error("invalid save data in {}: {source}", path.display())]
    Corrupt {
        /// The unreadable file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// The record could not be encoded.
    #[error("cannot encode save: {0}")]
    Encode(#[from] serde_json::Error),
}
