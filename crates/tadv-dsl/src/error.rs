//! Error types for loading story files.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for story loading.
pub type DslResult<T> = Result<T, DslError>;

/// Errors that stop a story file from loading at all.
///
/// Problems inside a file that was read successfully are reported as
/// [`crate::Diagnostic`]s instead.
#[derive(Debug, Error)]
pub enum DslError {
    /// The story file does not exist.
    #[error("story file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The story file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
