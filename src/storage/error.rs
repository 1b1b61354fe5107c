//! Error types for the storage module.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while persisting documents.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File system error (create dir, write, read, etc.)
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A publish date without year, month and day digit groups.
    #[error("cannot derive a directory from publish date '{value}'")]
    InvalidDate {
        /// The offending publish date.
        value: String,
    },
}

impl StorageError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid-date error.
    pub fn invalid_date(value: impl Into<String>) -> Self {
        Self::InvalidDate {
            value: value.into(),
        }
    }
}
