//! Error types for modesync-fs

use std::path::PathBuf;

/// Result type for modesync-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in modesync-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Failed to serialize {format} for {path}: {message}")]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    /// The directory that should hold a file is missing or not writable
    #[error("Destination unavailable: {path} ({reason})")]
    DestinationUnavailable { path: PathBuf, reason: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn destination_unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DestinationUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error means the file simply does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
