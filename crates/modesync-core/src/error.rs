//! Error types for modesync-core

use std::path::PathBuf;

/// Result type for modesync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in modesync-core operations
///
/// Expected per-record and per-target failures are reported as values in a
/// [`SyncReport`](crate::SyncReport). Anything returned as an `Error` either
/// aborts a run before discovery (a usage error) or was not expected at all.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad arguments or settings detected before any work began
    #[error("{message}")]
    Usage { message: String },

    /// A settings file could not be parsed
    #[error("Invalid settings file {path}: {message}")]
    InvalidSettings { path: PathBuf, message: String },

    /// A selected target exists but cannot be read
    #[error("Cannot read target {path}: {reason}")]
    TargetUnreadable { path: PathBuf, reason: String },

    /// No backup with the requested number exists
    #[error("No backup found for the {kind} target{}", .number.map(|n| format!(" with number {}", n)).unwrap_or_default())]
    BackupNotFound { kind: String, number: Option<u32> },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from modesync-fs
    #[error(transparent)]
    Fs(#[from] modesync_fs::Error),

    /// Metadata error from modesync-meta
    #[error(transparent)]
    Meta(#[from] modesync_meta::Error),

    /// Target document error from modesync-blocks
    #[error(transparent)]
    Blocks(#[from] modesync_blocks::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Whether this error is the caller's fault (bad path, argument or settings).
    pub fn is_usage(&self) -> bool {
        match self {
            Self::Usage { .. }
            | Self::InvalidSettings { .. }
            | Self::TargetUnreadable { .. }
            | Self::BackupNotFound { .. } => true,
            Self::Meta(inner) => !matches!(inner, modesync_meta::Error::Fs(_)),
            _ => false,
        }
    }
}
