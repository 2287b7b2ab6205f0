//! Error types for modesync-meta

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] modesync_fs::Error),

    #[error("Modes directory not found: {path}")]
    ModesDirNotFound { path: PathBuf },

    #[error("Modes root is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Unknown strategy '{name}' (expected strategic, groupings, alphabetical, category or custom)")]
    UnknownStrategy { name: String },

    #[error("Invalid validation level '{value}' (expected strict, standard or permissive)")]
    InvalidLevel { value: String },

    #[error("Groupings policy sets both active_group and active_groups; choose one")]
    ConflictingActiveGroups,

    #[error("Groupings policy references unknown group '{name}'")]
    UnknownGroup { name: String },
}
