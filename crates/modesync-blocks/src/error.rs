//! Error types for modesync-blocks

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] modesync_fs::Error),

    #[error("Failed to parse {format} target: {message}")]
    Parse { format: &'static str, message: String },

    #[error("Malformed target document: {message}")]
    Malformed { message: String },

    #[error("Failed to render {format} target: {message}")]
    Render { format: &'static str, message: String },

    #[error("Unreadable target {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}
