//! Filesystem primitives for modesync
//!
//! Provides normalized paths, staged atomic writes, content checksums and a
//! format-detecting config store shared by every other crate in the workspace.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use checksum::compute_content_checksum;
pub use config::{ConfigStore, Format};
pub use error::{Error, Result};
pub use io::StagedWrite;
pub use path::NormalizedPath;
