//! Command implementations for modesync-cli

pub mod backup;
pub mod settings;
pub mod sync;

pub use backup::{run_backup_list, run_backup_restore};
pub use sync::run_sync;
