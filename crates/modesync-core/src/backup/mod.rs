//! Numbered backups of target files
//!
//! Before a sync replaces a non-empty target, its previous content is copied
//! to `<backup_dir>/<global|local>/<stem>_<N>.<ext>`, where `N` is one more
//! than the highest number already present. Each kind directory carries a
//! `metadata.toml` describing the latest backup.

mod target_backup;

pub use target_backup::{BackupManager, BackupMetadata, TargetBackup};
