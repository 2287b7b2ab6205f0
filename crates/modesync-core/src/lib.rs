//! Sync engine for modesync
//!
//! Sits between the record-level crates and the CLI:
//!
//! ```text
//!                  modesync-cli
//!                       |
//!                 modesync-core
//!                       |
//!       +---------------+---------------+
//!       |               |               |
//! modesync-fs    modesync-meta   modesync-blocks
//! ```
//!
//! - **Strategy resolution**: valid records plus a named policy give an ordered [`SyncPlan`]
//! - **Merge**: a plan is merged into each target without touching foreign entries
//! - **Writing**: targets are diffed, backed up and replaced atomically, or only diffed in a dry run
//! - **Settings**: layered TOML settings resolved into [`SyncSettings`]
//! - **Session**: [`SyncSession`] runs the pipeline and returns a [`SyncReport`]
//!
//! # Example
//!
//! ```ignore
//! use modesync_core::{RunMode, SyncSession, SyncSettings};
//! use modesync_fs::NormalizedPath;
//!
//! let settings = SyncSettings::defaults(&NormalizedPath::new("."));
//! let report = SyncSession::new(settings).run(RunMode::Sync { dry_run: true })?;
//! println!("{}", report.status);
//! ```

pub mod backup;
pub mod config;
pub mod error;
pub mod sync;
pub mod target;

pub use backup::{BackupManager, BackupMetadata, TargetBackup};
pub use config::{ConfigResolver, PROJECT_SETTINGS_FILE, SettingsFile, SyncSettings};
pub use error::{Error, Result};
pub use sync::{
    Disposition, MergeResult, PlanNote, RecordReport, RunMode, RunStatus, SessionState,
    SlugChange, SyncPlan, SyncReport, SyncSession, TargetReport, TargetStatus, Transition, merge,
    resolve,
};
pub use target::{TargetKind, TargetSelection};
