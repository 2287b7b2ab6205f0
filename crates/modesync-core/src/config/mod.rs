//! Layered settings resolution
//!
//! Settings are merged from these sources, later sources overriding earlier:
//!
//! 1. **Built-in defaults** - see [`SyncSettings::defaults`]
//! 2. **User settings** - `<config_dir>/modesync/config.toml`
//! 3. **Project settings** - `<project>/.modesync.toml`
//!
//! Environment variables and command-line flags are applied on top by the
//! CLI. The engine itself never reads the process environment.
//!
//! # Example
//!
//! ```ignore
//! use modesync_core::config::{ConfigResolver, SyncSettings};
//! use modesync_fs::NormalizedPath;
//!
//! let project = NormalizedPath::new("/path/to/project");
//! let file = ConfigResolver::new(project.clone()).resolve()?;
//! let settings = SyncSettings::defaults(&project).with_file(&file, &project)?;
//! ```

mod resolver;
mod settings;

pub use resolver::{ConfigResolver, PROJECT_SETTINGS_FILE};
pub use settings::{
    SettingsFile, StrategyTables, SyncSettings, default_backup_dir, default_global_target,
};
