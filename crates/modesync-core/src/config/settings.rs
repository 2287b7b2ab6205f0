//! Settings file parsing and the resolved [`SyncSettings`]
//!
//! A settings file is TOML. Every key is optional:
//!
//! ```toml
//! modes_dir = "modes"
//! global_target = "/home/me/.config/Code/User/globalStorage/rooveterinaryinc.roo-cline/settings/custom_modes.yaml"
//! local_target = ".roomodes"
//! backup_dir = "/home/me/.local/share/modesync/backups"
//! level = "standard"
//! strategy = "groupings"
//!
//! [strategies.groupings]
//! active_group = "daily"
//!
//! [strategies.groupings.groups]
//! daily = ["code", "debug"]
//! ```

use std::path::Path;

use modesync_fs::NormalizedPath;
use modesync_meta::{
    AlphabeticalParams, CategoryParams, CustomParams, GroupingsParams, StrategicParams,
    StrategyOverrides, StrategyParams, ValidationLevel,
};
use serde::{Deserialize, Serialize};

use crate::target::TargetSelection;
use crate::{Error, Result};

const ROO_SETTINGS: &str = "Code/User/globalStorage/rooveterinaryinc.roo-cline/settings/custom_modes.yaml";

/// Default global target under the platform config directory.
pub fn default_global_target() -> Option<NormalizedPath> {
    dirs::config_dir().map(|dir| NormalizedPath::new(dir.join(ROO_SETTINGS)))
}

/// Default backup root under the platform data directory.
pub fn default_backup_dir() -> Option<NormalizedPath> {
    dirs::data_local_dir().map(|dir| NormalizedPath::new(dir.join("modesync").join("backups")))
}

/// Per-strategy parameter tables. A table present in a later layer replaces
/// the same table from an earlier layer as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyTables {
    pub strategic: Option<StrategicParams>,
    pub groupings: Option<GroupingsParams>,
    pub alphabetical: Option<AlphabeticalParams>,
    pub category: Option<CategoryParams>,
    pub custom: Option<CustomParams>,
}

/// One parsed settings file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub modes_dir: Option<String>,
    pub global_target: Option<String>,
    pub local_target: Option<String>,
    pub backup_dir: Option<String>,
    pub level: Option<String>,
    pub strategy: Option<String>,
    pub strategies: StrategyTables,
}

impl SettingsFile {
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Merge another file into this one; `other` wins wherever it has a value.
    pub fn merge(&mut self, other: &SettingsFile) {
        fn take(base: &mut Option<String>, other: &Option<String>) {
            if other.is_some() {
                base.clone_from(other);
            }
        }
        take(&mut self.modes_dir, &other.modes_dir);
        take(&mut self.global_target, &other.global_target);
        take(&mut self.local_target, &other.local_target);
        take(&mut self.backup_dir, &other.backup_dir);
        take(&mut self.level, &other.level);
        take(&mut self.strategy, &other.strategy);

        if other.strategies.strategic.is_some() {
            self.strategies.strategic.clone_from(&other.strategies.strategic);
        }
        if other.strategies.groupings.is_some() {
            self.strategies.groupings.clone_from(&other.strategies.groupings);
        }
        if other.strategies.alphabetical.is_some() {
            self.strategies.alphabetical.clone_from(&other.strategies.alphabetical);
        }
        if other.strategies.category.is_some() {
            self.strategies.category.clone_from(&other.strategies.category);
        }
        if other.strategies.custom.is_some() {
            self.strategies.custom.clone_from(&other.strategies.custom);
        }
    }
}

/// Everything a [`SyncSession`](crate::SyncSession) needs, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    pub modes_dir: NormalizedPath,
    /// `None` when the platform has no config directory and nothing was set.
    pub global_target: Option<NormalizedPath>,
    pub local_target: NormalizedPath,
    pub backup_dir: Option<NormalizedPath>,
    pub level: ValidationLevel,
    /// Raw strategy name; checked during session preflight.
    pub strategy: String,
    pub strategies: StrategyParams,
    /// Applied on top of the active strategy's parameters.
    pub overrides: StrategyOverrides,
    pub targets: TargetSelection,
    pub backups: bool,
}

impl SyncSettings {
    /// Built-in defaults for a project directory.
    pub fn defaults(project: &NormalizedPath) -> Self {
        Self {
            modes_dir: project.join("modes"),
            global_target: default_global_target(),
            local_target: project.join(".roomodes"),
            backup_dir: default_backup_dir(),
            level: ValidationLevel::default(),
            strategy: "strategic".to_string(),
            strategies: StrategyParams::default(),
            overrides: StrategyOverrides::default(),
            targets: TargetSelection::default(),
            backups: true,
        }
    }

    /// Apply a merged settings file. Relative paths resolve against `base`.
    pub fn with_file(mut self, file: &SettingsFile, base: &NormalizedPath) -> Result<Self> {
        let resolve = |value: &str| {
            if Path::new(value).is_absolute() {
                NormalizedPath::new(value)
            } else {
                base.join(value)
            }
        };
        if let Some(dir) = &file.modes_dir {
            self.modes_dir = resolve(dir);
        }
        if let Some(target) = &file.global_target {
            self.global_target = Some(resolve(target));
        }
        if let Some(target) = &file.local_target {
            self.local_target = resolve(target);
        }
        if let Some(dir) = &file.backup_dir {
            self.backup_dir = Some(resolve(dir));
        }
        if let Some(level) = &file.level {
            self.level = level.parse().map_err(|e: modesync_meta::Error| Error::usage(e.to_string()))?;
        }
        if let Some(strategy) = &file.strategy {
            self.strategy = strategy.clone();
        }
        if let Some(params) = &file.strategies.strategic {
            self.strategies.strategic = params.clone();
        }
        if let Some(params) = &file.strategies.groupings {
            self.strategies.groupings = params.clone();
        }
        if let Some(params) = &file.strategies.alphabetical {
            self.strategies.alphabetical = params.clone();
        }
        if let Some(params) = &file.strategies.category {
            self.strategies.category = params.clone();
        }
        if let Some(params) = &file.strategies.custom {
            self.strategies.custom = params.clone();
        }
        Ok(self)
    }
}
