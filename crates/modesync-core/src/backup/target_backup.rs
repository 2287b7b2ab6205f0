//! Target backup implementation
//!
//! Handles creating, listing, and restoring numbered target backups.

use std::fs;

use chrono::{DateTime, Utc};
use modesync_fs::{ConfigStore, NormalizedPath, io};
use serde::{Deserialize, Serialize};

use crate::target::TargetKind;
use crate::{Error, Result};

/// Metadata for the latest backup of one target kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub target: TargetKind,
    /// Number of the most recent backup
    pub latest: u32,
    /// The target file that was backed up
    pub original: String,
    pub created: DateTime<Utc>,
}

/// One backup file on disk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetBackup {
    pub target: TargetKind,
    pub number: u32,
    pub path: NormalizedPath,
}

/// Manages numbered target backups under one backup root
pub struct BackupManager {
    backups_dir: NormalizedPath,
    store: ConfigStore,
}

impl BackupManager {
    pub fn new(backups_dir: NormalizedPath) -> Self {
        Self {
            backups_dir,
            store: ConfigStore::new(),
        }
    }

    pub fn backups_dir(&self) -> &NormalizedPath {
        &self.backups_dir
    }

    fn kind_dir(&self, kind: TargetKind) -> NormalizedPath {
        self.backups_dir.join(kind.as_str())
    }

    fn metadata_path(&self, kind: TargetKind) -> NormalizedPath {
        self.kind_dir(kind).join("metadata.toml")
    }

    /// `(prefix, suffix)` of backup names for a target: `custom_modes_` and
    /// `.yaml` for `custom_modes.yaml`, `roomodes_` and nothing for `.roomodes`.
    fn name_parts(target: &NormalizedPath) -> (String, String) {
        let name = target.file_name().unwrap_or("target");
        let stem = target.file_stem().unwrap_or(name).trim_start_matches('.');
        let suffix = target
            .extension()
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        (format!("{}_", stem), suffix)
    }

    fn backup_number(file_name: &str, prefix: &str, suffix: &str) -> Option<u32> {
        file_name
            .strip_prefix(prefix)?
            .strip_suffix(suffix)?
            .parse()
            .ok()
    }

    /// Read the metadata of a target kind, if any backup was made.
    pub fn get_metadata(&self, kind: TargetKind) -> Result<Option<BackupMetadata>> {
        let path = self.metadata_path(kind);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.store.load(&path)?))
    }

    /// All backups of a target kind, oldest first.
    ///
    /// Only files named after `target` are considered, so backups of a
    /// previously configured target file with another name are ignored.
    pub fn list_backups(&self, kind: TargetKind, target: &NormalizedPath) -> Result<Vec<TargetBackup>> {
        let dir = self.kind_dir(kind);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let (prefix, suffix) = Self::name_parts(target);
        let mut backups = Vec::new();
        for entry in fs::read_dir(dir.to_native())? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(number) = Self::backup_number(&name, &prefix, &suffix) {
                backups.push(TargetBackup {
                    target: kind,
                    number,
                    path: dir.join(&name),
                });
            }
        }
        backups.sort_by_key(|b| b.number);
        Ok(backups)
    }

    /// Copy `content` (the current content of `target`) into the next backup slot.
    pub fn create_backup(
        &self,
        kind: TargetKind,
        target: &NormalizedPath,
        content: &str,
    ) -> Result<TargetBackup> {
        let dir = self.kind_dir(kind);
        fs::create_dir_all(dir.to_native())?;

        let number = self
            .list_backups(kind, target)?
            .last()
            .map_or(1, |b| b.number + 1);
        let (prefix, suffix) = Self::name_parts(target);
        let path = dir.join(&format!("{}{}{}", prefix, number, suffix));
        io::write_text(&path, content)?;

        let metadata = BackupMetadata {
            target: kind,
            latest: number,
            original: target.as_str().to_string(),
            created: Utc::now(),
        };
        self.store.save(&self.metadata_path(kind), &metadata)?;

        tracing::info!(kind = %kind, number, path = %path, "Backed up target");
        Ok(TargetBackup {
            target: kind,
            number,
            path,
        })
    }

    /// Restore backup `number` (or the latest) over `target`, atomically.
    pub fn restore_backup(
        &self,
        kind: TargetKind,
        target: &NormalizedPath,
        number: Option<u32>,
    ) -> Result<TargetBackup> {
        let backups = self.list_backups(kind, target)?;
        let backup = match number {
            Some(n) => backups.into_iter().find(|b| b.number == n),
            None => backups.into_iter().last(),
        }
        .ok_or_else(|| Error::BackupNotFound {
            kind: kind.as_str().to_string(),
            number,
        })?;

        let content = io::read_text(&backup.path)?;
        io::write_text(target, &content)?;
        tracing::info!(kind = %kind, number = backup.number, "Restored target from backup");
        Ok(backup)
    }
}
