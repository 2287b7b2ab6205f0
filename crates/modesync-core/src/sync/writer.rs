//! Target writer
//!
//! Renders a merged [`TargetConfig`], diffs it against what is on disk and,
//! unless running dry, backs up the old content and replaces the file through
//! a staged atomic write.

use modesync_blocks::{TargetConfig, handler_for};
use modesync_fs::{NormalizedPath, io};
use serde::Serialize;
use similar::TextDiff;

use crate::Result;
use crate::backup::{BackupManager, TargetBackup};
use crate::target::TargetKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStatus {
    Written,
    /// Rendered content equals the file on disk; nothing was touched
    Unchanged,
    /// Dry run with pending changes
    WouldWrite,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    pub status: WriteStatus,
    /// Unified diff of the file content, `None` when unchanged.
    pub diff: Option<String>,
    pub backup: Option<TargetBackup>,
}

/// Unified diff between two versions of a target file.
pub fn unified_diff(path: &NormalizedPath, old: &str, new: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("{} (current)", path), &format!("{} (synced)", path))
        .to_string()
}

pub struct TargetWriter<'a> {
    dry_run: bool,
    backups: Option<&'a BackupManager>,
}

impl<'a> TargetWriter<'a> {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            backups: None,
        }
    }

    /// Back up non-empty targets before replacing them.
    pub fn with_backups(mut self, manager: &'a BackupManager) -> Self {
        self.backups = Some(manager);
        self
    }

    /// Write `config` to `path`, whose current content is `raw`.
    ///
    /// A missing destination directory fails with
    /// `DestinationUnavailable` in dry runs as well, so both modes report the
    /// same outcome for the same inputs.
    pub fn write(
        &self,
        kind: TargetKind,
        path: &NormalizedPath,
        raw: Option<&str>,
        config: &TargetConfig,
    ) -> Result<WriteOutcome> {
        io::ensure_destination_dir(path)?;
        let handler = handler_for(path);
        let rendered = match raw {
            Some(previous) if !previous.trim().is_empty() => handler.render_over(previous, config)?,
            _ => handler.render(config)?,
        };
        let old = raw.unwrap_or_default();

        if raw == Some(rendered.as_str()) {
            tracing::debug!(path = %path, "Target content unchanged");
            return Ok(WriteOutcome {
                status: WriteStatus::Unchanged,
                diff: None,
                backup: None,
            });
        }
        let diff = Some(unified_diff(path, old, &rendered));

        if self.dry_run {
            tracing::info!(kind = %kind, path = %path, "Dry run, not writing target");
            return Ok(WriteOutcome {
                status: WriteStatus::WouldWrite,
                diff,
                backup: None,
            });
        }

        let backup = match self.backups {
            Some(manager) if !old.trim().is_empty() => {
                Some(manager.create_backup(kind, path, old)?)
            }
            _ => None,
        };

        let staged = io::stage(path, rendered.as_bytes())?;
        staged.commit()?;
        tracing::info!(kind = %kind, path = %path, "Wrote target");

        Ok(WriteOutcome {
            status: WriteStatus::Written,
            diff,
            backup,
        })
    }
}
