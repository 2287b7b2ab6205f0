//! Backup list and restore commands

use std::path::Path;

use colored::Colorize;
use modesync_core::{BackupManager, SyncSettings, TargetBackup, TargetKind};
use modesync_fs::NormalizedPath;

use super::settings::load_settings;
use crate::cli::PathArgs;
use crate::error::{CliError, Result};

fn manager(settings: &SyncSettings) -> Result<BackupManager> {
    settings
        .backup_dir
        .clone()
        .map(BackupManager::new)
        .ok_or_else(|| CliError::user("no backup directory; pass --backup-dir or set MODESYNC_BACKUP_DIR"))
}

fn target_path(settings: &SyncSettings, kind: TargetKind) -> Option<NormalizedPath> {
    match kind {
        TargetKind::Global => settings.global_target.clone(),
        TargetKind::Local => Some(settings.local_target.clone()),
    }
}

/// List backups of both target kinds.
pub fn run_backup_list(cwd: &Path, paths: &PathArgs, json: bool) -> Result<()> {
    let settings = load_settings(cwd, paths)?;
    let manager = manager(&settings)?;

    let mut backups: Vec<TargetBackup> = Vec::new();
    for kind in [TargetKind::Global, TargetKind::Local] {
        if let Some(target) = target_path(&settings, kind) {
            backups.extend(manager.list_backups(kind, &target)?);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&backups)?);
        return Ok(());
    }

    println!("{} {}", "Backups in".bold(), manager.backups_dir().as_str().cyan());
    if backups.is_empty() {
        println!("  {}", "None".dimmed());
        return Ok(());
    }
    for kind in [TargetKind::Global, TargetKind::Local] {
        let of_kind: Vec<_> = backups.iter().filter(|b| b.target == kind).collect();
        if of_kind.is_empty() {
            continue;
        }
        println!("{}:", kind.as_str().bold());
        for backup in of_kind {
            println!("  {} #{} {}", "+".green(), backup.number, backup.path.as_str().dimmed());
        }
    }
    Ok(())
}

/// Restore the given (or latest) backup over its target.
pub fn run_backup_restore(
    cwd: &Path,
    paths: &PathArgs,
    kind: TargetKind,
    number: Option<u32>,
) -> Result<()> {
    let settings = load_settings(cwd, paths)?;
    let manager = manager(&settings)?;
    let target = target_path(&settings, kind).ok_or_else(|| {
        CliError::user("no global target configured; pass --global-target or set MODESYNC_GLOBAL_TARGET")
    })?;

    let backup = manager.restore_backup(kind, &target, number)?;
    println!(
        "{} Restored {} target {} from backup #{}",
        "OK".green().bold(),
        kind,
        target.as_str().cyan(),
        backup.number
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn paths(temp: &TempDir) -> PathArgs {
        PathArgs {
            config_dir: Some(temp.path().join("user")),
            global_target: Some(temp.path().join("custom_modes.yaml")),
            backup_dir: Some(temp.path().join("backups")),
            ..PathArgs::default()
        }
    }

    #[test]
    fn restore_latest_backup() {
        let temp = TempDir::new().unwrap();
        let target = NormalizedPath::new(temp.path().join("custom_modes.yaml"));
        let manager = BackupManager::new(NormalizedPath::new(temp.path().join("backups")));
        manager.create_backup(TargetKind::Global, &target, "old\n").unwrap();
        fs::write(target.to_native(), "new\n").unwrap();

        run_backup_restore(temp.path(), &paths(&temp), TargetKind::Global, None).unwrap();

        assert_eq!(fs::read_to_string(target.to_native()).unwrap(), "old\n");
    }

    #[test]
    fn restore_without_backups_is_a_usage_error() {
        let temp = TempDir::new().unwrap();
        let err = run_backup_restore(temp.path(), &paths(&temp), TargetKind::Global, Some(4))
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
