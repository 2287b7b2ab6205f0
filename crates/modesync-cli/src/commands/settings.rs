//! Turns command-line paths into resolved [`SyncSettings`]
//!
//! Settings files are layered by [`ConfigResolver`]; environment variables
//! and flags arrive through clap and are applied last.

use std::path::Path;

use modesync_core::{ConfigResolver, SyncSettings};
use modesync_fs::NormalizedPath;

use crate::cli::PathArgs;
use crate::error::Result;

/// Relative paths given on the command line resolve against `cwd`.
pub(crate) fn absolute(cwd: &Path, path: &Path) -> NormalizedPath {
    if path.is_absolute() {
        NormalizedPath::new(path)
    } else {
        NormalizedPath::new(cwd.join(path))
    }
}

/// Resolve settings for a command run from `cwd`.
pub fn load_settings(cwd: &Path, paths: &PathArgs) -> Result<SyncSettings> {
    let project = match &paths.project {
        Some(dir) => absolute(cwd, dir),
        None => NormalizedPath::new(cwd),
    };

    let resolver = match &paths.config_dir {
        Some(dir) => ConfigResolver::with_global_config_dir(project.clone(), absolute(cwd, dir).to_native()),
        None => ConfigResolver::new(project.clone()),
    };
    let file = resolver.resolve()?;
    let mut settings = SyncSettings::defaults(&project).with_file(&file, &project)?;

    if let Some(path) = &paths.global_target {
        settings.global_target = Some(absolute(cwd, path));
    }
    if let Some(path) = &paths.local_target {
        settings.local_target = absolute(cwd, path);
    }
    if let Some(dir) = &paths.backup_dir {
        settings.backup_dir = Some(absolute(cwd, dir));
    }

    tracing::debug!(
        project = %project,
        modes_dir = %settings.modes_dir,
        local_target = %settings.local_target,
        "Resolved settings"
    );
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn isolated(temp: &TempDir) -> PathArgs {
        PathArgs {
            config_dir: Some(temp.path().join("user")),
            ..PathArgs::default()
        }
    }

    #[test]
    fn project_defaults_to_cwd() {
        let temp = TempDir::new().unwrap();
        let settings = load_settings(temp.path(), &isolated(&temp)).unwrap();
        assert_eq!(settings.modes_dir, NormalizedPath::new(temp.path().join("modes")));
        assert_eq!(settings.local_target, NormalizedPath::new(temp.path().join(".roomodes")));
    }

    #[test]
    fn flags_override_project_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(".modesync.toml"),
            "local_target = \"from-file.yaml\"\nlevel = \"strict\"\n",
        )
        .unwrap();

        let mut paths = isolated(&temp);
        let settings = load_settings(temp.path(), &paths).unwrap();
        assert_eq!(settings.local_target, NormalizedPath::new(temp.path().join("from-file.yaml")));

        paths.local_target = Some("flag.yaml".into());
        let settings = load_settings(temp.path(), &paths).unwrap();
        assert_eq!(settings.local_target, NormalizedPath::new(temp.path().join("flag.yaml")));
        assert_eq!(settings.level, modesync_meta::ValidationLevel::Strict);
    }

    #[test]
    fn broken_project_file_is_a_usage_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".modesync.toml"), "strategy = [").unwrap();
        let err = load_settings(temp.path(), &isolated(&temp)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
