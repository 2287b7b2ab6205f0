//! Settings resolution with layered merge
//!
//! The `ConfigResolver` loads the user and project settings files and merges
//! them, with the project file overriding the user file.

use std::fs;
use std::path::PathBuf;

use modesync_fs::NormalizedPath;

use super::settings::SettingsFile;
use crate::{Error, Result};

/// Name of the per-project settings file
pub const PROJECT_SETTINGS_FILE: &str = ".modesync.toml";

/// Resolves settings by merging the user and project files
pub struct ConfigResolver {
    /// Project directory holding `.modesync.toml`
    project: NormalizedPath,

    /// Override for the user config directory (used for testing).
    /// When `None`, `dirs::config_dir()/modesync` is used.
    global_config_dir_override: Option<PathBuf>,
}

impl ConfigResolver {
    /// Create a resolver for the given project directory
    ///
    /// Uses the platform-appropriate user config directory:
    /// - Linux: `~/.config/modesync/`
    /// - macOS: `~/Library/Application Support/modesync/`
    /// - Windows: `%APPDATA%\modesync\`
    pub fn new(project: NormalizedPath) -> Self {
        Self {
            project,
            global_config_dir_override: None,
        }
    }

    /// Create a resolver with a custom user config directory.
    pub fn with_global_config_dir(project: NormalizedPath, global_config_dir: PathBuf) -> Self {
        Self {
            project,
            global_config_dir_override: Some(global_config_dir),
        }
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref override_dir) = self.global_config_dir_override {
            return Some(override_dir.clone());
        }
        dirs::config_dir().map(|d| d.join("modesync"))
    }

    fn load_layer(path: &std::path::Path, layer: &str) -> Result<Option<SettingsFile>> {
        if !path.is_file() {
            tracing::debug!(path = %path.display(), layer, "No settings file, skipping");
            return Ok(None);
        }
        tracing::debug!(path = %path.display(), layer, "Loading settings");
        let content = fs::read_to_string(path).map_err(|e| Error::InvalidSettings {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        SettingsFile::parse(&content)
            .map(Some)
            .map_err(|e| Error::InvalidSettings {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    /// Merge the settings layers
    ///
    /// 1. User settings (`<config_dir>/modesync/config.toml`)
    /// 2. Project settings (`<project>/.modesync.toml`)
    ///
    /// Missing files are skipped. A file that fails to parse is an
    /// [`Error::InvalidSettings`].
    pub fn resolve(&self) -> Result<SettingsFile> {
        let mut settings = SettingsFile::default();

        if let Some(global_dir) = self.global_config_dir()
            && let Some(user) = Self::load_layer(&global_dir.join("config.toml"), "user")?
        {
            settings.merge(&user);
        }

        let project_file = self.project_settings_path().to_native();
        if let Some(project) = Self::load_layer(&project_file, "project")? {
            settings.merge(&project);
        }

        Ok(settings)
    }

    pub fn project(&self) -> &NormalizedPath {
        &self.project
    }

    pub fn project_settings_path(&self) -> NormalizedPath {
        self.project.join(PROJECT_SETTINGS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resolver(temp: &TempDir) -> ConfigResolver {
        let project = temp.path().join("project");
        std::fs::create_dir_all(&project).unwrap();
        ConfigResolver::with_global_config_dir(
            NormalizedPath::new(&project),
            temp.path().join("user"),
        )
    }

    #[test]
    fn resolve_returns_empty_when_no_files_exist() {
        let temp = TempDir::new().unwrap();
        let settings = resolver(&temp).resolve().unwrap();
        assert_eq!(settings, SettingsFile::default());
    }

    #[test]
    fn project_file_overrides_user_file() {
        let temp = TempDir::new().unwrap();
        let resolver = resolver(&temp);
        std::fs::create_dir_all(temp.path().join("user")).unwrap();
        std::fs::write(
            temp.path().join("user").join("config.toml"),
            "level = \"strict\"\nstrategy = \"groupings\"\n",
        )
        .unwrap();
        std::fs::write(
            resolver.project_settings_path().to_native(),
            "strategy = \"alphabetical\"\n",
        )
        .unwrap();

        let settings = resolver.resolve().unwrap();
        assert_eq!(settings.level.as_deref(), Some("strict"));
        assert_eq!(settings.strategy.as_deref(), Some("alphabetical"));
    }

    #[test]
    fn invalid_project_file_is_reported_with_path() {
        let temp = TempDir::new().unwrap();
        let resolver = resolver(&temp);
        std::fs::write(resolver.project_settings_path().to_native(), "level = [").unwrap();

        let err = resolver.resolve().unwrap_err();
        assert!(matches!(err, Error::InvalidSettings { .. }));
        assert!(err.is_usage());
    }
}
