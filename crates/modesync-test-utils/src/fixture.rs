//! [`ModesFixture`] builder for sync scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// YAML for a minimal valid mode record with the given slug.
pub fn mode_yaml(slug: &str) -> String {
    format!(
        "slug: {slug}\n\
         name: {slug} mode\n\
         roleDefinition: You handle {slug} work.\n\
         whenToUse: Use for {slug}.\n\
         customInstructions: Keep {slug} tidy.\n\
         groups:\n  - read\n  - edit\n"
    )
}

/// A temporary directory laid out as:
///
/// ```text
/// <root>/
///   modes/          mode record files
///   global/         parent of the global target file
///   project/        parent of the local `.roomodes` target
///   backups/        backup root
/// ```
///
/// # Example
///
/// ```rust,no_run
/// use modesync_test_utils::ModesFixture;
///
/// let fixture = ModesFixture::new();
/// fixture.add_mode("code");
/// fixture.write_mode("hybrid/planner.yaml", "slug: planner\n");
/// assert!(fixture.modes_dir().join("code.yaml").exists());
/// ```
pub struct ModesFixture {
    temp_dir: TempDir,
}

impl Default for ModesFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ModesFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        for dir in ["modes", "global", "project"] {
            fs::create_dir_all(temp_dir.path().join(dir)).unwrap();
        }
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn modes_dir(&self) -> PathBuf {
        self.root().join("modes")
    }

    pub fn project_dir(&self) -> PathBuf {
        self.root().join("project")
    }

    pub fn global_target(&self) -> PathBuf {
        self.root().join("global").join("custom_modes.yaml")
    }

    pub fn local_target(&self) -> PathBuf {
        self.project_dir().join(".roomodes")
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root().join("backups")
    }

    /// Write a valid mode record to `modes/<slug>.yaml`.
    pub fn add_mode(&self, slug: &str) -> PathBuf {
        self.write_mode(&format!("{slug}.yaml"), &mode_yaml(slug))
    }

    /// Write raw content to a path relative to `modes/`, creating directories.
    pub fn write_mode(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.modes_dir().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Seed the global target with raw content.
    pub fn write_global_target(&self, content: &str) {
        fs::write(self.global_target(), content).unwrap();
    }

    /// Seed the local target with raw content.
    pub fn write_local_target(&self, content: &str) {
        fs::write(self.local_target(), content).unwrap();
    }

    /// Read a file, panicking with the path on failure.
    pub fn read(&self, path: impl AsRef<Path>) -> String {
        let path = path.as_ref();
        fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("ModesFixture::read: {}: {}", path.display(), e))
    }

    /// Write a project settings file (`project/.modesync.toml`).
    pub fn write_project_settings(&self, content: &str) -> PathBuf {
        let path = self.project_dir().join(".modesync.toml");
        fs::write(&path, content).unwrap();
        path
    }
}
