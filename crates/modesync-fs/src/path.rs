//! Normalized path handling for cross-platform compatibility

use std::path::{Path, PathBuf};

/// A path normalized to use forward slashes internally.
///
/// Mode files and target configs are addressed through this type so that
/// reports and ownership bookkeeping print the same path on every platform.
/// Conversion to a native `PathBuf` happens only at I/O boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy();
        Self {
            inner: raw.replace('\\', "/"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        if self.inner.is_empty() {
            return Self { inner: segment };
        }
        let joined = if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment)
        } else {
            format!("{}/{}", self.inner, segment)
        };
        Self { inner: joined }
    }

    /// Get the parent directory.
    ///
    /// A bare file name has the current directory as its parent.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(0) => Some(Self { inner: "/".into() }),
            Some(idx) => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            None if trimmed.is_empty() => None,
            None => Some(Self { inner: ".".into() }),
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|n| !n.is_empty())
    }

    /// The file name without its final extension.
    ///
    /// Dotfiles such as `.roomodes` are their own stem.
    pub fn file_stem(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rfind('.') {
            Some(idx) if idx > 0 => Some(&name[..idx]),
            _ => Some(name),
        }
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        let idx = name.rfind('.')?;
        if idx == 0 { None } else { Some(&name[idx + 1..]) }
    }

    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl serde::Serialize for NormalizedPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn backslashes_are_normalized() {
        let path = NormalizedPath::new("modes\\hybrid\\a.yaml");
        assert_eq!(path.as_str(), "modes/hybrid/a.yaml");
    }

    #[rstest]
    #[case("modes/code.yaml", Some("code"), Some("yaml"))]
    #[case("project/.roomodes", Some(".roomodes"), None)]
    #[case("settings/custom_modes.yml", Some("custom_modes"), Some("yml"))]
    fn stem_and_extension(
        #[case] raw: &str,
        #[case] stem: Option<&str>,
        #[case] ext: Option<&str>,
    ) {
        let path = NormalizedPath::new(raw);
        assert_eq!(path.file_stem(), stem);
        assert_eq!(path.extension(), ext);
    }

    #[test]
    fn parent_of_bare_name_is_current_dir() {
        assert_eq!(NormalizedPath::new(".roomodes").parent().unwrap().as_str(), ".");
        assert_eq!(NormalizedPath::new("/a").parent().unwrap().as_str(), "/");
        assert_eq!(NormalizedPath::new("/a/b/c").parent().unwrap().as_str(), "/a/b");
    }

    #[test]
    fn default_is_empty_and_joins_cleanly() {
        let path = NormalizedPath::default();
        assert_eq!(path.as_str(), "");
        assert_eq!(path.join("modes").as_str(), "modes");
    }
}
