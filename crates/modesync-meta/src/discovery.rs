//! Discovery of mode record files
//!
//! Walks a modes directory and parses every `.yaml`, `.yml` or `.json` file
//! into a [`ModeDocument`]. A file that cannot be read or parsed is recorded
//! as a [`ParseError`] against its path and the walk carries on.
//!
//! ```text
//! modes/
//!   code.yaml              -> core
//!   code-enhanced.yaml     -> enhanced
//!   conport-maintenance.yml-> specialized
//!   my-helper.json         -> discovered
//!   hybrid/
//!     planner.yaml         -> hybrid
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use modesync_fs::{Format, NormalizedPath, io};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use walkdir::WalkDir;

use crate::schema::ModeDocument;
use crate::{Error, Result};

/// Root-level categories, in report order.
pub const ROOT_CATEGORIES: [&str; 4] = ["core", "enhanced", "specialized", "discovered"];

const MODE_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

static CORE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(code|architect|debug|ask|orchestrator|docs)$").unwrap());
static ENHANCED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-enhanced|-plus)$").unwrap());
static SPECIALIZED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-maintenance$|-enhancer|-creator$|-auditor$)").unwrap());

/// A file that could not be turned into a [`ModeDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{path}: {message}")]
pub struct ParseError {
    pub path: NormalizedPath,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredEntry {
    pub path: NormalizedPath,
    pub outcome: std::result::Result<ModeDocument, ParseError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub entries: Vec<DiscoveredEntry>,
}

/// Everything found under one modes root, grouped by category.
#[derive(Debug, Clone, PartialEq)]
pub struct Discovery {
    pub root: NormalizedPath,
    pub categories: Vec<Category>,
}

impl Discovery {
    /// All entries in category order, then file order.
    pub fn entries(&self) -> impl Iterator<Item = &DiscoveredEntry> {
        self.categories.iter().flat_map(|c| c.entries.iter())
    }

    pub fn documents(&self) -> impl Iterator<Item = &ModeDocument> {
        self.entries().filter_map(|e| e.outcome.as_ref().ok())
    }

    pub fn parse_errors(&self) -> impl Iterator<Item = &ParseError> {
        self.entries().filter_map(|e| e.outcome.as_ref().err())
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(|c| c.entries.is_empty())
    }
}

/// Category of a file sitting directly in the modes root, from its stem.
pub fn categorize_stem(stem: &str) -> &'static str {
    if CORE_PATTERN.is_match(stem) {
        "core"
    } else if ENHANCED_PATTERN.is_match(stem) {
        "enhanced"
    } else if SPECIALIZED_PATTERN.is_match(stem) {
        "specialized"
    } else {
        "discovered"
    }
}

fn category_of(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut components = relative.components();
    match (components.next(), components.next()) {
        (Some(first), Some(_)) => first.as_os_str().to_string_lossy().into_owned(),
        _ => {
            let stem = NormalizedPath::new(path);
            categorize_stem(stem.file_stem().unwrap_or("")).to_string()
        }
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn is_mode_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            MODE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Parse one mode file. Never fails; problems become a [`ParseError`].
pub fn parse_mode_file(
    path: &NormalizedPath,
    category: &str,
) -> std::result::Result<ModeDocument, ParseError> {
    let parse_error = |message: String| ParseError {
        path: path.clone(),
        message,
    };
    let content = io::read_text(path).map_err(|e| parse_error(e.to_string()))?;
    let format = Format::from_path(path).map_err(|e| parse_error(e.to_string()))?;
    let value: Value = format
        .parse(path, &content)
        .map_err(|e| parse_error(e.to_string()))?;
    ModeDocument::from_value(value, category, path.clone())
        .ok_or_else(|| parse_error("top-level value is not a mapping".into()))
}

/// Walk `root` and parse every mode file beneath it.
///
/// Only a missing or non-directory root is an error. Symlinks are not
/// followed, hidden files and directories are skipped, and files with other
/// extensions are ignored.
pub fn discover(root: &NormalizedPath) -> Result<Discovery> {
    let native = root.to_native();
    if !native.exists() {
        return Err(Error::ModesDirNotFound { path: native });
    }
    if !native.is_dir() {
        return Err(Error::NotADirectory { path: native });
    }

    let mut buckets: BTreeMap<String, Vec<DiscoveredEntry>> = BTreeMap::new();
    let walker = WalkDir::new(&native)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for item in walker {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(&native).to_path_buf();
                tracing::warn!(path = %path.display(), error = %err, "Unreadable entry in modes directory");
                let normalized = NormalizedPath::new(&path);
                buckets
                    .entry(category_of(&native, &path))
                    .or_default()
                    .push(DiscoveredEntry {
                        path: normalized.clone(),
                        outcome: Err(ParseError {
                            path: normalized,
                            message: err.to_string(),
                        }),
                    });
                continue;
            }
        };

        let file_type = entry.file_type();
        let is_file = file_type.is_file() || (file_type.is_symlink() && entry.path().is_file());
        if !is_file || !is_mode_file(entry.path()) {
            continue;
        }

        let category = category_of(&native, entry.path());
        let path = NormalizedPath::new(entry.path());
        let outcome = parse_mode_file(&path, &category);
        match &outcome {
            Ok(_) => tracing::debug!(path = %path, category = %category, "Discovered mode file"),
            Err(e) => tracing::warn!(path = %path, error = %e.message, "Skipping unparsable mode file"),
        }
        buckets
            .entry(category)
            .or_default()
            .push(DiscoveredEntry { path, outcome });
    }

    let mut categories = Vec::with_capacity(buckets.len());
    for name in ROOT_CATEGORIES {
        if let Some(entries) = buckets.remove(name) {
            categories.push(Category {
                name: name.to_string(),
                entries,
            });
        }
    }
    categories.extend(
        buckets
            .into_iter()
            .map(|(name, entries)| Category { name, entries }),
    );
    for category in &mut categories {
        category.entries.sort_by(|a, b| {
            (a.path.file_name(), &a.path).cmp(&(b.path.file_name(), &b.path))
        });
    }

    tracing::info!(
        root = %root,
        categories = categories.len(),
        files = categories.iter().map(|c| c.entries.len()).sum::<usize>(),
        "Discovery complete"
    );

    Ok(Discovery {
        root: root.clone(),
        categories,
    })
}
