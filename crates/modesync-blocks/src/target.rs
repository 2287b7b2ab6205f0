//! In-memory target configuration and the ownership marker
//!
//! Ownership is recorded in a reserved top-level key that maps each owned
//! slug to the checksum of its entry as last written:
//!
//! ```json
//! {
//!     "customModes": [ { "slug": "code", ... }, { "slug": "mine", ... } ],
//!     "__modesync_managed__": { "code": "sha256:3f1c..." }
//! }
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use modesync_fs::{NormalizedPath, compute_content_checksum, io};
use serde_json::{Map, Value};

use crate::formats::handler_for;
use crate::{Error, Result};

/// The reserved key for the ownership marker namespace
pub const MANAGED_KEY: &str = "__modesync_managed__";

/// The key holding the list of mode entries
pub const MODES_KEY: &str = "customModes";

/// Slug of an entry, if it has a string `slug` key.
pub fn entry_slug(entry: &Value) -> Option<&str> {
    entry.get("slug").and_then(Value::as_str)
}

/// Checksum of the canonical (compact JSON) form of an entry.
pub fn entry_checksum(entry: &Value) -> String {
    compute_content_checksum(&entry.to_string())
}

/// A target file's content, split into its parts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TargetConfig {
    /// `customModes` entries in file order.
    pub modes: Vec<Value>,
    /// Owned slug to checksum.
    pub managed: BTreeMap<String, String>,
    /// Any other top-level keys, in file order.
    pub extra: Map<String, Value>,
}

impl TargetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_owned(&self, slug: &str) -> bool {
        self.managed.contains_key(slug)
    }

    /// Split a parsed document. `Null` counts as an empty document.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut map = match value {
            Value::Null => return Ok(Self::new()),
            Value::Object(map) => map,
            _ => return Err(Error::malformed("top-level value is not a mapping")),
        };

        let modes = match map.shift_remove(MODES_KEY) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(modes)) => modes,
            Some(_) => return Err(Error::malformed(format!("{} is not a sequence", MODES_KEY))),
        };

        let mut managed = BTreeMap::new();
        match map.shift_remove(MANAGED_KEY) {
            None | Some(Value::Null) => {}
            Some(Value::Object(marker)) => {
                for (slug, checksum) in marker {
                    let Value::String(checksum) = checksum else {
                        return Err(Error::malformed(format!(
                            "{} entry for '{}' is not a string",
                            MANAGED_KEY, slug
                        )));
                    };
                    managed.insert(slug, checksum);
                }
            }
            Some(_) => return Err(Error::malformed(format!("{} is not a mapping", MANAGED_KEY))),
        }

        Ok(Self {
            modes,
            managed,
            extra: map,
        })
    }

    /// Reassemble the document: `customModes`, other keys, then the marker.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(MODES_KEY.into(), Value::Array(self.modes.clone()));
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }
        if !self.managed.is_empty() {
            let marker: Map<String, Value> = self
                .managed
                .iter()
                .map(|(slug, checksum)| (slug.clone(), Value::String(checksum.clone())))
                .collect();
            map.insert(MANAGED_KEY.into(), Value::Object(marker));
        }
        Value::Object(map)
    }

    /// Index of the owned entry of every owned slug present in `modes`.
    ///
    /// When several entries share an owned slug, the one matching the
    /// recorded checksum is owned (the first one if none matches); the rest
    /// are foreign.
    pub fn owned_positions(&self) -> HashMap<&str, usize> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (index, entry) in self.modes.iter().enumerate() {
            let Some(slug) = entry_slug(entry) else {
                continue;
            };
            let Some(recorded) = self.managed.get(slug) else {
                continue;
            };
            match positions.get(slug) {
                None => {
                    positions.insert(slug, index);
                }
                Some(&first) => {
                    if entry_checksum(&self.modes[first]) != *recorded
                        && entry_checksum(entry) == *recorded
                    {
                        positions.insert(slug, index);
                    }
                }
            }
        }
        positions
    }

    /// Entries that are not owned, in file order.
    pub fn foreign_entries(&self) -> impl Iterator<Item = &Value> {
        let owned: HashSet<usize> = self.owned_positions().into_values().collect();
        self.modes
            .iter()
            .enumerate()
            .filter(move |(index, _)| !owned.contains(index))
            .map(|(_, entry)| entry)
    }
}

/// A target as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTarget {
    pub path: NormalizedPath,
    /// Raw file content; `None` when the file does not exist.
    pub raw: Option<String>,
    pub config: TargetConfig,
}

impl LoadedTarget {
    /// Parse content already read from `path`.
    pub fn from_raw(path: &NormalizedPath, raw: Option<String>) -> Result<Self> {
        let config = match &raw {
            Some(content) => handler_for(path)
                .parse(content)
                .map_err(|e| Error::Unreadable {
                    path: path.to_native(),
                    source: Box::new(e),
                })?,
            None => TargetConfig::new(),
        };
        tracing::debug!(
            path = %path,
            entries = config.modes.len(),
            owned = config.managed.len(),
            "Loaded target"
        );
        Ok(Self {
            path: path.clone(),
            raw,
            config,
        })
    }
}

/// Read and parse a target. A missing file is an empty configuration.
pub fn load(path: &NormalizedPath) -> Result<LoadedTarget> {
    let raw = io::read_optional_text(path)?;
    LoadedTarget::from_raw(path, raw)
}
