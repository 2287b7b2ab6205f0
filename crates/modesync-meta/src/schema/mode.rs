//! Mode record schema
//!
//! A mode file is read into a [`ModeDocument`]: every known field is kept as
//! an untyped value so the validator can report type mismatches, and anything
//! else lands in the `unexpected` bag. Validation turns a document into a
//! typed [`ModeRecord`].
//!
//! # Example YAML
//!
//! ```yaml
//! slug: code
//! name: Code
//! roleDefinition: You are a careful software engineer.
//! whenToUse: General implementation work.
//! groups:
//!   - read
//!   - - edit
//!     - fileRegex: \.rs$
//!       description: Rust sources
//!   - command
//! ```

use std::fmt;
use std::str::FromStr;

use modesync_fs::NormalizedPath;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Keys a mode file may carry. `source` is accepted and ignored because the
/// host writes it into its own files.
pub(crate) const KNOWN_FIELDS: &[&str] = &[
    "slug",
    "name",
    "roleDefinition",
    "groups",
    "whenToUse",
    "customInstructions",
    "source",
];

/// A capability a mode may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Read,
    Edit,
    Browser,
    Command,
    Mcp,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Read,
        Capability::Edit,
        Capability::Browser,
        Capability::Command,
        Capability::Mcp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Edit => "edit",
            Self::Browser => "browser",
            Self::Command => "command",
            Self::Mcp => "mcp",
        }
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown capability '{}'", s))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a mode's `groups` list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Group {
    Simple(Capability),
    /// Edit access limited to files matching `file_regex`.
    ScopedEdit {
        file_regex: String,
        description: String,
    },
}

impl Group {
    pub fn to_value(&self) -> Value {
        match self {
            Self::Simple(capability) => Value::String(capability.as_str().to_string()),
            Self::ScopedEdit {
                file_regex,
                description,
            } => {
                let mut options = Map::new();
                options.insert("fileRegex".into(), Value::String(file_regex.clone()));
                options.insert("description".into(), Value::String(description.clone()));
                Value::Array(vec![Value::String("edit".into()), Value::Object(options)])
            }
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(capability) => write!(f, "{}", capability),
            Self::ScopedEdit { file_regex, .. } => write!(f, "edit({})", file_regex),
        }
    }
}

impl Serialize for Group {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Simple(capability) => capability.serialize(serializer),
            Self::ScopedEdit {
                file_regex,
                description,
            } => {
                #[derive(Serialize)]
                struct Options<'a> {
                    #[serde(rename = "fileRegex")]
                    file_regex: &'a str,
                    description: &'a str,
                }
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(&Capability::Edit)?;
                seq.serialize_element(&Options {
                    file_regex,
                    description,
                })?;
                seq.end()
            }
        }
    }
}

/// A validated mode record, ready to be planned and written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeRecord {
    pub slug: String,
    pub name: String,
    pub role_definition: String,
    pub groups: Vec<Group>,
    pub when_to_use: Option<String>,
    pub custom_instructions: Option<String>,
    pub category: String,
    pub source: NormalizedPath,
}

impl ModeRecord {
    /// The entry written into a target's `customModes` list.
    ///
    /// Keys always come out in the same order so that rendering is
    /// deterministic. `source_tag` is `global` or `project`.
    pub fn to_entry(&self, source_tag: &str) -> Value {
        let mut entry = Map::new();
        entry.insert("slug".into(), Value::String(self.slug.clone()));
        entry.insert("name".into(), Value::String(self.name.clone()));
        entry.insert(
            "roleDefinition".into(),
            Value::String(self.role_definition.clone()),
        );
        if let Some(when_to_use) = &self.when_to_use {
            entry.insert("whenToUse".into(), Value::String(when_to_use.clone()));
        }
        if let Some(custom_instructions) = &self.custom_instructions {
            entry.insert(
                "customInstructions".into(),
                Value::String(custom_instructions.clone()),
            );
        }
        entry.insert(
            "groups".into(),
            Value::Array(self.groups.iter().map(Group::to_value).collect()),
        );
        entry.insert("source".into(), Value::String(source_tag.to_string()));
        Value::Object(entry)
    }
}

/// A mode file as parsed, before validation.
///
/// `None` means the key was absent (or explicitly null).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModeDocument {
    pub slug: Option<Value>,
    pub name: Option<Value>,
    pub role_definition: Option<Value>,
    pub groups: Option<Value>,
    pub when_to_use: Option<Value>,
    pub custom_instructions: Option<Value>,
    /// Top-level keys outside the schema, in file order.
    pub unexpected: Map<String, Value>,
    pub category: String,
    pub source: NormalizedPath,
}

impl ModeDocument {
    /// Split a parsed file into known fields and the unexpected bag.
    ///
    /// Returns `None` when the top-level value is not a mapping.
    pub fn from_value(value: Value, category: &str, source: NormalizedPath) -> Option<Self> {
        let Value::Object(map) = value else {
            return None;
        };
        let mut doc = ModeDocument {
            category: category.to_string(),
            source,
            ..Default::default()
        };
        for (key, value) in map {
            let value = (!value.is_null()).then_some(value);
            match key.as_str() {
                "slug" => doc.slug = value,
                "name" => doc.name = value,
                "roleDefinition" => doc.role_definition = value,
                "groups" => doc.groups = value,
                "whenToUse" => doc.when_to_use = value,
                "customInstructions" => doc.custom_instructions = value,
                "source" => {}
                _ => {
                    doc.unexpected
                        .insert(key, value.unwrap_or(Value::Null));
                }
            }
        }
        Some(doc)
    }

    /// Human label for reports: the slug when it is a string, else the file stem.
    pub fn label(&self) -> String {
        match &self.slug {
            Some(Value::String(slug)) if !slug.trim().is_empty() => slug.clone(),
            _ => self.source.file_stem().unwrap_or("<unnamed>").to_string(),
        }
    }

    /// Look up a known field by its file key.
    pub(crate) fn field(&self, key: &str) -> Option<&Value> {
        match key {
            "slug" => self.slug.as_ref(),
            "name" => self.name.as_ref(),
            "roleDefinition" => self.role_definition.as_ref(),
            "groups" => self.groups.as_ref(),
            "whenToUse" => self.when_to_use.as_ref(),
            "customInstructions" => self.custom_instructions.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn field_mut(&mut self, key: &str) -> Option<&mut Option<Value>> {
        match key {
            "slug" => Some(&mut self.slug),
            "name" => Some(&mut self.name),
            "roleDefinition" => Some(&mut self.role_definition),
            "groups" => Some(&mut self.groups),
            "whenToUse" => Some(&mut self.when_to_use),
            "customInstructions" => Some(&mut self.custom_instructions),
            _ => None,
        }
    }
}
