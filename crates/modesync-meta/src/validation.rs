//! Mode record validation
//!
//! Validation is split in two passes. [`check`] is pure and level-independent:
//! it lists every deviation of a document from the schema. [`normalize`]
//! applies the auto-corrections the active [`ValidationLevel`] allows.
//! [`validate`] combines both and sorts findings into blocking errors and
//! warnings.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use modesync_fs::NormalizedPath;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::mode::KNOWN_FIELDS;
use crate::schema::{Capability, Group, ModeDocument, ModeRecord};
use crate::{Error, Result};

static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap());

const REQUIRED_STRINGS: [&str; 3] = ["slug", "name", "roleDefinition"];
const OPTIONAL_STRINGS: [&str; 2] = ["whenToUse", "customInstructions"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    Strict,
    #[default]
    Standard,
    Permissive,
}

impl ValidationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Standard => "standard",
            Self::Permissive => "permissive",
        }
    }
}

impl FromStr for ValidationLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "standard" => Ok(Self::Standard),
            "permissive" => Ok(Self::Permissive),
            _ => Err(Error::InvalidLevel { value: s.to_string() }),
        }
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One deviation from the schema, independent of strictness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    #[error("missing {field}")]
    MissingField { field: &'static str },

    #[error("{field} must be a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("slug '{value}' does not match ^[a-z0-9]+(-[a-z0-9]+)*$")]
    InvalidSlug { value: String },

    #[error("groups must not be empty")]
    EmptyGroups,

    #[error("groups[{index}]: {reason}")]
    InvalidGroup { index: usize, reason: String },

    #[error("groups[{index}]: duplicate entry '{group}'")]
    DuplicateGroup { index: usize, group: String },

    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    #[error("missing optional {field}")]
    MissingOptional { field: &'static str },
}

/// An auto-correction applied by [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Correction {
    SlugRewritten { before: String, after: String },
    FieldDropped { field: String },
    OptionalDefaulted { field: &'static str },
    DuplicateGroupRemoved { index: usize, group: String },
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlugRewritten { before, after } => {
                write!(f, "slug '{}' rewritten to '{}'", before, after)
            }
            Self::FieldDropped { field } => write!(f, "dropped '{}'", field),
            Self::OptionalDefaulted { field } => write!(f, "{} defaulted to empty", field),
            Self::DuplicateGroupRemoved { group, .. } => {
                write!(f, "removed duplicate '{}'", group)
            }
        }
    }
}

/// A non-blocking finding, possibly with the correction that resolved it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub finding: Finding,
    pub correction: Option<Correction>,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.correction {
            Some(correction) => write!(f, "{} ({})", self.finding, correction),
            None => write!(f, "{}", self.finding),
        }
    }
}

/// Result of validating one document at one level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationOutcome {
    pub label: String,
    pub source: NormalizedPath,
    pub level: ValidationLevel,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Warning>,
    pub valid: bool,
    /// The typed record, present iff `valid`.
    #[serde(skip)]
    pub record: Option<ModeRecord>,
}

impl ValidationOutcome {
    pub fn slug(&self) -> Option<&str> {
        self.record.as_ref().map(|r| r.slug.as_str())
    }
}

enum Disposition {
    Error,
    Warning(Option<Correction>),
    Silent,
}

/// Rewrite a slug into `^[a-z0-9]+(-[a-z0-9]+)*$` form.
///
/// Lower-cases, replaces every other character with `-`, collapses runs of
/// `-` and trims them from both ends. May return an empty string.
pub fn normalize_slug(slug: &str) -> String {
    let mut out = String::with_capacity(slug.len());
    for c in slug.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

pub(crate) fn parse_group(value: &Value) -> std::result::Result<Group, String> {
    match value {
        Value::String(name) => name.parse::<Capability>().map(Group::Simple),
        Value::Array(items) if items.len() == 2 => {
            match &items[0] {
                Value::String(name) if name == "edit" => {}
                Value::String(name) => return Err(format!("only edit can be scoped, got '{}'", name)),
                _ => return Err("scoped group must start with 'edit'".into()),
            }
            let Value::Object(options) = &items[1] else {
                return Err("scoped edit options must be a mapping".into());
            };
            if let Some(extra) = options
                .keys()
                .find(|k| *k != "fileRegex" && *k != "description")
            {
                return Err(format!("unexpected scoped edit option '{}'", extra));
            }
            let file_regex = match options.get("fileRegex") {
                Some(Value::String(pattern)) => pattern.clone(),
                Some(_) => return Err("fileRegex must be a string".into()),
                None => return Err("scoped edit requires fileRegex".into()),
            };
            let description = match options.get("description") {
                Some(Value::String(description)) => description.clone(),
                Some(_) => return Err("description must be a string".into()),
                None => return Err("scoped edit requires description".into()),
            };
            Regex::new(&file_regex).map_err(|e| format!("invalid fileRegex: {}", e))?;
            Ok(Group::ScopedEdit {
                file_regex,
                description,
            })
        }
        _ => Err("expected a capability name or [edit, {fileRegex, description}]".into()),
    }
}

/// List every schema deviation of `doc`. Pure and level-independent.
pub fn check(doc: &ModeDocument) -> Vec<Finding> {
    let mut findings = Vec::new();

    for field in REQUIRED_STRINGS {
        match doc.field(field) {
            None => findings.push(Finding::MissingField { field }),
            Some(Value::String(s)) if s.trim().is_empty() => {
                findings.push(Finding::MissingField { field })
            }
            Some(Value::String(s)) => {
                if field == "slug" && !SLUG_PATTERN.is_match(s) {
                    findings.push(Finding::InvalidSlug { value: s.clone() });
                }
            }
            Some(_) => findings.push(Finding::WrongType {
                field,
                expected: "string",
            }),
        }
    }

    match &doc.groups {
        None => findings.push(Finding::MissingField { field: "groups" }),
        Some(Value::Array(items)) if items.is_empty() => findings.push(Finding::EmptyGroups),
        Some(Value::Array(items)) => {
            let mut seen = HashSet::new();
            for (index, item) in items.iter().enumerate() {
                match parse_group(item) {
                    Ok(group) => {
                        if !seen.insert(group.clone()) {
                            findings.push(Finding::DuplicateGroup {
                                index,
                                group: group.to_string(),
                            });
                        }
                    }
                    Err(reason) => findings.push(Finding::InvalidGroup { index, reason }),
                }
            }
        }
        Some(_) => findings.push(Finding::WrongType {
            field: "groups",
            expected: "sequence",
        }),
    }

    for field in OPTIONAL_STRINGS {
        match doc.field(field) {
            None => findings.push(Finding::MissingOptional { field }),
            Some(Value::String(_)) => {}
            Some(_) => findings.push(Finding::WrongType {
                field,
                expected: "string",
            }),
        }
    }

    for key in doc.unexpected.keys() {
        if !KNOWN_FIELDS.contains(&key.as_str()) {
            findings.push(Finding::UnknownField { field: key.clone() });
        }
    }

    findings
}

fn dispose(finding: &Finding, level: ValidationLevel) -> Disposition {
    use ValidationLevel::*;
    match (finding, level) {
        (Finding::MissingField { .. }, _)
        | (Finding::WrongType { .. }, _)
        | (Finding::EmptyGroups, _)
        | (Finding::InvalidGroup { .. }, _) => Disposition::Error,

        (Finding::InvalidSlug { .. }, Strict) => Disposition::Error,
        (Finding::InvalidSlug { value }, _) => {
            let after = normalize_slug(value);
            if after.is_empty() {
                Disposition::Error
            } else {
                Disposition::Warning(Some(Correction::SlugRewritten {
                    before: value.clone(),
                    after,
                }))
            }
        }

        (Finding::DuplicateGroup { .. }, Strict) => Disposition::Error,
        (Finding::DuplicateGroup { .. }, Standard) => Disposition::Warning(None),
        (Finding::DuplicateGroup { index, group }, Permissive) => {
            Disposition::Warning(Some(Correction::DuplicateGroupRemoved {
                index: *index,
                group: group.clone(),
            }))
        }

        (Finding::UnknownField { .. }, Strict) => Disposition::Error,
        (Finding::UnknownField { field }, _) => {
            Disposition::Warning(Some(Correction::FieldDropped { field: field.clone() }))
        }

        (Finding::MissingOptional { .. }, Strict) => Disposition::Silent,
        (Finding::MissingOptional { field }, _) => {
            Disposition::Warning(Some(Correction::OptionalDefaulted { field: *field }))
        }
    }
}

fn apply(mut doc: ModeDocument, corrections: &[Correction]) -> ModeDocument {
    let mut duplicate_indices = Vec::new();
    for correction in corrections {
        match correction {
            Correction::SlugRewritten { after, .. } => doc.slug = Some(Value::String(after.clone())),
            Correction::FieldDropped { field } => {
                doc.unexpected.shift_remove(field);
            }
            Correction::OptionalDefaulted { field } => {
                if let Some(slot) = doc.field_mut(field) {
                    *slot = Some(Value::String(String::new()));
                }
            }
            Correction::DuplicateGroupRemoved { index, .. } => duplicate_indices.push(*index),
        }
    }
    if let Some(Value::Array(items)) = &mut doc.groups {
        duplicate_indices.sort_unstable_by(|a, b| b.cmp(a));
        for index in duplicate_indices {
            if index < items.len() {
                items.remove(index);
            }
        }
    }
    doc
}

/// Apply the auto-corrections `level` allows. Strict never changes anything.
pub fn normalize(doc: &ModeDocument, level: ValidationLevel) -> (ModeDocument, Vec<Correction>) {
    let corrections: Vec<Correction> = check(doc)
        .iter()
        .filter_map(|finding| match dispose(finding, level) {
            Disposition::Warning(correction) => correction,
            _ => None,
        })
        .collect();
    (apply(doc.clone(), &corrections), corrections)
}

fn string_field(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

fn extract(doc: &ModeDocument) -> Option<ModeRecord> {
    let Some(Value::Array(items)) = &doc.groups else {
        return None;
    };
    let groups = items
        .iter()
        .map(parse_group)
        .collect::<std::result::Result<Vec<_>, _>>()
        .ok()?;
    Some(ModeRecord {
        slug: string_field(doc.slug.as_ref())?,
        name: string_field(doc.name.as_ref())?,
        role_definition: string_field(doc.role_definition.as_ref())?,
        groups,
        when_to_use: string_field(doc.when_to_use.as_ref()),
        custom_instructions: string_field(doc.custom_instructions.as_ref()),
        category: doc.category.clone(),
        source: doc.source.clone(),
    })
}

/// Validate one document at `level`. Never fails; problems are reported in
/// the outcome.
pub fn validate(doc: &ModeDocument, level: ValidationLevel) -> ValidationOutcome {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    for finding in check(doc) {
        match dispose(&finding, level) {
            Disposition::Error => errors.push(finding),
            Disposition::Warning(correction) => warnings.push(Warning {
                finding,
                correction,
            }),
            Disposition::Silent => {}
        }
    }

    let record = if errors.is_empty() {
        let corrections: Vec<Correction> =
            warnings.iter().filter_map(|w| w.correction.clone()).collect();
        extract(&apply(doc.clone(), &corrections))
    } else {
        None
    };

    ValidationOutcome {
        label: doc.label(),
        source: doc.source.clone(),
        level,
        errors,
        warnings,
        valid: record.is_some(),
        record,
    }
}

/// Shallow check used when only listing modes: names of required fields
/// that are absent or empty. Types are not inspected.
pub fn presence_check(doc: &ModeDocument) -> Vec<&'static str> {
    ["slug", "name", "roleDefinition", "groups"]
        .into_iter()
        .filter(|field| match doc.field(field) {
            None => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        })
        .collect()
}
