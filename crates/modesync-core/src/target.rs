//! Target kinds and selection

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Which destination a target file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// The host's shared settings file
    Global,
    /// A project's `.roomodes`
    Local,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Local => "local",
        }
    }

    /// Value of the `source` key on entries written to this target.
    pub fn source_tag(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Local => "project",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "global" => Ok(Self::Global),
            "local" => Ok(Self::Local),
            _ => Err(Error::usage(format!(
                "unknown target '{}' (expected global or local)",
                s
            ))),
        }
    }
}

/// The set of targets a sync writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetSelection {
    #[default]
    Global,
    Local,
    Both,
}

impl TargetSelection {
    pub fn kinds(self) -> Vec<TargetKind> {
        match self {
            Self::Global => vec![TargetKind::Global],
            Self::Local => vec![TargetKind::Local],
            Self::Both => vec![TargetKind::Global, TargetKind::Local],
        }
    }
}

impl FromStr for TargetSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "global" => Ok(Self::Global),
            "local" => Ok(Self::Local),
            "both" => Ok(Self::Both),
            _ => Err(Error::usage(format!(
                "unknown target '{}' (expected global, local or both)",
                s
            ))),
        }
    }
}
