//! Strategy policy schema
//!
//! Parameters live in `[strategies.<name>]` tables of a settings file:
//!
//! ```toml
//! [strategies.groupings]
//! active_group = "daily"
//! priority_first = ["code"]
//! exclude = ["docs"]
//!
//! [strategies.groupings.groups]
//! daily = ["code", "debug", "ask"]
//! review = ["architect", "code-auditor"]
//!
//! [strategies.category]
//! category_order = ["core", "specialized"]
//! within_category_sort = "manual"
//! manual_category_order = { core = ["code", "debug"] }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Category precedence used by `category` when none is configured.
pub const DEFAULT_CATEGORY_ORDER: &[&str] = &["core", "enhanced", "specialized", "discovered"];

/// Built-in rank used by `strategic` when none is configured.
pub const DEFAULT_RANK: &[&str] = &[
    "code",
    "architect",
    "debug",
    "ask",
    "orchestrator",
    "code-enhanced",
    "prompt-enhancer",
    "prompt-enhancer-isolated",
    "conport-maintenance",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyName {
    #[default]
    Strategic,
    Groupings,
    Alphabetical,
    Category,
    Custom,
}

impl StrategyName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strategic => "strategic",
            Self::Groupings => "groupings",
            Self::Alphabetical => "alphabetical",
            Self::Category => "category",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for StrategyName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "strategic" => Ok(Self::Strategic),
            "groupings" => Ok(Self::Groupings),
            "alphabetical" => Ok(Self::Alphabetical),
            "category" => Ok(Self::Category),
            "custom" => Ok(Self::Custom),
            _ => Err(Error::UnknownStrategy { name: s.to_string() }),
        }
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategicParams {
    /// Explicit ordering; `None` falls back to [`DEFAULT_RANK`].
    pub rank: Option<Vec<String>>,
    pub priority_first: Vec<String>,
    pub exclude: Vec<String>,
}

impl StrategicParams {
    pub fn effective_rank(&self) -> Vec<String> {
        match &self.rank {
            Some(rank) => rank.clone(),
            None => DEFAULT_RANK.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroupingsParams {
    /// Group name to ordered member slugs.
    pub groups: BTreeMap<String, Vec<String>>,
    pub active_group: Option<String>,
    pub active_groups: Option<Vec<String>>,
    /// Base order when no active group is selected.
    pub group_order: Option<Vec<String>>,
    pub priority_first: Vec<String>,
    pub exclude: Vec<String>,
}

impl GroupingsParams {
    /// Reject conflicting or dangling group selections.
    pub fn check(&self) -> Result<()> {
        if self.active_group.is_some() && self.active_groups.is_some() {
            return Err(Error::ConflictingActiveGroups);
        }
        for name in self.selected_groups() {
            if !self.groups.contains_key(&name) {
                return Err(Error::UnknownGroup { name });
            }
        }
        Ok(())
    }

    /// Names of the groups that form the base membership, in order.
    pub fn selected_groups(&self) -> Vec<String> {
        if let Some(group) = &self.active_group {
            return vec![group.clone()];
        }
        if let Some(groups) = &self.active_groups {
            return groups.clone();
        }
        if let Some(order) = &self.group_order {
            return order.clone();
        }
        self.groups.keys().cloned().collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlphabeticalParams {
    pub priority_first: Vec<String>,
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithinCategorySort {
    #[default]
    Alphabetical,
    /// `manual_category_order` lists first, the rest alphabetically
    Manual,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoryParams {
    /// Category precedence; `None` falls back to [`DEFAULT_CATEGORY_ORDER`].
    /// Categories left out of it are left out of the plan.
    pub category_order: Option<Vec<String>>,
    pub within_category_sort: WithinCategorySort,
    pub manual_category_order: BTreeMap<String, Vec<String>>,
    pub priority_first: Vec<String>,
    pub exclude: Vec<String>,
}

impl CategoryParams {
    pub fn effective_category_order(&self) -> Vec<String> {
        match &self.category_order {
            Some(order) => order.clone(),
            None => DEFAULT_CATEGORY_ORDER.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CustomParams {
    /// Slugs placed first; every other mode follows alphabetically.
    pub custom_order: Vec<String>,
    pub priority_first: Vec<String>,
    pub exclude: Vec<String>,
}

/// The `[strategies]` table: one parameter set per strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyParams {
    pub strategic: StrategicParams,
    pub groupings: GroupingsParams,
    pub alphabetical: AlphabeticalParams,
    pub category: CategoryParams,
    pub custom: CustomParams,
}

impl StrategyParams {
    /// Validate the parameters of the strategy about to run.
    pub fn check(&self, strategy: StrategyName) -> Result<()> {
        match strategy {
            StrategyName::Groupings => self.groupings.check(),
            StrategyName::Strategic
            | StrategyName::Alphabetical
            | StrategyName::Category
            | StrategyName::Custom => Ok(()),
        }
    }

    /// Apply command-line overrides to the parameters of `strategy`.
    ///
    /// `priority_first` and `exclude` replace the active strategy's lists;
    /// the order overrides only touch the strategy they belong to.
    pub fn apply(&mut self, strategy: StrategyName, overrides: &StrategyOverrides) {
        let (priority_first, exclude) = match strategy {
            StrategyName::Strategic => (&mut self.strategic.priority_first, &mut self.strategic.exclude),
            StrategyName::Groupings => (&mut self.groupings.priority_first, &mut self.groupings.exclude),
            StrategyName::Alphabetical => {
                (&mut self.alphabetical.priority_first, &mut self.alphabetical.exclude)
            }
            StrategyName::Category => (&mut self.category.priority_first, &mut self.category.exclude),
            StrategyName::Custom => (&mut self.custom.priority_first, &mut self.custom.exclude),
        };
        if let Some(priority) = &overrides.priority_first {
            *priority_first = priority.clone();
        }
        if let Some(list) = &overrides.exclude {
            *exclude = list.clone();
        }
        if let Some(order) = &overrides.category_order {
            self.category.category_order = Some(order.clone());
        }
        if let Some(order) = &overrides.custom_order {
            self.custom.custom_order = order.clone();
        }
    }
}

/// Per-run replacements for strategy parameters, usually from CLI flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyOverrides {
    pub priority_first: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub category_order: Option<Vec<String>>,
    pub custom_order: Option<Vec<String>>,
}

impl StrategyOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
