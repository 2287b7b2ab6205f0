//! Merge engine
//!
//! Combines a [`SyncPlan`] with a target's current [`TargetConfig`]. The new
//! owned set is exactly the plan's slugs (minus conflicts); foreign entries are
//! copied through untouched.

use std::collections::{BTreeMap, HashSet};

use modesync_blocks::{TargetConfig, entry_checksum, entry_slug};
use serde::Serialize;
use serde_json::Value;

use super::strategy::SyncPlan;

/// What a merge did to one slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Added,
    Updated,
    Unchanged,
    Removed,
    /// The slug belongs to a foreign entry and was left alone
    Conflict,
}

impl Transition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::Removed => "removed",
            Self::Conflict => "conflict",
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlugChange {
    pub slug: String,
    pub transition: Transition,
    /// The owned entry had been edited by hand since it was last written.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub drifted: bool,
}

/// The merged config and the per-slug transitions: plan slugs in plan order,
/// then foreign entries shadowing an owned slug, then removals in their
/// former file order.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeResult {
    pub config: TargetConfig,
    pub changes: Vec<SlugChange>,
    /// Entries kept from the old file now sit in a different order.
    pub reordered: bool,
}

impl MergeResult {
    pub fn count(&self, transition: Transition) -> usize {
        self.changes
            .iter()
            .filter(|c| c.transition == transition)
            .count()
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &SlugChange> {
        self.changes
            .iter()
            .filter(|c| c.transition == Transition::Conflict)
    }

    /// Whether the target file needs rewriting: an owned entry changed or
    /// the entries must be put in plan order.
    pub fn has_changes(&self) -> bool {
        self.reordered
            || self
                .changes
                .iter()
                .any(|c| !matches!(c.transition, Transition::Unchanged | Transition::Conflict))
    }
}

/// Merge `plan` into `existing`, tagging new entries with `source_tag`.
pub fn merge(existing: &TargetConfig, plan: &SyncPlan, source_tag: &str) -> MergeResult {
    let positions = existing.owned_positions();
    let foreign: Vec<&Value> = existing.foreign_entries().collect();
    let foreign_slugs: HashSet<&str> = foreign.iter().filter_map(|e| entry_slug(*e)).collect();

    let mut owned_entries = Vec::with_capacity(plan.records.len());
    let mut managed = BTreeMap::new();
    let mut changes = Vec::with_capacity(plan.records.len());
    let mut planned: HashSet<&str> = HashSet::new();

    for record in &plan.records {
        let slug = record.slug.as_str();
        planned.insert(slug);
        let entry = record.to_entry(source_tag);

        let (transition, drifted) = match existing.managed.get(slug) {
            None if foreign_slugs.contains(slug) => {
                tracing::warn!(slug, "Slug is taken by a foreign entry, leaving it alone");
                changes.push(SlugChange {
                    slug: slug.to_string(),
                    transition: Transition::Conflict,
                    drifted: false,
                });
                continue;
            }
            Some(recorded) => match positions.get(slug).map(|&index| &existing.modes[index]) {
                Some(old) => {
                    let drifted = *recorded != entry_checksum(old);
                    if drifted {
                        tracing::warn!(slug, "Owned entry was edited outside modesync");
                    }
                    if *old == entry && !drifted {
                        (Transition::Unchanged, false)
                    } else {
                        (Transition::Updated, drifted)
                    }
                }
                // Listed in the marker but the entry itself is gone
                None => (Transition::Added, false),
            },
            None => (Transition::Added, false),
        };

        tracing::debug!(slug, transition = %transition, "Merged slug");
        managed.insert(slug.to_string(), entry_checksum(&entry));
        owned_entries.push(entry);
        changes.push(SlugChange {
            slug: slug.to_string(),
            transition,
            drifted,
        });
    }

    // Hand-added copies of an owned slug stay in the file as foreign entries
    let mut shadowing: Vec<&str> = Vec::new();
    for slug in foreign.iter().filter_map(|e| entry_slug(*e)) {
        if existing.is_owned(slug) && !shadowing.contains(&slug) {
            tracing::warn!(slug, "Foreign entry reuses an owned slug, keeping it as is");
            shadowing.push(slug);
            changes.push(SlugChange {
                slug: slug.to_string(),
                transition: Transition::Conflict,
                drifted: false,
            });
        }
    }

    let mut removed: Vec<&str> = existing
        .modes
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let slug = entry_slug(entry)?;
            (positions.get(slug) == Some(&index) && !planned.contains(slug)).then_some(slug)
        })
        .collect();
    // Marker entries without a matching customModes entry are pruned too
    for slug in existing.managed.keys() {
        if !planned.contains(slug.as_str()) && !removed.contains(&slug.as_str()) {
            removed.push(slug.as_str());
        }
    }
    for slug in removed {
        tracing::debug!(slug, "Pruning owned entry no longer planned");
        changes.push(SlugChange {
            slug: slug.to_string(),
            transition: Transition::Removed,
            drifted: false,
        });
    }

    let mut modes = owned_entries;
    modes.extend(foreign.into_iter().cloned());
    let reordered = order_changed(&existing.modes, &modes);
    if reordered {
        tracing::debug!("Entries move to follow the plan order");
    }

    MergeResult {
        config: TargetConfig {
            modes,
            managed,
            extra: existing.extra.clone(),
        },
        changes,
        reordered,
    }
}

/// Whether entries present in both lists appear in another order.
fn order_changed(old: &[Value], new: &[Value]) -> bool {
    fn kept<'a>(from: &'a [Value], other: &[Value]) -> Vec<&'a Value> {
        from.iter().filter(|entry| other.contains(entry)).collect()
    }
    kept(old, new) != kept(new, old)
}
