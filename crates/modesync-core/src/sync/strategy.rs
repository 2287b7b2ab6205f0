//! Strategy resolution
//!
//! Turns a named policy plus the valid records (in discovery order) into an
//! ordered, de-duplicated [`SyncPlan`]. Every valid record that does not make
//! it into the plan, and every configured slug that matches no valid record,
//! is explained by a [`PlanNote`].

use std::collections::{HashMap, HashSet};

use modesync_meta::{ModeRecord, StrategyName, StrategyParams, WithinCategorySort};
use serde::Serialize;

use crate::Result;

/// Why a slug is missing from the plan, or was named without effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanNote {
    /// Removed by the `exclude` list
    Excluded { slug: String },
    /// Valid, but not a member of any selected group
    NotSelected { slug: String },
    /// Valid, but its category is not in `category_order`
    OutsideCategoryOrder { slug: String, category: String },
    /// Named by `origin` (a group, `rank` or `priority_first`) but not a valid record
    MissingMember { slug: String, origin: String },
}

impl PlanNote {
    pub fn slug(&self) -> &str {
        match self {
            Self::Excluded { slug }
            | Self::NotSelected { slug }
            | Self::OutsideCategoryOrder { slug, .. }
            | Self::MissingMember { slug, .. } => slug,
        }
    }

    /// Reason shown next to an excluded record.
    pub fn reason(&self) -> String {
        match self {
            Self::Excluded { .. } => "excluded by policy".to_string(),
            Self::NotSelected { .. } => "not in the selected groups".to_string(),
            Self::OutsideCategoryOrder { category, .. } => {
                format!("category '{}' is not in the category order", category)
            }
            Self::MissingMember { origin, .. } => format!("named by {} but not a valid mode", origin),
        }
    }
}

/// The ordered set of records a sync writes.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncPlan {
    pub strategy: StrategyName,
    pub records: Vec<ModeRecord>,
    pub notes: Vec<PlanNote>,
}

impl SyncPlan {
    pub fn slugs(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.slug.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Builds the ordered slug list, dropping repeats and recording unknown slugs.
struct Ordering<'a> {
    known: &'a HashMap<&'a str, &'a ModeRecord>,
    slugs: Vec<&'a str>,
    seen: HashSet<&'a str>,
    notes: Vec<PlanNote>,
}

impl<'a> Ordering<'a> {
    fn new(known: &'a HashMap<&'a str, &'a ModeRecord>) -> Self {
        Self {
            known,
            slugs: Vec::new(),
            seen: HashSet::new(),
            notes: Vec::new(),
        }
    }

    fn push(&mut self, slug: &str, origin: &str) {
        match self.known.get_key_value(slug) {
            Some((&known, _)) => {
                if self.seen.insert(known) {
                    self.slugs.push(known);
                }
            }
            None => {
                tracing::warn!(slug, origin, "Dropping slug that is not a valid mode");
                self.notes.push(PlanNote::MissingMember {
                    slug: slug.to_string(),
                    origin: origin.to_string(),
                });
            }
        }
    }

    /// Move `priority` slugs already in the order to the front, in the given order.
    fn prioritize(&mut self, priority: &[String]) {
        let mut front: Vec<&'a str> = Vec::new();
        for slug in priority {
            if let Some(&known) = self.slugs.iter().find(|s| **s == slug.as_str())
                && !front.contains(&known)
            {
                front.push(known);
            } else if !self.known.contains_key(slug.as_str()) {
                self.push(slug, "priority_first");
            }
        }
        let rest: Vec<&'a str> = self
            .slugs
            .iter()
            .copied()
            .filter(|s| !front.contains(s))
            .collect();
        front.extend(rest);
        self.slugs = front;
    }

    fn exclude(&mut self, exclude: &[String]) {
        let notes = &mut self.notes;
        self.slugs.retain(|slug| {
            let drop = exclude.iter().any(|e| e == slug);
            if drop {
                tracing::debug!(slug, "Excluded by policy");
                notes.push(PlanNote::Excluded {
                    slug: slug.to_string(),
                });
            }
            !drop
        });
    }
}

/// Resolve `strategy` over `valid` records (already in discovery order).
///
/// Fails only on invalid strategy parameters.
pub fn resolve(
    strategy: StrategyName,
    params: &StrategyParams,
    valid: &[ModeRecord],
) -> Result<SyncPlan> {
    params.check(strategy)?;

    let mut known: HashMap<&str, &ModeRecord> = HashMap::with_capacity(valid.len());
    for record in valid {
        known.entry(record.slug.as_str()).or_insert(record);
    }
    let mut ordering = Ordering::new(&known);

    let (priority_first, exclude) = match strategy {
        StrategyName::Strategic => {
            let p = &params.strategic;
            // Absent entries of the built-in rank are expected and not noted.
            for slug in &p.effective_rank() {
                if p.rank.is_some() || known.contains_key(slug.as_str()) {
                    ordering.push(slug, "rank");
                }
            }
            for record in valid {
                ordering.push(&record.slug, "discovery");
            }
            (&p.priority_first, &p.exclude)
        }
        StrategyName::Groupings => {
            let p = &params.groupings;
            for group in p.selected_groups() {
                let origin = format!("group '{}'", group);
                for slug in p.groups.get(&group).into_iter().flatten() {
                    ordering.push(slug, &origin);
                }
            }
            (&p.priority_first, &p.exclude)
        }
        StrategyName::Alphabetical => {
            let mut categories: Vec<&str> = Vec::new();
            for record in valid {
                if !categories.contains(&record.category.as_str()) {
                    categories.push(&record.category);
                }
            }
            for category in categories {
                let mut members: Vec<&ModeRecord> =
                    valid.iter().filter(|r| r.category == category).collect();
                members.sort_by(|a, b| a.slug.cmp(&b.slug));
                for record in members {
                    ordering.push(&record.slug, "discovery");
                }
            }
            let p = &params.alphabetical;
            (&p.priority_first, &p.exclude)
        }
        StrategyName::Category => {
            let p = &params.category;
            let order = p.effective_category_order();
            // Without a configured order, unknown directories count as "discovered"
            let bucket = |record: &ModeRecord| -> String {
                if p.category_order.is_none() && !order.contains(&record.category) {
                    "discovered".to_string()
                } else {
                    record.category.clone()
                }
            };
            for category in &order {
                let mut members: Vec<&str> = valid
                    .iter()
                    .filter(|r| bucket(*r) == *category)
                    .map(|r| r.slug.as_str())
                    .collect();
                members.sort_unstable();
                if p.within_category_sort == WithinCategorySort::Manual
                    && let Some(manual) = p.manual_category_order.get(category)
                {
                    for slug in manual {
                        if members.contains(&slug.as_str()) {
                            ordering.push(slug, "manual_category_order");
                        }
                    }
                }
                for slug in members {
                    ordering.push(slug, "discovery");
                }
            }
            for record in valid {
                if !order.contains(&bucket(record)) && !ordering.seen.contains(record.slug.as_str()) {
                    ordering.notes.push(PlanNote::OutsideCategoryOrder {
                        slug: record.slug.clone(),
                        category: record.category.clone(),
                    });
                }
            }
            (&p.priority_first, &p.exclude)
        }
        StrategyName::Custom => {
            let p = &params.custom;
            for slug in &p.custom_order {
                ordering.push(slug, "custom_order");
            }
            let mut rest: Vec<&str> = valid.iter().map(|r| r.slug.as_str()).collect();
            rest.sort_unstable();
            for slug in rest {
                ordering.push(slug, "discovery");
            }
            (&p.priority_first, &p.exclude)
        }
    };

    ordering.prioritize(priority_first);
    ordering.exclude(exclude);

    if strategy == StrategyName::Groupings {
        for record in valid {
            let slug = record.slug.as_str();
            if !ordering.seen.contains(slug) {
                ordering.notes.push(PlanNote::NotSelected {
                    slug: slug.to_string(),
                });
            }
        }
    }

    let records: Vec<ModeRecord> = ordering
        .slugs
        .iter()
        .filter_map(|slug| known.get(slug).map(|r| (*r).clone()))
        .collect();

    tracing::info!(
        strategy = %strategy,
        planned = records.len(),
        notes = ordering.notes.len(),
        "Resolved sync plan"
    );

    Ok(SyncPlan {
        strategy,
        records,
        notes: ordering.notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use modesync_fs::NormalizedPath;
    use modesync_meta::{
        Capability, CategoryParams, CustomParams, Group, GroupingsParams, StrategicParams,
    };
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn record(slug: &str, category: &str) -> ModeRecord {
        ModeRecord {
            slug: slug.into(),
            name: slug.into(),
            role_definition: "role".into(),
            groups: vec![Group::Simple(Capability::Read)],
            when_to_use: None,
            custom_instructions: None,
            category: category.into(),
            source: NormalizedPath::new(format!("modes/{}.yaml", slug)),
        }
    }

    fn records(slugs: &[&str]) -> Vec<ModeRecord> {
        slugs.iter().map(|s| record(s, "discovered")).collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn groupings(groups: &[(&str, &[&str])]) -> GroupingsParams {
        GroupingsParams {
            groups: groups
                .iter()
                .map(|(name, members)| (name.to_string(), strings(members)))
                .collect::<BTreeMap<_, _>>(),
            ..Default::default()
        }
    }

    #[test]
    fn groupings_priority_then_exclude() {
        let mut params = StrategyParams::default();
        params.groupings = GroupingsParams {
            active_group: Some("G".into()),
            priority_first: strings(&["c"]),
            exclude: strings(&["b"]),
            ..groupings(&[("G", &["a", "b", "c"])])
        };

        let plan = resolve(StrategyName::Groupings, &params, &records(&["a", "b", "c"])).unwrap();

        assert_eq!(plan.slugs(), vec!["c", "a"]);
        assert!(plan.notes.contains(&PlanNote::Excluded { slug: "b".into() }));
    }

    #[test]
    fn strategic_ranks_then_discovery_order() {
        let mut params = StrategyParams::default();
        params.strategic = StrategicParams {
            rank: Some(strings(&["debug", "code"])),
            ..Default::default()
        };

        let plan = resolve(
            StrategyName::Strategic,
            &params,
            &records(&["zeta", "code", "alpha", "debug"]),
        )
        .unwrap();

        assert_eq!(plan.slugs(), vec!["debug", "code", "zeta", "alpha"]);
    }

    #[test]
    fn strategic_default_rank_ignores_absent_modes_silently() {
        let plan = resolve(
            StrategyName::Strategic,
            &StrategyParams::default(),
            &records(&["mine", "ask", "code"]),
        )
        .unwrap();

        assert_eq!(plan.slugs(), vec!["code", "ask", "mine"]);
        assert!(plan.notes.is_empty());
    }

    #[test]
    fn configured_rank_notes_missing_slugs() {
        let mut params = StrategyParams::default();
        params.strategic.rank = Some(strings(&["ghost", "code"]));

        let plan = resolve(StrategyName::Strategic, &params, &records(&["code"])).unwrap();

        assert_eq!(plan.slugs(), vec!["code"]);
        assert_eq!(
            plan.notes,
            vec![PlanNote::MissingMember {
                slug: "ghost".into(),
                origin: "rank".into()
            }]
        );
    }

    #[test]
    fn missing_group_member_is_dropped_with_note() {
        let mut params = StrategyParams::default();
        params.groupings = GroupingsParams {
            active_group: Some("G".into()),
            ..groupings(&[("G", &["a", "ghost"])])
        };

        let plan = resolve(StrategyName::Groupings, &params, &records(&["a", "other"])).unwrap();

        assert_eq!(plan.slugs(), vec!["a"]);
        assert_eq!(
            plan.notes,
            vec![
                PlanNote::MissingMember {
                    slug: "ghost".into(),
                    origin: "group 'G'".into()
                },
                PlanNote::NotSelected {
                    slug: "other".into()
                },
            ]
        );
    }

    #[test]
    fn active_groups_concatenate_without_duplicates() {
        let mut params = StrategyParams::default();
        params.groupings = GroupingsParams {
            active_groups: Some(strings(&["second", "first"])),
            ..groupings(&[("first", &["a", "b"]), ("second", &["b", "c"])])
        };

        let plan = resolve(StrategyName::Groupings, &params, &records(&["a", "b", "c"])).unwrap();
        assert_eq!(plan.slugs(), vec!["b", "c", "a"]);
    }

    #[test]
    fn both_active_fields_are_rejected() {
        let mut params = StrategyParams::default();
        params.groupings = GroupingsParams {
            active_group: Some("first".into()),
            active_groups: Some(strings(&["first"])),
            ..groupings(&[("first", &["a"])])
        };

        let err = resolve(StrategyName::Groupings, &params, &records(&["a"])).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn alphabetical_sorts_within_categories() {
        let valid = vec![
            record("code", "core"),
            record("ask", "core"),
            record("zed-plus", "enhanced"),
            record("b-helper", "hybrid"),
            record("a-helper", "hybrid"),
        ];
        let plan = resolve(StrategyName::Alphabetical, &StrategyParams::default(), &valid).unwrap();
        assert_eq!(plan.slugs(), vec!["ask", "code", "zed-plus", "a-helper", "b-helper"]);
    }

    #[test]
    fn output_never_repeats_a_slug() {
        let mut params = StrategyParams::default();
        params.strategic = StrategicParams {
            rank: Some(strings(&["a", "a", "b"])),
            priority_first: strings(&["b", "b"]),
            ..Default::default()
        };

        let plan = resolve(StrategyName::Strategic, &params, &records(&["a", "b"])).unwrap();
        assert_eq!(plan.slugs(), vec!["b", "a"]);
    }

    #[test]
    fn category_order_drops_unlisted_categories() {
        let valid = vec![
            record("zed", "core"),
            record("ask", "core"),
            record("tool", "specialized"),
            record("planner", "hybrid"),
        ];
        let mut params = StrategyParams::default();
        params.category = CategoryParams {
            category_order: Some(strings(&["specialized", "core"])),
            ..Default::default()
        };

        let plan = resolve(StrategyName::Category, &params, &valid).unwrap();
        assert_eq!(plan.slugs(), vec!["tool", "ask", "zed"]);
        assert_eq!(
            plan.notes,
            vec![PlanNote::OutsideCategoryOrder {
                slug: "planner".into(),
                category: "hybrid".into(),
            }]
        );
    }

    #[test]
    fn manual_sort_puts_listed_slugs_first() {
        let valid = vec![
            record("ask", "core"),
            record("code", "core"),
            record("debug", "core"),
            record("tool", "specialized"),
        ];
        let mut params = StrategyParams::default();
        params.category = CategoryParams {
            within_category_sort: WithinCategorySort::Manual,
            manual_category_order: BTreeMap::from([(
                "core".to_string(),
                strings(&["debug", "tool", "code"]),
            )]),
            ..Default::default()
        };

        let plan = resolve(StrategyName::Category, &params, &valid).unwrap();
        assert_eq!(plan.slugs(), vec!["debug", "code", "ask", "tool"]);
        assert!(plan.notes.is_empty());
    }

    #[test]
    fn default_category_order_files_unknown_directories_last() {
        let valid = vec![
            record("planner", "hybrid"),
            record("tool", "specialized"),
            record("code", "core"),
        ];
        let plan = resolve(StrategyName::Category, &StrategyParams::default(), &valid).unwrap();
        assert_eq!(plan.slugs(), vec!["code", "tool", "planner"]);
        assert!(plan.notes.is_empty());
    }

    #[test]
    fn custom_order_then_the_rest_alphabetically() {
        let valid = records(&["gamma", "alpha", "delta", "beta"]);
        let mut params = StrategyParams::default();
        params.custom = CustomParams {
            custom_order: strings(&["delta", "ghost", "beta"]),
            exclude: strings(&["alpha"]),
            ..Default::default()
        };

        let plan = resolve(StrategyName::Custom, &params, &valid).unwrap();
        assert_eq!(plan.slugs(), vec!["delta", "beta", "gamma"]);
        assert_eq!(
            plan.notes,
            vec![
                PlanNote::MissingMember {
                    slug: "ghost".into(),
                    origin: "custom_order".into(),
                },
                PlanNote::Excluded { slug: "alpha".into() },
            ]
        );
    }
}
