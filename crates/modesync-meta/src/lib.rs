//! Mode record metadata for modesync.
//!
//! This crate owns everything known about a single mode record: its schema,
//! the strictness-tunable validator, discovery of record files on disk, and
//! the parameter schema of the ordering strategies.

pub mod discovery;
pub mod error;
pub mod schema;
pub mod validation;

pub use discovery::{Category, DiscoveredEntry, Discovery, ParseError, discover};
pub use error::{Error, Result};
pub use schema::{
    AlphabeticalParams, Capability, CategoryParams, CustomParams, DEFAULT_CATEGORY_ORDER,
    DEFAULT_RANK, Group, GroupingsParams, ModeDocument, ModeRecord, StrategicParams,
    StrategyName, StrategyOverrides, StrategyParams, WithinCategorySort,
};
pub use validation::{
    Correction, Finding, ValidationLevel, ValidationOutcome, Warning, check, normalize,
    normalize_slug, presence_check, validate,
};
