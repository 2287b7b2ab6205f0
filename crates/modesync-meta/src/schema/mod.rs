//! Schema definitions for mode records and strategy policies
//!
//! - [`mode`] - the raw [`ModeDocument`] read from disk and the validated [`ModeRecord`]
//! - [`policy`] - strategy names and their parameter tables

pub mod mode;
pub mod policy;

pub use mode::{Capability, Group, ModeDocument, ModeRecord};
pub use policy::{
    AlphabeticalParams, CategoryParams, CustomParams, DEFAULT_CATEGORY_ORDER, DEFAULT_RANK,
    GroupingsParams, StrategicParams, StrategyName, StrategyOverrides, StrategyParams,
    WithinCategorySort,
};
