//! The sync pipeline
//!
//! - [`strategy`]: named policy to ordered [`SyncPlan`]
//! - [`merge`](mod@merge): plan plus existing target to merged target and per-slug transitions
//! - [`writer`]: rendering, diffing, backups and the atomic write
//! - [`session`]: the state machine running all of the above
//! - [`report`]: what a run hands back

pub mod merge;
pub mod report;
pub mod session;
pub mod strategy;
pub mod writer;

pub use merge::{MergeResult, SlugChange, Transition, merge};
pub use report::{
    CategoryListing, Disposition, ListedMode, RecordReport, RunMode, RunStatus, SessionState,
    SyncReport, TargetReport, TargetStatus,
};
pub use session::SyncSession;
pub use strategy::{PlanNote, SyncPlan, resolve};
pub use writer::{TargetWriter, WriteOutcome, WriteStatus, unified_diff};
