//! End-of-run report
//!
//! Every session run, successful or not, produces a [`SyncReport`]. It is
//! rendered for humans by the CLI and serialized as-is for `--json`.

use modesync_fs::NormalizedPath;
use modesync_meta::{ParseError, ValidationLevel};
use serde::Serialize;

use super::merge::SlugChange;
use super::strategy::PlanNote;
use crate::target::TargetKind;

/// Which entry point a session ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunMode {
    Sync { dry_run: bool },
    ValidateOnly,
    ListModes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionState {
    Init,
    Discover,
    Validate,
    Plan,
    Merge,
    Write,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Success,
    Partial,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Partial => "PARTIAL",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final disposition of one discovered record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Disposition {
    Included,
    /// Blocking validation errors or a duplicate slug
    Excluded { reason: String },
    /// Valid, but left out by the strategy
    Omitted { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordReport {
    pub label: String,
    /// Slug after normalization, when the record is valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub source: NormalizedPath,
    pub category: String,
    pub disposition: Disposition,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// One mode in a `--list-modes` listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListedMode {
    pub label: String,
    pub source: NormalizedPath,
    /// Required fields that are absent or empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryListing {
    pub name: String,
    pub modes: Vec<ListedMode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    Written,
    Unchanged,
    WouldWrite,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetReport {
    pub kind: TargetKind,
    pub path: NormalizedPath,
    pub status: TargetStatus,
    pub changes: Vec<SlugChange>,
    /// Kept entries were moved to follow the plan order.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reordered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<NormalizedPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TargetReport {
    pub fn failed(&self) -> bool {
        self.status == TargetStatus::Failed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub mode: RunMode,
    pub status: RunStatus,
    pub level: ValidationLevel,
    pub strategy: String,
    /// States visited, in order.
    pub states: Vec<SessionState>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryListing>,
    pub records: Vec<RecordReport>,
    pub parse_errors: Vec<ParseError>,
    pub plan: Vec<String>,
    pub notes: Vec<PlanNote>,
    pub targets: Vec<TargetReport>,
    /// Why the run failed before writing anything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl SyncReport {
    pub(crate) fn new(mode: RunMode, level: ValidationLevel, strategy: &str) -> Self {
        Self {
            mode,
            status: RunStatus::Success,
            level,
            strategy: strategy.to_string(),
            states: Vec::new(),
            categories: Vec::new(),
            records: Vec::new(),
            parse_errors: Vec::new(),
            plan: Vec::new(),
            notes: Vec::new(),
            targets: Vec::new(),
            failure: None,
        }
    }

    pub fn excluded(&self) -> impl Iterator<Item = &RecordReport> {
        self.records
            .iter()
            .filter(|r| matches!(r.disposition, Disposition::Excluded { .. }))
    }

    pub fn included(&self) -> impl Iterator<Item = &RecordReport> {
        self.records
            .iter()
            .filter(|r| r.disposition == Disposition::Included)
    }

    /// Blocking validation errors or unparsable files exist.
    pub fn has_blocking_errors(&self) -> bool {
        !self.parse_errors.is_empty() || self.records.iter().any(|r| !r.errors.is_empty())
    }

    pub fn target_failed(&self) -> bool {
        self.targets.iter().any(TargetReport::failed)
    }

    pub fn target(&self, kind: TargetKind) -> Option<&TargetReport> {
        self.targets.iter().find(|t| t.kind == kind)
    }

    /// Process exit code for this report. Usage errors never produce a
    /// report; the CLI maps them to 2.
    pub fn exit_code(&self) -> i32 {
        match self.mode {
            RunMode::ValidateOnly => i32::from(self.has_blocking_errors()),
            RunMode::ListModes => 0,
            RunMode::Sync { .. } => match self.status {
                RunStatus::Success => 0,
                RunStatus::Partial => i32::from(self.target_failed()),
                RunStatus::Failed => 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn report(status: RunStatus) -> SyncReport {
        let mut report = SyncReport::new(
            RunMode::Sync { dry_run: false },
            ValidationLevel::Standard,
            "strategic",
        );
        report.status = status;
        report
    }

    fn target(status: TargetStatus) -> TargetReport {
        TargetReport {
            kind: TargetKind::Global,
            path: NormalizedPath::new("/x/custom_modes.yaml"),
            status,
            changes: Vec::new(),
            reordered: false,
            diff: None,
            backup: None,
            error: None,
        }
    }

    #[test]
    fn partial_without_target_failure_exits_zero() {
        let mut report = report(RunStatus::Partial);
        report.targets.push(target(TargetStatus::Written));
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn partial_with_target_failure_exits_one() {
        let mut report = report(RunStatus::Partial);
        report.targets.push(target(TargetStatus::Written));
        report.targets.push(target(TargetStatus::Failed));
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn failed_exits_one() {
        assert_eq!(report(RunStatus::Failed).exit_code(), 1);
    }

    #[test]
    fn serializes_status_and_states_in_upper_case() {
        let mut report = report(RunStatus::Partial);
        report.states = vec![SessionState::Init, SessionState::Report];
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "PARTIAL");
        assert_eq!(json["states"], serde_json::json!(["INIT", "REPORT"]));
        assert_eq!(json["mode"]["kind"], "sync");
    }
}
