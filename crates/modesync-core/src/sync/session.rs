//! Session controller
//!
//! One [`SyncSession`] owns the resolved settings for a run and walks the
//! pipeline `INIT -> DISCOVER -> VALIDATE -> PLAN -> MERGE -> WRITE -> REPORT`,
//! leaving early for validate-only, list-only and dry runs. Each target's raw
//! content is read once during preflight and threaded through the run; no
//! state outlives the session.

use std::collections::HashSet;

use modesync_blocks::LoadedTarget;
use modesync_fs::{NormalizedPath, io};
use modesync_meta::{
    Discovery, ModeRecord, StrategyName, StrategyParams, ValidationLevel, discover,
    presence_check, validate,
};

use super::merge::{MergeResult, Transition, merge};
use super::report::{
    CategoryListing, Disposition, ListedMode, RecordReport, RunMode, RunStatus, SessionState,
    SyncReport, TargetReport, TargetStatus,
};
use super::strategy::{SyncPlan, resolve};
use super::writer::{TargetWriter, WriteStatus};
use crate::backup::BackupManager;
use crate::config::SyncSettings;
use crate::target::TargetKind;
use crate::{Error, Result};

/// A selected target as read during preflight.
#[derive(Debug)]
struct PreparedTarget {
    kind: TargetKind,
    path: NormalizedPath,
    raw: Option<String>,
}

pub struct SyncSession {
    settings: SyncSettings,
}

impl SyncSession {
    pub fn new(settings: SyncSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Run the pipeline in `mode`.
    ///
    /// Returns `Err` only for usage errors found during preflight and for
    /// unexpected I/O failures; every other outcome is in the report.
    pub fn run(&self, mode: RunMode) -> Result<SyncReport> {
        let level = self.settings.level;
        let mut report = SyncReport::new(mode, level, &self.settings.strategy);

        enter(&mut report, SessionState::Init);
        self.check_modes_dir()?;
        let (strategy, targets) = match mode {
            RunMode::Sync { .. } => {
                let strategy = self.check_strategy()?;
                report.strategy = strategy.to_string();
                (Some(strategy), self.prepare_targets()?)
            }
            RunMode::ValidateOnly | RunMode::ListModes => (None, Vec::new()),
        };

        enter(&mut report, SessionState::Discover);
        let discovery = discover(&self.settings.modes_dir)?;
        report.parse_errors = discovery.parse_errors().cloned().collect();

        enter(&mut report, SessionState::Validate);
        if mode == RunMode::ListModes {
            report.categories = list(&discovery);
            report.status = if report.parse_errors.is_empty() {
                RunStatus::Success
            } else {
                RunStatus::Partial
            };
            return Ok(finish(report));
        }

        let valid = validate_all(&discovery, level, &mut report);

        let blocking = report.has_blocking_errors();
        if mode == RunMode::ValidateOnly {
            report.status = match (blocking, level) {
                (false, _) => RunStatus::Success,
                (true, ValidationLevel::Strict) => RunStatus::Failed,
                (true, _) => RunStatus::Partial,
            };
            return Ok(finish(report));
        }
        if blocking && level == ValidationLevel::Strict {
            return Ok(fail(report, "blocking validation errors under the strict level"));
        }

        let (Some(strategy), RunMode::Sync { dry_run }) = (strategy, mode) else {
            return Ok(finish(report));
        };

        enter(&mut report, SessionState::Plan);
        let plan = resolve(strategy, &self.strategy_params(strategy), &valid)?;
        report.plan = plan.slugs().into_iter().map(str::to_string).collect();
        report.notes = plan.notes.clone();
        mark_omitted(&mut report, &plan);
        if plan.is_empty() {
            return Ok(fail(report, "no valid mode records to sync; nothing was written"));
        }

        enter(&mut report, SessionState::Merge);
        let merged: Vec<(PreparedTarget, std::result::Result<(LoadedTarget, MergeResult), String>)> =
            targets
                .into_iter()
                .map(|target| {
                    let result = LoadedTarget::from_raw(&target.path, target.raw.clone())
                        .map(|loaded| {
                            let merged = merge(&loaded.config, &plan, target.kind.source_tag());
                            (loaded, merged)
                        })
                        .map_err(|e| {
                            tracing::warn!(path = %target.path, error = %e, "Target does not parse, leaving it untouched");
                            e.to_string()
                        });
                    (target, result)
                })
                .collect();

        if !dry_run {
            enter(&mut report, SessionState::Write);
        }
        let backups = self.backup_manager(dry_run);
        let mut writer = TargetWriter::new(dry_run);
        if let Some(manager) = &backups {
            writer = writer.with_backups(manager);
        }
        for (target, result) in merged {
            let target_report = match result {
                Ok((loaded, merged)) => write_target(&writer, &target, &loaded, merged),
                Err(error) => TargetReport {
                    kind: target.kind,
                    path: target.path,
                    status: TargetStatus::Failed,
                    changes: Vec::new(),
                    reordered: false,
                    diff: None,
                    backup: None,
                    error: Some(error),
                },
            };
            report.targets.push(target_report);
        }

        report.status = sync_status(&report);
        Ok(finish(report))
    }

    fn check_modes_dir(&self) -> Result<()> {
        let root = self.settings.modes_dir.to_native();
        if !root.exists() {
            return Err(modesync_meta::Error::ModesDirNotFound { path: root }.into());
        }
        if !root.is_dir() {
            return Err(modesync_meta::Error::NotADirectory { path: root }.into());
        }
        Ok(())
    }

    fn check_strategy(&self) -> Result<StrategyName> {
        let strategy: StrategyName = self.settings.strategy.parse()?;
        self.strategy_params(strategy).check(strategy)?;
        Ok(strategy)
    }

    /// Configured parameters with the per-run overrides applied.
    fn strategy_params(&self, strategy: StrategyName) -> StrategyParams {
        let mut params = self.settings.strategies.clone();
        if !self.settings.overrides.is_empty() {
            tracing::debug!(strategy = %strategy, overrides = ?self.settings.overrides, "Applying strategy overrides");
            params.apply(strategy, &self.settings.overrides);
        }
        params
    }

    fn target_path(&self, kind: TargetKind) -> Result<NormalizedPath> {
        match kind {
            TargetKind::Global => self.settings.global_target.clone().ok_or_else(|| {
                Error::usage("no global target configured; pass --global-target or set MODESYNC_GLOBAL_TARGET")
            }),
            TargetKind::Local => Ok(self.settings.local_target.clone()),
        }
    }

    /// Resolve and read every selected target before any work begins.
    fn prepare_targets(&self) -> Result<Vec<PreparedTarget>> {
        let mut prepared = Vec::new();
        for kind in self.settings.targets.kinds() {
            let path = self.target_path(kind)?;
            let raw = io::read_optional_text(&path).map_err(|e| Error::TargetUnreadable {
                path: path.to_native(),
                reason: e.to_string(),
            })?;
            tracing::debug!(target_kind = %kind, path = %path, exists = raw.is_some(), "Prepared target");
            prepared.push(PreparedTarget { kind, path, raw });
        }
        Ok(prepared)
    }

    fn backup_manager(&self, dry_run: bool) -> Option<BackupManager> {
        if dry_run || !self.settings.backups {
            return None;
        }
        match &self.settings.backup_dir {
            Some(dir) => Some(BackupManager::new(dir.clone())),
            None => {
                tracing::warn!("No backup directory available, writing without backups");
                None
            }
        }
    }
}

fn enter(report: &mut SyncReport, state: SessionState) {
    tracing::info!(state = ?state, "Entering state");
    report.states.push(state);
}

fn finish(mut report: SyncReport) -> SyncReport {
    enter(&mut report, SessionState::Report);
    tracing::info!(status = %report.status, "Run finished");
    report
}

fn fail(mut report: SyncReport, reason: &str) -> SyncReport {
    tracing::warn!(reason, "Run failed");
    report.status = RunStatus::Failed;
    report.failure = Some(reason.to_string());
    finish(report)
}

fn list(discovery: &Discovery) -> Vec<CategoryListing> {
    discovery
        .categories
        .iter()
        .map(|category| CategoryListing {
            name: category.name.clone(),
            modes: category
                .entries
                .iter()
                .filter_map(|entry| entry.outcome.as_ref().ok())
                .map(|doc| ListedMode {
                    label: doc.label(),
                    source: doc.source.clone(),
                    missing: presence_check(doc),
                })
                .collect(),
        })
        .collect()
}

/// Validate every document in discovery order. Returns the valid records,
/// first occurrence of each slug only.
fn validate_all(
    discovery: &Discovery,
    level: ValidationLevel,
    report: &mut SyncReport,
) -> Vec<ModeRecord> {
    let mut valid = Vec::new();
    let mut seen = HashSet::new();

    for doc in discovery.documents() {
        let outcome = validate(doc, level);
        for warning in &outcome.warnings {
            tracing::debug!(mode = %outcome.label, warning = %warning, "Validation warning");
        }

        let disposition = match &outcome.record {
            None => {
                let reason = outcome
                    .errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                tracing::warn!(mode = %outcome.label, reason = %reason, "Excluding invalid mode");
                Disposition::Excluded { reason }
            }
            Some(record) if !seen.insert(record.slug.clone()) => {
                tracing::warn!(slug = %record.slug, source = %record.source, "Excluding duplicate slug");
                Disposition::Excluded {
                    reason: "duplicate slug".to_string(),
                }
            }
            Some(record) => {
                valid.push(record.clone());
                Disposition::Included
            }
        };

        report.records.push(RecordReport {
            label: outcome.label.clone(),
            slug: outcome.slug().map(str::to_string),
            source: outcome.source.clone(),
            category: doc.category.clone(),
            disposition,
            errors: outcome.errors.iter().map(ToString::to_string).collect(),
            warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
        });
    }
    valid
}

/// Valid records the strategy left out become `Omitted`.
fn mark_omitted(report: &mut SyncReport, plan: &SyncPlan) {
    let planned: HashSet<&str> = plan.slugs().into_iter().collect();
    for record in &mut report.records {
        if record.disposition != Disposition::Included {
            continue;
        }
        let Some(slug) = record.slug.as_deref() else {
            continue;
        };
        if planned.contains(slug) {
            continue;
        }
        let reason = plan
            .notes
            .iter()
            .find(|note| note.slug() == slug)
            .map(|note| note.reason())
            .unwrap_or_else(|| "not planned".to_string());
        record.disposition = Disposition::Omitted { reason };
    }
}

fn write_target(
    writer: &TargetWriter<'_>,
    target: &PreparedTarget,
    loaded: &LoadedTarget,
    merged: MergeResult,
) -> TargetReport {
    let mut report = TargetReport {
        kind: target.kind,
        path: target.path.clone(),
        status: TargetStatus::Unchanged,
        changes: merged.changes.clone(),
        reordered: merged.reordered,
        diff: None,
        backup: None,
        error: None,
    };

    // Leave existing files alone when no owned entry changes or moves, even
    // if their formatting differs from ours.
    if loaded.raw.is_some() && !merged.has_changes() {
        tracing::debug!(path = %target.path, "No owned entry changed");
        return report;
    }

    match writer.write(target.kind, &target.path, loaded.raw.as_deref(), &merged.config) {
        Ok(outcome) => {
            report.status = match outcome.status {
                WriteStatus::Written => TargetStatus::Written,
                WriteStatus::Unchanged => TargetStatus::Unchanged,
                WriteStatus::WouldWrite => TargetStatus::WouldWrite,
            };
            report.diff = outcome.diff;
            report.backup = outcome.backup.map(|b| b.path);
        }
        Err(e) => {
            tracing::warn!(path = %target.path, error = %e, "Target write failed");
            report.status = TargetStatus::Failed;
            report.error = Some(e.to_string());
        }
    }
    report
}

fn sync_status(report: &SyncReport) -> RunStatus {
    if report.targets.iter().all(TargetReport::failed) {
        return RunStatus::Failed;
    }
    let conflicted = report
        .targets
        .iter()
        .flat_map(|t| &t.changes)
        .any(|c| c.transition == Transition::Conflict);
    if report.target_failed()
        || conflicted
        || report.excluded().next().is_some()
        || !report.parse_errors.is_empty()
    {
        RunStatus::Partial
    } else {
        RunStatus::Success
    }
}
