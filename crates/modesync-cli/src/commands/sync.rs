//! Sync command implementation
//!
//! Runs a [`SyncSession`] in the mode selected by the flags and prints the
//! report, either for humans or as JSON.

use std::path::Path;

use colored::Colorize;
use modesync_core::{
    Disposition, PlanNote, RunMode, RunStatus, SyncReport, SyncSession, TargetReport,
    TargetStatus, Transition,
};

use super::settings::{absolute, load_settings};
use crate::cli::SyncArgs;
use crate::error::Result;

/// Run the sync command and return the process exit code.
pub fn run_sync(cwd: &Path, args: &SyncArgs) -> Result<i32> {
    let mut settings = load_settings(cwd, &args.paths)?;
    if let Some(dir) = &args.modes_dir {
        settings.modes_dir = absolute(cwd, dir);
    }
    if let Some(strategy) = &args.strategy {
        settings.strategy = strategy.clone();
    }
    settings.overrides = args.overrides();
    if let Some(target) = args.target {
        settings.targets = target.into();
    }
    if let Some(level) = args.level() {
        settings.level = level;
    }
    if args.no_backup {
        settings.backups = false;
    }

    let mode = if args.validate_only {
        RunMode::ValidateOnly
    } else if args.list_modes {
        RunMode::ListModes
    } else {
        RunMode::Sync {
            dry_run: args.dry_run,
        }
    };

    let report = SyncSession::new(settings).run(mode)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(report.exit_code())
}

fn print_report(report: &SyncReport) {
    match report.mode {
        RunMode::ListModes => print_listing(report),
        RunMode::ValidateOnly => print_records(report),
        RunMode::Sync { dry_run } => {
            print_records(report);
            print_plan(report);
            for target in &report.targets {
                print_target(target, dry_run);
            }
        }
    }
    print_parse_errors(report);
    print_status(report);
}

fn print_listing(report: &SyncReport) {
    for category in &report.categories {
        println!("{} ({})", category.name.bold(), category.modes.len());
        for mode in &category.modes {
            if mode.missing.is_empty() {
                println!("   {} {}", "-".green(), mode.label.cyan());
            } else {
                println!(
                    "   {} {} {}",
                    "-".yellow(),
                    mode.label.cyan(),
                    format!("(missing {})", mode.missing.join(", ")).yellow()
                );
            }
        }
    }
}

fn print_records(report: &SyncReport) {
    println!(
        "{} Validated {} mode(s) at level {}",
        "=>".blue().bold(),
        report.records.len(),
        report.level.as_str().cyan()
    );
    for record in &report.records {
        match &record.disposition {
            Disposition::Included => {}
            Disposition::Excluded { reason } => {
                println!("   {} {}: {}", "x".red(), record.label.cyan(), reason);
            }
            Disposition::Omitted { reason } => {
                println!("   {} {}: {}", "-".dimmed(), record.label.cyan(), reason.dimmed());
            }
        }
        for warning in &record.warnings {
            println!("   {} {}: {}", "!".yellow(), record.label.cyan(), warning);
        }
    }
}

fn print_plan(report: &SyncReport) {
    if report.plan.is_empty() {
        return;
    }
    println!(
        "{} Plan ({}): {}",
        "=>".blue().bold(),
        report.strategy.cyan(),
        report.plan.join(", ")
    );
    for note in &report.notes {
        if let PlanNote::MissingMember { slug, origin } = note {
            println!(
                "   {} {} named by {} is not a valid mode",
                "!".yellow(),
                slug.cyan(),
                origin
            );
        }
    }
}

fn print_target(target: &TargetReport, dry_run: bool) {
    let status = match target.status {
        TargetStatus::Written => "written".green(),
        TargetStatus::Unchanged => "unchanged".dimmed(),
        TargetStatus::WouldWrite => "would write".yellow(),
        TargetStatus::Failed => "failed".red().bold(),
    };
    println!(
        "{} {} target {} ({})",
        "=>".blue().bold(),
        target.kind,
        target.path.as_str().cyan(),
        status
    );
    if let Some(error) = &target.error {
        println!("   {}", error.red());
    }
    for change in &target.changes {
        let (marker, label) = match change.transition {
            Transition::Added => ("+".green(), "added".green()),
            Transition::Updated => ("~".yellow(), "updated".yellow()),
            Transition::Unchanged => ("=".dimmed(), "unchanged".dimmed()),
            Transition::Removed => ("-".red(), "removed".red()),
            Transition::Conflict => ("!".red().bold(), "conflict: slug belongs to a foreign entry".red()),
        };
        let drift = if change.drifted {
            " (edited outside modesync)".yellow().to_string()
        } else {
            String::new()
        };
        println!("   {} {} {}{}", marker, change.slug, label, drift);
    }
    if target.reordered {
        println!("   {} {}", "~".yellow(), "entries reordered to follow the plan".yellow());
    }
    if let Some(backup) = &target.backup {
        println!("   {} {}", "backup:".dimmed(), backup);
    }
    if dry_run && let Some(diff) = &target.diff {
        println!();
        for line in diff.lines() {
            if line.starts_with("+++") || line.starts_with("---") {
                println!("{}", line.bold());
            } else if line.starts_with('+') {
                println!("{}", line.green());
            } else if line.starts_with('-') {
                println!("{}", line.red());
            } else if line.starts_with("@@") {
                println!("{}", line.cyan());
            } else {
                println!("{}", line);
            }
        }
    }
}

fn print_parse_errors(report: &SyncReport) {
    for error in &report.parse_errors {
        println!("   {} {}", "parse error:".red(), error);
    }
}

fn print_status(report: &SyncReport) {
    let status = match report.status {
        RunStatus::Success => report.status.as_str().green().bold(),
        RunStatus::Partial => report.status.as_str().yellow().bold(),
        RunStatus::Failed => report.status.as_str().red().bold(),
    };
    match &report.failure {
        Some(reason) => println!("{} {}", status, reason),
        None => println!("{}", status),
    }
}
