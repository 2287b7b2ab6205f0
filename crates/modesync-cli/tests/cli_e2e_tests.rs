//! End-to-end tests for the `modesync` binary.
//!
//! Every invocation passes explicit paths (and an empty user settings
//! directory) so the tests never touch the real host configuration.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use modesync_test_utils::ModesFixture;
use predicates::prelude::*;

fn modesync() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("modesync"));
    for var in [
        "MODESYNC_CONFIG_DIR",
        "MODESYNC_GLOBAL_TARGET",
        "MODESYNC_LOCAL_TARGET",
        "MODESYNC_BACKUP_DIR",
        "MODESYNC_MODES_DIR",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Path flags pointing every location into the fixture.
fn path_args(fixture: &ModesFixture) -> Vec<String> {
    path_args_with_global(fixture, &fixture.global_target())
}

fn path_args_with_global(fixture: &ModesFixture, global: &Path) -> Vec<String> {
    vec![
        "--project".into(),
        fixture.project_dir().display().to_string(),
        "--config-dir".into(),
        fixture.root().join("user").display().to_string(),
        "--global-target".into(),
        global.display().to_string(),
        "--backup-dir".into(),
        fixture.backup_dir().display().to_string(),
    ]
}

fn sync(fixture: &ModesFixture, extra: &[&str]) -> Command {
    let mut cmd = modesync();
    cmd.current_dir(fixture.root())
        .arg("sync")
        .arg("--modes-dir")
        .arg(fixture.modes_dir())
        .args(path_args(fixture))
        .args(extra);
    cmd
}

fn two_modes() -> ModesFixture {
    let fixture = ModesFixture::new();
    fixture.add_mode("alpha");
    fixture.add_mode("beta");
    fixture
}

// ============================================================================
// Help and completions
// ============================================================================

#[test]
fn test_help_lists_commands() {
    modesync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("backup"));
}

#[test]
fn test_no_command_prints_hint() {
    modesync()
        .assert()
        .success()
        .stdout(predicate::str::contains("modesync --help"));
}

#[test]
fn test_completions_bash() {
    modesync()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("modesync"));
}

// ============================================================================
// Sync
// ============================================================================

#[test]
fn test_sync_writes_global_target() {
    let fixture = two_modes();

    sync(&fixture, &[])
        .assert()
        .success()
        .stdout(predicate::str::contains("SUCCESS"));

    let written = fixture.read(fixture.global_target());
    assert!(written.contains("slug: alpha"));
    assert!(written.contains("slug: beta"));
    assert!(written.contains("__modesync_managed__"));
}

#[test]
fn test_second_sync_reports_unchanged() {
    let fixture = two_modes();
    sync(&fixture, &[]).assert().success();
    let first = fixture.read(fixture.global_target());

    sync(&fixture, &[])
        .assert()
        .success()
        .stdout(predicate::str::contains("unchanged"));

    assert_eq!(fixture.read(fixture.global_target()), first);
}

#[test]
fn test_dry_run_prints_diff_and_writes_nothing() {
    let fixture = two_modes();

    sync(&fixture, &["--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("would write"))
        .stdout(predicate::str::contains("+- slug: alpha"));

    assert!(!fixture.global_target().exists());
    assert!(!fixture.backup_dir().exists());
}

#[test]
fn test_partial_run_names_excluded_mode() {
    let fixture = two_modes();
    fixture.write_mode("broken.yaml", "slug: broken\nname: Broken\ngroups: [read]\n");

    sync(&fixture, &[])
        .assert()
        .success()
        .stdout(predicate::str::contains("PARTIAL"))
        .stdout(predicate::str::contains("missing roleDefinition"));

    assert!(!fixture.read(fixture.global_target()).contains("broken"));
}

#[test]
fn test_strict_failure_exits_one_without_writing() {
    let fixture = two_modes();
    fixture.write_mode("broken.yaml", "slug: broken\nname: Broken\ngroups: [read]\n");

    sync(&fixture, &["--strict"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAILED"));

    assert!(!fixture.global_target().exists());
}

#[test]
fn test_missing_destination_dir_exits_one() {
    let fixture = two_modes();
    let mut cmd = modesync();
    cmd.current_dir(fixture.root())
        .arg("sync")
        .arg("--modes-dir")
        .arg(fixture.modes_dir())
        .args(path_args_with_global(
            &fixture,
            &fixture.root().join("absent").join("custom_modes.yaml"),
        ));

    cmd.assert().code(1).stdout(predicate::str::contains("failed"));
    assert!(!fixture.root().join("absent").exists());
}

#[test]
fn test_json_report_parses() {
    let fixture = two_modes();

    let output = sync(&fixture, &["--json"]).output().unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["status"], "SUCCESS");
    assert_eq!(report["plan"], serde_json::json!(["alpha", "beta"]));
    assert_eq!(report["targets"][0]["status"], "written");
}

#[test]
fn test_local_target_is_written_with_project_source() {
    let fixture = two_modes();

    sync(&fixture, &["--target", "local"]).assert().success();

    assert!(!fixture.global_target().exists());
    let written = fixture.read(fixture.local_target());
    assert!(written.contains("source: project"));
}

#[test]
fn test_custom_order_and_exclude_flags_shape_the_plan() {
    let fixture = two_modes();
    fixture.add_mode("gamma");

    let output = sync(
        &fixture,
        &["--strategy", "custom", "--custom-order", "gamma,beta", "--exclude", "beta", "--json"],
    )
    .output()
    .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["plan"], serde_json::json!(["gamma", "alpha"]));
}

#[test]
fn test_reordered_target_is_rewritten() {
    let fixture = two_modes();
    sync(&fixture, &[]).assert().success();

    sync(&fixture, &["--priority", "beta"])
        .assert()
        .success()
        .stdout(predicate::str::contains("entries reordered"));

    let written = fixture.read(fixture.global_target());
    let beta = written.find("slug: beta").unwrap();
    let alpha = written.find("slug: alpha").unwrap();
    assert!(beta < alpha);
}

// ============================================================================
// Validate-only and list-modes
// ============================================================================

#[test]
fn test_validate_only_exits_one_on_errors() {
    let fixture = two_modes();
    fixture.write_mode("broken.yaml", "slug: broken\nname: Broken\ngroups: [read]\n");

    sync(&fixture, &["--validate-only"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("missing roleDefinition"));

    assert!(!fixture.global_target().exists());
}

#[test]
fn test_validate_only_clean_exits_zero() {
    let fixture = two_modes();
    sync(&fixture, &["--validate-only"]).assert().success();
}

#[test]
fn test_list_modes_groups_by_category() {
    let fixture = two_modes();
    fixture.write_mode(
        "hybrid/planner.yaml",
        &modesync_test_utils::mode_yaml("planner"),
    );

    sync(&fixture, &["--list-modes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hybrid"))
        .stdout(predicate::str::contains("planner"));
}

// ============================================================================
// Usage errors
// ============================================================================

#[test]
fn test_conflicting_run_modes_exit_two() {
    let fixture = two_modes();
    sync(&fixture, &["--dry-run", "--validate-only"])
        .assert()
        .code(2);
}

#[test]
fn test_unknown_strategy_exits_two() {
    let fixture = two_modes();
    sync(&fixture, &["--strategy", "random"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown strategy"));

    assert!(!fixture.global_target().exists());
}

#[test]
fn test_missing_modes_dir_exits_two() {
    let fixture = ModesFixture::new();
    let mut cmd = modesync();
    cmd.current_dir(fixture.root())
        .arg("sync")
        .arg("--modes-dir")
        .arg(fixture.root().join("nowhere"))
        .args(path_args(&fixture));

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("Modes directory not found"));
}

// ============================================================================
// Backups
// ============================================================================

#[test]
fn test_backup_list_and_restore() {
    let fixture = two_modes();
    fixture.write_global_target("customModes: []\n");

    sync(&fixture, &[]).assert().success();
    assert!(fixture.read(fixture.global_target()).contains("slug: alpha"));

    let mut list = modesync();
    list.current_dir(fixture.root())
        .args(["backup", "list"])
        .args(path_args(&fixture))
        .assert()
        .success()
        .stdout(predicate::str::contains("custom_modes_1.yaml"));

    let mut restore = modesync();
    restore
        .current_dir(fixture.root())
        .args(["backup", "restore", "--target", "global"])
        .args(path_args(&fixture))
        .assert()
        .success()
        .stdout(predicate::str::contains("#1"));

    assert_eq!(fixture.read(fixture.global_target()), "customModes: []\n");
}

#[test]
fn test_restore_unknown_backup_exits_two() {
    let fixture = ModesFixture::new();
    fs::create_dir_all(fixture.backup_dir()).unwrap();

    modesync()
        .current_dir(fixture.root())
        .args(["backup", "restore", "--target", "global", "--number", "3"])
        .args(path_args(&fixture))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No backup found"));
}
