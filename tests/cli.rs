use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const AGGREGATOR_CSV: &str = "\
Date,Account,Description,Category,Tags,Amount
2025-01-01,Chase,Coffee Shop,Dining,Personal,-50.00
2025-01-03,Chase,Gym,Health,,-75.00
";

const CHASE_CSV: &str = "\
Details,Posting Date,Description,Amount,Type,Balance,Check or Slip #
DEBIT,01/01/2025,COFFEE SHOP #42,-50.00,DEBIT_CARD,950.00,
DEBIT,01/05/2025,GYM MEMBERSHIP,-75.00,DEBIT_CARD,875.00,
";

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn reconcile(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("reconcile").unwrap();
    cmd.current_dir(home).env("HOME", home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn run_writes_reconciled_outputs() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("aggregator.csv"), AGGREGATOR_CSV);
    write(&dir.path().join("details").join("chase.csv"), CHASE_CSV);

    reconcile(dir.path())
        .args(["run", "--aggregator", "aggregator.csv", "--details", "details", "--output", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reconciliation Summary"))
        .stdout(predicate::str::contains("Match rate: 33.3%"));

    let all = std::fs::read_to_string(dir.path().join("out/reconciled/all_transactions.csv")).unwrap();
    let lines: Vec<&str> = all.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Date,YearMonth,Account,Description,Category,Tags,Amount,ReconciledKey,Matched",
            "2025-01-01,2025-01,Chase,COFFEE SHOP #42,Dining,Personal,-50.00,P:2025-01-01_-50.0,true",
            "2025-01-05,2025-01,,GYM MEMBERSHIP,,,-75.00,U:2025-01-05_-75.0,false",
            "2025-01-03,2025-01,Chase,Gym,Health,,-75.00,U:2025-01-03_-75.0,false",
        ]
    );

    let unmatched =
        std::fs::read_to_string(dir.path().join("out/unmatched/unmatched_transactions.csv")).unwrap();
    assert_eq!(unmatched.lines().count(), 3);

    let summary: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("out/summary.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(summary["summary"]["matched"], 1);
    assert_eq!(summary["summary"]["unmatched_detail"], 1);
    assert_eq!(summary["summary"]["unmatched_aggregator"], 1);

    let logs: Vec<_> = std::fs::read_dir(dir.path().join("logs")).unwrap().collect();
    assert_eq!(logs.len(), 1);
}

#[test]
fn run_reports_skipped_detail_files() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("aggregator.csv"), AGGREGATOR_CSV);
    write(&dir.path().join("details").join("chase.csv"), CHASE_CSV);
    write(&dir.path().join("details").join("mystery.csv"), "Foo,Bar\n1,2\n");

    reconcile(dir.path())
        .args(["run", "--aggregator", "aggregator.csv", "--details", "details"])
        .assert()
        .success()
        .stderr(predicate::str::contains("mystery.csv"));

    assert!(dir.path().join("output/reconciled/all_transactions.csv").exists());
}

#[test]
fn run_missing_aggregator_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("details")).unwrap();

    reconcile(dir.path())
        .args(["run", "--aggregator", "nope.csv", "--details", "details"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Input not found"));

    assert!(!dir.path().join("output/summary.json").exists());
}

#[test]
fn run_missing_details_folder_fails() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("aggregator.csv"), AGGREGATOR_CSV);

    reconcile(dir.path())
        .args(["run", "--aggregator", "aggregator.csv", "--details", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input not found"));
}

#[test]
fn run_uses_settings_defaults() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("data/aggregator.csv"), AGGREGATOR_CSV);
    write(&dir.path().join("data/details/chase.csv"), CHASE_CSV);
    let settings = serde_json::json!({
        "output_dir": dir.path().join("results"),
        "log_dir": dir.path().join("run-logs"),
        "aggregator": dir.path().join("data/aggregator.csv"),
        "details_dir": dir.path().join("data/details"),
    });
    write(
        &dir.path().join(".config/reconcile/settings.json"),
        &settings.to_string(),
    );

    reconcile(dir.path()).arg("run").assert().success();

    assert!(dir.path().join("results/summary.json").exists());
    assert!(dir.path().join("run-logs").is_dir());
}

#[test]
fn init_saves_settings_used_by_run() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("data/aggregator.csv"), AGGREGATOR_CSV);
    write(&dir.path().join("data/details/chase.csv"), CHASE_CSV);
    let out = dir.path().join("results");

    reconcile(dir.path())
        .args(["init", "--aggregator", "data/aggregator.csv", "--details", "data/details"])
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved settings"));

    let saved: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join(".config/reconcile/settings.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(saved["aggregator"], "data/aggregator.csv");
    assert_eq!(saved["details_dir"], "data/details");
    assert_eq!(saved["log_dir"], "logs");
    assert!(out.join("reconciled").is_dir());

    reconcile(dir.path()).arg("run").assert().success();
    assert!(out.join("summary.json").exists());
}

#[test]
fn run_without_inputs_fails() {
    let dir = tempfile::tempdir().unwrap();
    reconcile(dir.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--aggregator is required"));
}

#[test]
fn detect_prints_format() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("chase.csv"), CHASE_CSV);

    reconcile(dir.path())
        .args(["detect", "chase.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Chase (chase)"))
        .stdout(predicate::str::contains("2 rows"));
}

#[test]
fn detect_unrecognized_fails() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("odd.csv"), "Foo,Bar\n1,2\n");

    reconcile(dir.path())
        .args(["detect", "odd.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unrecognized format"));
}

#[test]
fn formats_lists_all_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let output = reconcile(dir.path()).arg("formats").assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();

    let visa = stdout.find("alliant_visa").unwrap();
    let checking = stdout.find("alliant_checking").unwrap();
    assert!(visa < checking);
    assert!(stdout.contains("capital_one"));
}

#[test]
fn formats_unknown_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    reconcile(dir.path())
        .args(["formats", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format key"));
}
