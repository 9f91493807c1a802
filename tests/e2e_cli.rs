//! CLI end-to-end tests
//!
//! Tests for the reelforge command-line interface. Every test points the
//! binary at a config inside a temp dir so stats land there.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the reelforge binary
#[allow(deprecated)]
fn reelforge_cmd() -> Command {
    let mut cmd = Command::cargo_bin("reelforge").unwrap();
    for var in [
        "SCHEDULE_INTERVAL_HOURS",
        "SCHEDULE_MAX_VIDEOS_PER_DAY",
        "SCHEDULE_RETRY_HOURS",
        "SCHEDULE_MIN_GAP_MINUTES",
        "SCHEDULE_PEAK_HOURS",
        "SCHEDULE_QUIET_HOURS",
        "SCHEDULE_WEEKEND_ENABLED",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn write_config(dir: &Path, extra: &str) -> std::path::PathBuf {
    let path = dir.join("reelforge.toml");
    let data_dir = dir.join("data");
    fs::write(
        &path,
        format!("[storage]\ndata_dir = {:?}\n{extra}", data_dir.display().to_string()),
    )
    .unwrap();
    path
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = reelforge_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = reelforge_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("reelforge"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = reelforge_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("reelforge"));
}

#[test]
fn test_cli_batch_help() {
    let mut cmd = reelforge_cmd();
    cmd.args(["batch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--count"));
}

#[test]
fn test_cli_validate_reports_warnings() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let mut cmd = reelforge_cmd();
    cmd.arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("collaborators.fetch has no command configured"));
}

#[test]
fn test_cli_validate_rejects_bad_peak_hours() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "[schedule]\npeak_hours = [\"21-19\"]\n");

    let mut cmd = reelforge_cmd();
    cmd.arg("validate").arg(&config).assert().failure();
}

#[test]
fn test_cli_status_json() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let mut cmd = reelforge_cmd();
    let output = cmd
        .arg("--config")
        .arg(&config)
        .args(["status", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total_runs"], 0);
    assert_eq!(json["max_videos_per_day"], 6);
    assert!(dir.path().join("data/scheduler_stats.json").exists());
}

#[test]
fn test_cli_config_prints_effective_schedule() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let mut cmd = reelforge_cmd();
    cmd.arg("--config")
        .arg(&config)
        .arg("config")
        .env("SCHEDULE_MAX_VIDEOS_PER_DAY", "9")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_videos_per_day = 9"))
        .stdout(predicate::str::contains("quiet_hours = \"23-6\""));
}

#[test]
fn test_cli_forced_run_without_collaborators_is_recorded() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let mut cmd = reelforge_cmd();
    cmd.arg("--config")
        .arg(&config)
        .args(["once", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fetch error"));

    let last = fs::read_to_string(dir.path().join("data/last_run.json")).unwrap();
    let last: serde_json::Value = serde_json::from_str(&last).unwrap();
    assert_eq!(last["status"], "failed");
}
