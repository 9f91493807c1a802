//! Configuration loading integration tests.
//!
//! These touch the process environment, so every test is `#[serial]`.

use std::io::Write;

use serial_test::serial;

use reelforge::config::{load_config, load_config_or_default};
use rf_core::HourRange;

const SCHEDULE_VARS: [&str; 7] = [
    "SCHEDULE_INTERVAL_HOURS",
    "SCHEDULE_MAX_VIDEOS_PER_DAY",
    "SCHEDULE_RETRY_HOURS",
    "SCHEDULE_MIN_GAP_MINUTES",
    "SCHEDULE_PEAK_HOURS",
    "SCHEDULE_QUIET_HOURS",
    "SCHEDULE_WEEKEND_ENABLED",
];

fn clear_env() {
    for var in SCHEDULE_VARS {
        std::env::remove_var(var);
    }
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

// ---------------------------------------------------------------------------
// Environment overrides
// ---------------------------------------------------------------------------

#[test]
#[serial]
fn env_overrides_file_values() {
    clear_env();
    let file = write_config("[schedule]\ninterval_hours = 6\nmax_videos_per_day = 4\n");

    std::env::set_var("SCHEDULE_MAX_VIDEOS_PER_DAY", "2");
    std::env::set_var("SCHEDULE_PEAK_HOURS", "8-10, 17-19");
    std::env::set_var("SCHEDULE_QUIET_HOURS", "22-7");
    std::env::set_var("SCHEDULE_WEEKEND_ENABLED", "false");
    let config = load_config(file.path());
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.schedule.interval_hours, 6);
    assert_eq!(config.schedule.max_videos_per_day, 2);
    assert_eq!(
        config.schedule.peak_hours,
        vec![HourRange::new(8, 10), HourRange::new(17, 19)]
    );
    assert_eq!(config.schedule.quiet_hours, HourRange::new(22, 7));
    assert!(!config.schedule.weekend_enabled);
}

#[test]
#[serial]
fn malformed_env_override_is_fatal() {
    clear_env();
    let file = write_config("");
    std::env::set_var("SCHEDULE_INTERVAL_HOURS", "four");
    let result = load_config(file.path());
    clear_env();
    assert!(result.is_err());
}

#[test]
#[serial]
fn env_override_is_validated() {
    clear_env();
    let file = write_config("");
    std::env::set_var("SCHEDULE_QUIET_HOURS", "23-25");
    let result = load_config(file.path());
    clear_env();
    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("quiet hours"), "got: {err:#}");
}

#[test]
#[serial]
fn oversized_interval_override_is_fatal() {
    clear_env();
    let file = write_config("");
    std::env::set_var("SCHEDULE_INTERVAL_HOURS", u64::MAX.to_string());
    let result = load_config(file.path());
    clear_env();
    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("interval_hours"), "got: {err:#}");
}

// ---------------------------------------------------------------------------
// File handling
// ---------------------------------------------------------------------------

#[test]
#[serial]
fn explicit_path_is_used() {
    clear_env();
    let file = write_config(
        r#"
[schedule]
min_gap_minutes = 45
retry_failed_after_hours = 3

[pipeline]
source_selectors = ["aww"]
selection_strategy = "best_engagement"

[collaborators.fetch]
program = "/usr/local/bin/fetch-posts"
args = ["--json"]
"#,
    );
    let config = load_config_or_default(Some(file.path())).unwrap();
    assert_eq!(config.schedule.min_gap_minutes, 45);
    assert_eq!(config.schedule.retry_failed_after_hours, 3);
    assert_eq!(config.pipeline.source_selectors, ["aww"]);
    let fetch = config.collaborators.fetch.unwrap();
    assert_eq!(fetch.args, ["--json"]);
    assert!(config.collaborators.render.is_none());
}

#[test]
#[serial]
fn invalid_toml_is_an_error() {
    clear_env();
    let file = write_config("[schedule\ninterval_hours = ");
    assert!(load_config(file.path()).is_err());
}
