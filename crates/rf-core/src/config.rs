//! Application configuration types.
//!
//! The top-level [`Config`] carries the schedule, the base pipeline profile,
//! storage locations, and external collaborator commands. Every section
//! defaults sensibly so an empty file is valid. The schedule section is
//! immutable for the lifetime of the process once validated.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::content::{RenderStyle, ScriptStyle, SelectionStrategy, TimeFilter};
use crate::error::{Error, Result};
use crate::hours::HourRange;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schedule: ScheduleConfig,
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
    pub collaborators: CollaboratorsConfig,
}

impl Config {
    /// Return a list of validation warnings (non-fatal issues).
    ///
    /// Fatal schedule problems are reported by [`ScheduleConfig::validate`].
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !(self.pipeline.min_rating > 0.0 && self.pipeline.min_rating <= 10.0) {
            warnings.push(format!(
                "pipeline.min_rating {} is outside (0, 10]",
                self.pipeline.min_rating
            ));
        }
        if self.pipeline.fetch_limit == 0 {
            warnings.push("pipeline.fetch_limit is 0; nothing will be fetched".into());
        }
        if self.pipeline.source_selectors.is_empty() {
            warnings.push("pipeline.source_selectors is empty".into());
        }
        if self.pipeline.collaborator_timeout_secs == 0 {
            warnings.push("pipeline.collaborator_timeout_secs is 0; every call will time out".into());
        }

        for (name, cmd) in self.collaborators.entries() {
            if cmd.is_none() {
                warnings.push(format!("collaborators.{name} has no command configured"));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Longest accepted tick interval (one week).
pub const MAX_INTERVAL_HOURS: u64 = 24 * 7;
/// Longest accepted minimum gap between runs (one week).
pub const MAX_MIN_GAP_MINUTES: i64 = 60 * 24 * 7;

/// When runs are allowed to start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_hours: u64,
    pub max_videos_per_day: u32,
    /// Read and validated but never consulted by admission.
    pub retry_failed_after_hours: u64,
    pub min_gap_minutes: i64,
    /// Non-wrapping `[start, end)` ranges.
    pub peak_hours: Vec<HourRange>,
    /// May wrap past midnight.
    pub quiet_hours: HourRange,
    pub weekend_enabled: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_hours: 4,
            max_videos_per_day: 6,
            retry_failed_after_hours: 2,
            min_gap_minutes: 30,
            peak_hours: vec![HourRange::new(12, 14), HourRange::new(19, 21)],
            quiet_hours: HourRange::new(23, 6),
            weekend_enabled: true,
        }
    }
}

impl ScheduleConfig {
    /// Reject malformed ranges and degenerate limits.
    pub fn validate(&self) -> Result<()> {
        if self.interval_hours == 0 {
            return Err(Error::Config("schedule.interval_hours must be at least 1".into()));
        }
        if self.interval_hours > MAX_INTERVAL_HOURS {
            return Err(Error::Config(format!(
                "schedule.interval_hours {} exceeds {MAX_INTERVAL_HOURS}",
                self.interval_hours
            )));
        }
        if self.max_videos_per_day == 0 {
            return Err(Error::Config(
                "schedule.max_videos_per_day must be at least 1".into(),
            ));
        }
        if self.min_gap_minutes < 0 {
            return Err(Error::Config("schedule.min_gap_minutes cannot be negative".into()));
        }
        if self.min_gap_minutes > MAX_MIN_GAP_MINUTES {
            return Err(Error::Config(format!(
                "schedule.min_gap_minutes {} exceeds {MAX_MIN_GAP_MINUTES}",
                self.min_gap_minutes
            )));
        }
        self.quiet_hours.validate_quiet()?;
        for range in &self.peak_hours {
            range.validate_peak()?;
        }
        Ok(())
    }

    /// Apply `SCHEDULE_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `SCHEDULE_*` overrides from an arbitrary lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        fn number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T>
        where
            T::Err: std::fmt::Display,
        {
            raw.trim()
                .parse()
                .map_err(|e| Error::Config(format!("{key}='{raw}': {e}")))
        }

        if let Some(v) = lookup("SCHEDULE_INTERVAL_HOURS") {
            self.interval_hours = number("SCHEDULE_INTERVAL_HOURS", &v)?;
        }
        if let Some(v) = lookup("SCHEDULE_MAX_VIDEOS_PER_DAY") {
            self.max_videos_per_day = number("SCHEDULE_MAX_VIDEOS_PER_DAY", &v)?;
        }
        if let Some(v) = lookup("SCHEDULE_RETRY_HOURS") {
            self.retry_failed_after_hours = number("SCHEDULE_RETRY_HOURS", &v)?;
        }
        if let Some(v) = lookup("SCHEDULE_MIN_GAP_MINUTES") {
            self.min_gap_minutes = number("SCHEDULE_MIN_GAP_MINUTES", &v)?;
        }
        if let Some(v) = lookup("SCHEDULE_PEAK_HOURS") {
            self.peak_hours = HourRange::parse_list(&v)?;
        }
        if let Some(v) = lookup("SCHEDULE_QUIET_HOURS") {
            self.quiet_hours = v.parse()?;
        }
        if let Some(v) = lookup("SCHEDULE_WEEKEND_ENABLED") {
            self.weekend_enabled = v.trim().eq_ignore_ascii_case("true");
        }

        tracing::debug!(schedule = ?self, "Applied schedule overrides");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pipeline profile
// ---------------------------------------------------------------------------

/// Base configuration profile for a single pipeline run.
///
/// During peak hours the scheduler derives a stricter profile from this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source_selectors: Vec<String>,
    pub fetch_limit: u32,
    pub time_filter: TimeFilter,
    pub min_rating: f64,
    pub selection_strategy: SelectionStrategy,
    pub script_style: ScriptStyle,
    /// Derived from the selected candidate when unset.
    pub voice_profile: Option<String>,
    pub render_style: RenderStyle,
    pub batch_delay_secs: u64,
    pub collaborator_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_selectors: ["funny", "tifu", "confession", "wholesome"]
                .into_iter()
                .map(String::from)
                .collect(),
            fetch_limit: 20,
            time_filter: TimeFilter::Day,
            min_rating: 7.0,
            selection_strategy: SelectionStrategy::HighestRated,
            script_style: ScriptStyle::Engaging,
            voice_profile: None,
            render_style: RenderStyle::Modern,
            batch_delay_secs: 5,
            collaborator_timeout_secs: 300,
        }
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Where durable run statistics and artifacts live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub stats_file: String,
    pub last_run_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./output_videos"),
            stats_file: "scheduler_stats.json".into(),
            last_run_file: "last_run.json".into(),
        }
    }
}

impl StorageConfig {
    pub fn stats_path(&self) -> PathBuf {
        self.data_dir.join(&self.stats_file)
    }

    pub fn last_run_path(&self) -> PathBuf {
        self.data_dir.join(&self.last_run_file)
    }

    /// Intermediate artifacts; swept by the daily cleanup.
    pub fn temp_dir(&self) -> PathBuf {
        self.data_dir.join("temp")
    }

    /// Collaborator logs; oversized files are archived by the daily cleanup.
    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// Weekly reports.
    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join("reports")
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// An external program implementing one collaborator contract.
///
/// The program receives a JSON request on stdin and must print a JSON
/// response on stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

/// External commands for each collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollaboratorsConfig {
    pub fetch: Option<CommandConfig>,
    pub assess: Option<CommandConfig>,
    pub script: Option<CommandConfig>,
    pub synthesize: Option<CommandConfig>,
    pub render: Option<CommandConfig>,
    pub persist: Option<CommandConfig>,
}

impl CollaboratorsConfig {
    /// All entries paired with their config key.
    pub fn entries(&self) -> [(&'static str, Option<&CommandConfig>); 6] {
        [
            ("fetch", self.fetch.as_ref()),
            ("assess", self.assess.as_ref()),
            ("script", self.script.as_ref()),
            ("synthesize", self.synthesize.as_ref()),
            ("render", self.render.as_ref()),
            ("persist", self.persist.as_ref()),
        ]
    }
}
