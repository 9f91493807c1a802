//! Admission control for pipeline runs.

use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDateTime, Timelike, Weekday};

use rf_core::config::{PipelineConfig, ScheduleConfig};
use rf_core::{HourRange, RenderStyle, Result, RunOutcome};
use rf_store::{RunStats, StatsStore};

/// Minimum rating floor applied during peak hours.
const PEAK_MIN_RATING: f64 = 7.5;
/// Fetch limit cap applied during peak hours.
const PEAK_FETCH_LIMIT: u32 = 15;

/// Why a run was not admitted.
#[derive(Debug, Clone, PartialEq)]
pub enum DenyReason {
    QuietHours(HourRange),
    WeekendDisabled,
    DailyLimit { count: u32, max: u32 },
    TooSoon { gap_minutes: f64, min_gap_minutes: i64 },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::QuietHours(range) => {
                write!(f, "Quiet hours ({}:00-{}:00)", range.start, range.end)
            }
            DenyReason::WeekendDisabled => f.write_str("Weekend creation disabled"),
            DenyReason::DailyLimit { count, max } => {
                write!(f, "Daily limit reached ({count}/{max})")
            }
            DenyReason::TooSoon {
                gap_minutes,
                min_gap_minutes,
            } => write!(
                f,
                "Too soon since last run ({gap_minutes:.1} < {min_gap_minutes} min)"
            ),
        }
    }
}

/// Admission decision. A denial is a decision, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Granted,
    Denied(DenyReason),
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Granted)
    }

    /// Human-readable reason for the decision.
    pub fn reason(&self) -> String {
        match self {
            Admission::Granted => "All checks passed".into(),
            Admission::Denied(reason) => reason.to_string(),
        }
    }
}

/// Gates pipeline runs against the schedule and durable run history.
#[derive(Debug)]
pub struct AdmissionController {
    config: ScheduleConfig,
    store: Arc<StatsStore>,
}

impl AdmissionController {
    /// Build a controller. Malformed schedules are rejected here, before any
    /// driver loop starts.
    pub fn new(config: ScheduleConfig, store: Arc<StatsStore>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<StatsStore> {
        &self.store
    }

    /// Decide whether a run may start at `now`.
    ///
    /// Checks run in a fixed order and stop at the first denial: quiet hours,
    /// weekend gate, daily quota, minimum gap.
    pub fn can_run_now(&self, now: NaiveDateTime) -> Admission {
        let quiet = self.config.quiet_hours;
        if quiet.contains_wrapping(now.hour()) {
            return Admission::Denied(DenyReason::QuietHours(quiet));
        }

        if !self.config.weekend_enabled && is_weekend(now) {
            return Admission::Denied(DenyReason::WeekendDisabled);
        }

        let count = self.store.load_stats().daily_count(now.date());
        if count >= self.config.max_videos_per_day {
            return Admission::Denied(DenyReason::DailyLimit {
                count,
                max: self.config.max_videos_per_day,
            });
        }

        if let Some(last) = self.store.last_run() {
            let gap = now - last.timestamp;
            if gap < Duration::minutes(self.config.min_gap_minutes) {
                return Admission::Denied(DenyReason::TooSoon {
                    gap_minutes: gap.num_seconds() as f64 / 60.0,
                    min_gap_minutes: self.config.min_gap_minutes,
                });
            }
        }

        Admission::Granted
    }

    /// Whether `now` falls inside any configured peak range.
    pub fn is_peak_time(&self, now: NaiveDateTime) -> bool {
        is_peak_hour(&self.config, now.hour())
    }

    /// Profile for a run starting at `now`; see [`optimal_config`].
    pub fn optimal_config(&self, base: &PipelineConfig, now: NaiveDateTime) -> PipelineConfig {
        optimal_config(&self.config, base, now)
    }

    /// Apply a finished run to the stats and overwrite the last-run record.
    pub fn record_run(&self, outcome: &RunOutcome, now: NaiveDateTime) -> Result<RunStats> {
        let stats = self.store.record_outcome(outcome, now)?;
        tracing::info!(
            status = %outcome.status,
            total_runs = stats.total_runs,
            videos_today = stats.daily_count(now.date()),
            "Recorded run"
        );
        Ok(stats)
    }
}

fn is_weekend(now: NaiveDateTime) -> bool {
    matches!(now.weekday(), Weekday::Sat | Weekday::Sun)
}

fn is_peak_hour(config: &ScheduleConfig, hour: u32) -> bool {
    config.peak_hours.iter().any(|range| range.contains(hour))
}

/// Pure profile selection.
///
/// During peak hours the rating floor rises to at least 7.5, the fetch limit
/// is capped at 15, and the higher-effort `dynamic` render style is used.
/// Off-peak the base profile is returned unchanged.
pub fn optimal_config(
    schedule: &ScheduleConfig,
    base: &PipelineConfig,
    now: NaiveDateTime,
) -> PipelineConfig {
    if !is_peak_hour(schedule, now.hour()) {
        return base.clone();
    }

    PipelineConfig {
        min_rating: base.min_rating.max(PEAK_MIN_RATING),
        fetch_limit: base.fetch_limit.min(PEAK_FETCH_LIMIT),
        render_style: RenderStyle::Dynamic,
        ..base.clone()
    }
}
