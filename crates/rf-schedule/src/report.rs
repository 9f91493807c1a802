//! Read-only views over the scheduler's durable state.

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::admission::AdmissionController;

/// Snapshot of run history plus the current admission decision.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleStatus {
    pub total_runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub videos_created: u64,
    pub average_rating: f64,
    pub success_rate: f64,
    pub videos_today: u32,
    pub max_videos_per_day: u32,
    pub last_success: Option<NaiveDateTime>,
    pub last_failure: Option<NaiveDateTime>,
    pub can_run_now: bool,
    pub reason: String,
    pub peak_time: bool,
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Videos created:  {}", self.videos_created)?;
        writeln!(f, "Successful runs: {}", self.successful_runs)?;
        writeln!(f, "Failed runs:     {}", self.failed_runs)?;
        writeln!(f, "Success rate:    {:.1}%", self.success_rate)?;
        writeln!(f, "Average rating:  {:.1}/10", self.average_rating)?;
        if let Some(ts) = self.last_success {
            writeln!(f, "Last success:    {}", ts.format("%Y-%m-%d %H:%M:%S"))?;
        }
        if let Some(ts) = self.last_failure {
            writeln!(f, "Last failure:    {}", ts.format("%Y-%m-%d %H:%M:%S"))?;
        }
        writeln!(
            f,
            "Today:           {}/{} videos",
            self.videos_today, self.max_videos_per_day
        )?;
        if self.can_run_now {
            write!(f, "Can run now:     yes")?;
        } else {
            write!(f, "Can run now:     no ({})", self.reason)?;
        }
        if self.peak_time {
            write!(f, " [peak]")?;
        }
        Ok(())
    }
}

/// Videos created in the trailing week, alongside all-time figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub week_videos: u64,
    pub success_rate: f64,
    pub average_rating: f64,
    pub total_videos: u64,
    pub total_runs: u64,
    pub last_success: Option<NaiveDateTime>,
}

impl fmt::Display for WeeklySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "This week:")?;
        writeln!(f, "  Videos created: {}", self.week_videos)?;
        writeln!(f, "  Success rate:   {:.1}%", self.success_rate)?;
        writeln!(f, "  Average rating: {:.1}/10", self.average_rating)?;
        writeln!(f, "All time:")?;
        writeln!(f, "  Total videos:   {}", self.total_videos)?;
        writeln!(f, "  Total runs:     {}", self.total_runs)?;
        match self.last_success {
            Some(ts) => write!(f, "  Last success:   {}", ts.format("%Y-%m-%d %H:%M:%S")),
            None => write!(f, "  Last success:   never"),
        }
    }
}

impl AdmissionController {
    pub fn status(&self, now: NaiveDateTime) -> ScheduleStatus {
        let stats = self.store().load_stats();
        let admission = self.can_run_now(now);
        ScheduleStatus {
            total_runs: stats.total_runs,
            successful_runs: stats.successful_runs,
            failed_runs: stats.failed_runs,
            videos_created: stats.videos_created,
            average_rating: stats.average_rating,
            success_rate: stats.success_rate(),
            videos_today: stats.daily_count(now.date()),
            max_videos_per_day: self.config().max_videos_per_day,
            last_success: stats.last_success,
            last_failure: stats.last_failure,
            can_run_now: admission.is_allowed(),
            reason: admission.reason(),
            peak_time: self.is_peak_time(now),
        }
    }

    pub fn weekly_summary(&self, now: NaiveDateTime) -> WeeklySummary {
        let stats = self.store().load_stats();
        let since = (now - Duration::days(7)).date();
        WeeklySummary {
            week_videos: stats.videos_since(since),
            success_rate: stats.success_rate(),
            average_rating: stats.average_rating,
            total_videos: stats.videos_created,
            total_runs: stats.total_runs,
            last_success: stats.last_success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rf_core::config::ScheduleConfig;
    use rf_core::{RunOutcome, RunStatus};
    use rf_store::StatsStore;
    use std::sync::Arc;

    fn day(d: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, d)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn status_reflects_history_and_admission() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(StatsStore::in_dir(dir.path()));
        let c = AdmissionController::new(ScheduleConfig::default(), store).unwrap();

        let ok = RunOutcome {
            status: RunStatus::Success,
            rating: 9.0,
            ..Default::default()
        };
        c.record_run(&ok, day(1, 10)).unwrap();

        let status = c.status(day(1, 10));
        assert_eq!(status.videos_created, 1);
        assert_eq!(status.videos_today, 1);
        assert!(!status.can_run_now);
        assert!(status.reason.starts_with("Too soon"));
        assert!(status.to_string().contains("1/6 videos"));
    }

    #[test]
    fn weekly_summary_counts_trailing_week() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(StatsStore::in_dir(dir.path()));
        let c = AdmissionController::new(ScheduleConfig::default(), store).unwrap();
        let ok = RunOutcome {
            status: RunStatus::Success,
            rating: 8.0,
            ..Default::default()
        };
        c.record_run(&ok, day(1, 10)).unwrap();
        c.record_run(&ok, day(9, 10)).unwrap();
        c.record_run(&ok, day(10, 10)).unwrap();

        let summary = c.weekly_summary(day(12, 9));
        assert_eq!(summary.week_videos, 2);
        assert_eq!(summary.total_videos, 3);
        assert_eq!(summary.last_success, Some(day(10, 10)));
    }
}
