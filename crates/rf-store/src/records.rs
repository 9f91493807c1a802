//! Persisted scheduler records.
//!
//! Both records are forward compatible: unknown fields are ignored and
//! missing fields fall back to zero or empty values.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use rf_core::{RunOutcome, RunStatus};

/// Key format for [`RunStats::daily_video_count`].
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Aggregate counters across all recorded runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunStats {
    pub total_runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub videos_created: u64,
    /// Mean rating of every successful run, maintained incrementally.
    pub average_rating: f64,
    /// `YYYY-MM-DD` -> videos created that day.
    pub daily_video_count: BTreeMap<String, u32>,
    pub last_success: Option<NaiveDateTime>,
    pub last_failure: Option<NaiveDateTime>,
}

impl RunStats {
    /// Videos created on `date`; 0 when the day has no entry.
    pub fn daily_count(&self, date: NaiveDate) -> u32 {
        self.daily_video_count
            .get(&date_key(date))
            .copied()
            .unwrap_or(0)
    }

    /// Count a successful run that produced one video with `rating`.
    pub fn record_success(&mut self, rating: f64, at: NaiveDateTime) {
        self.total_runs += 1;
        self.successful_runs += 1;
        self.videos_created += 1;
        self.last_success = Some(at);
        *self
            .daily_video_count
            .entry(date_key(at.date()))
            .or_insert(0) += 1;

        let n = self.videos_created as f64;
        self.average_rating = if self.videos_created <= 1 {
            rating
        } else {
            (self.average_rating * (n - 1.0) + rating) / n
        };
    }

    /// Count a failed or crashed run.
    pub fn record_failure(&mut self, at: NaiveDateTime) {
        self.total_runs += 1;
        self.failed_runs += 1;
        self.last_failure = Some(at);
    }

    /// Successful runs as a percentage of all runs.
    pub fn success_rate(&self) -> f64 {
        if self.total_runs == 0 {
            return 0.0;
        }
        self.successful_runs as f64 / self.total_runs as f64 * 100.0
    }

    /// Videos created on or after `since`. Unparseable date keys are skipped.
    pub fn videos_since(&self, since: NaiveDate) -> u64 {
        self.daily_video_count
            .iter()
            .filter_map(|(day, count)| {
                let day = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;
                (day >= since).then_some(u64::from(*count))
            })
            .sum()
    }
}

/// The most recent run. Used for minimum-gap enforcement and crash recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastRunRecord {
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub status: RunStatus,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub video_path: Option<PathBuf>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub processing_time_secs: f64,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub popularity_score: i64,
}

impl LastRunRecord {
    pub fn from_outcome(outcome: &RunOutcome, at: NaiveDateTime) -> Self {
        Self {
            timestamp: at,
            status: outcome.status,
            error: outcome.error.clone(),
            video_path: outcome.video_path.clone(),
            rating: outcome.rating,
            processing_time_secs: outcome.processing_time_secs,
            source: outcome.source.clone(),
            popularity_score: outcome.popularity_score,
        }
    }
}
