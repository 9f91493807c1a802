//! Run statistics and the last-run record behind one handle.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use rf_core::config::StorageConfig;
use rf_core::{Result, RunOutcome};

use crate::file::JsonFile;
use crate::records::{LastRunRecord, RunStats};

/// Durable scheduler bookkeeping: aggregate [`RunStats`] plus the single
/// [`LastRunRecord`].
///
/// Each document is serialized independently; callers that must keep the
/// two in step (e.g. recording a run) write stats first, then the record.
#[derive(Debug)]
pub struct StatsStore {
    stats: JsonFile<RunStats>,
    last_run: JsonFile<LastRunRecord>,
}

impl StatsStore {
    pub fn new(stats_path: impl Into<PathBuf>, last_run_path: impl Into<PathBuf>) -> Self {
        Self {
            stats: JsonFile::new(stats_path),
            last_run: JsonFile::new(last_run_path),
        }
    }

    /// Store rooted at the configured data directory.
    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(storage.stats_path(), storage.last_run_path())
    }

    /// Store using the default file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        let storage = StorageConfig {
            data_dir: dir.to_path_buf(),
            ..Default::default()
        };
        Self::from_config(&storage)
    }

    pub fn stats_path(&self) -> &Path {
        self.stats.path()
    }

    pub fn last_run_path(&self) -> &Path {
        self.last_run.path()
    }

    /// Write a zeroed stats file if none exists yet.
    pub fn ensure_initialized(&self) -> Result<()> {
        if !self.stats.exists() {
            tracing::info!("Initializing stats file at {}", self.stats.path().display());
            self.stats.save(&RunStats::default())?;
        }
        Ok(())
    }

    /// Last known-good stats, or zeroed stats if absent or corrupt.
    pub fn load_stats(&self) -> RunStats {
        self.stats.load()
    }

    pub fn save_stats(&self, stats: &RunStats) -> Result<()> {
        self.stats.save(stats)
    }

    /// Serialized load-mutate-save of the stats document.
    pub fn update_stats<R>(&self, f: impl FnOnce(&mut RunStats) -> R) -> Result<R> {
        self.stats.update(f)
    }

    /// The most recent run, if one was recorded and is readable.
    pub fn last_run(&self) -> Option<LastRunRecord> {
        self.last_run.read()
    }

    /// Overwrite the last-run record.
    pub fn record_last_run(&self, record: &LastRunRecord) -> Result<()> {
        self.last_run.save(record)
    }

    /// Apply a finished run to both documents.
    pub fn record_outcome(&self, outcome: &RunOutcome, at: NaiveDateTime) -> Result<RunStats> {
        let stats = self.update_stats(|stats| {
            if outcome.is_success() {
                stats.record_success(outcome.rating, at);
            } else {
                stats.record_failure(at);
            }
            stats.clone()
        })?;
        self.record_last_run(&LastRunRecord::from_outcome(outcome, at))?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rf_core::RunStatus;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn ensure_initialized_writes_zeroed_stats_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatsStore::in_dir(dir.path());
        store.ensure_initialized().unwrap();
        assert!(store.stats_path().exists());

        store.update_stats(|s| s.total_runs = 5).unwrap();
        store.ensure_initialized().unwrap();
        assert_eq!(store.load_stats().total_runs, 5);
    }

    #[test]
    fn record_outcome_updates_both_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatsStore::in_dir(dir.path());
        let outcome = RunOutcome {
            status: RunStatus::Success,
            rating: 8.5,
            processing_time_secs: 42.0,
            video_path: Some(PathBuf::from("/videos/a.mp4")),
            ..Default::default()
        };

        let stats = store.record_outcome(&outcome, noon()).unwrap();
        assert_eq!(stats.successful_runs, 1);
        assert_eq!(store.load_stats(), stats);

        let last = store.last_run().unwrap();
        assert_eq!(last.timestamp, noon());
        assert_eq!(last.status, RunStatus::Success);
        assert_eq!(last.rating, 8.5);
    }

    #[test]
    fn corrupt_last_run_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatsStore::in_dir(dir.path());
        std::fs::write(store.last_run_path(), b"\x00\x01not json").unwrap();
        assert!(store.last_run().is_none());
    }
}
