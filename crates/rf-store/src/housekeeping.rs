//! Disk hygiene for the data directory.
//!
//! The daily cleanup deletes stale intermediate artifacts from `temp/` and
//! rotates oversized `*.log` files in `logs/` into `logs/archive/`. Weekly
//! reports land in `reports/`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

use rf_core::config::StorageConfig;
use rf_core::Result;

use crate::file::JsonFile;

/// Temp files older than this are deleted.
pub const TEMP_MAX_AGE: Duration = Duration::from_secs(24 * 3600);
/// Log files larger than this are archived.
pub const LOG_ARCHIVE_BYTES: u64 = 10 * 1024 * 1024;

/// What one cleanup pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub archived: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Housekeeper {
    temp_dir: PathBuf,
    logs_dir: PathBuf,
    reports_dir: PathBuf,
    max_temp_age: Duration,
    log_archive_bytes: u64,
}

impl Housekeeper {
    pub fn new(storage: &StorageConfig) -> Self {
        Self {
            temp_dir: storage.temp_dir(),
            logs_dir: storage.logs_dir(),
            reports_dir: storage.reports_dir(),
            max_temp_age: TEMP_MAX_AGE,
            log_archive_bytes: LOG_ARCHIVE_BYTES,
        }
    }

    /// Housekeeper using the default layout inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(&StorageConfig {
            data_dir: dir.to_path_buf(),
            ..Default::default()
        })
    }

    pub fn with_log_archive_bytes(mut self, bytes: u64) -> Self {
        self.log_archive_bytes = bytes;
        self
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Run one cleanup pass.
    ///
    /// `now` is the age reference for temp files; `today` stamps archived
    /// logs. Missing directories are skipped. A file that cannot be removed
    /// or rotated is logged and left in place.
    pub fn cleanup(&self, now: SystemTime, today: NaiveDate) -> Result<CleanupReport> {
        let mut report = CleanupReport::default();
        self.remove_stale(now, &mut report)?;
        self.archive_logs(today, &mut report)?;
        tracing::info!(
            removed = report.removed.len(),
            archived = report.archived.len(),
            "Daily cleanup completed"
        );
        Ok(report)
    }

    /// Persist a report as `reports/weekly_<date>.json`.
    pub fn write_report<T>(&self, date: NaiveDate, report: &T) -> Result<PathBuf>
    where
        T: Serialize + DeserializeOwned,
    {
        let path = self
            .reports_dir
            .join(format!("weekly_{}.json", date.format("%Y-%m-%d")));
        JsonFile::new(&path).save(report)?;
        Ok(path)
    }

    fn remove_stale(&self, now: SystemTime, report: &mut CleanupReport) -> Result<()> {
        for path in files_in(&self.temp_dir)? {
            let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!("Cannot stat {}: {e}", path.display());
                    continue;
                }
            };
            let stale = now
                .duration_since(modified)
                .map(|age| age > self.max_temp_age)
                .unwrap_or(false);
            if !stale {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::info!("Removed stale temp file {}", path.display());
                    report.removed.push(path);
                }
                Err(e) => tracing::warn!("Failed to remove {}: {e}", path.display()),
            }
        }
        Ok(())
    }

    fn archive_logs(&self, today: NaiveDate, report: &mut CleanupReport) -> Result<()> {
        let archive_dir = self.logs_dir.join("archive");
        for path in files_in(&self.logs_dir)? {
            if path.extension().and_then(|e| e.to_str()) != Some("log") {
                continue;
            }
            let len = match fs::metadata(&path) {
                Ok(m) => m.len(),
                Err(e) => {
                    tracing::warn!("Cannot stat {}: {e}", path.display());
                    continue;
                }
            };
            if len <= self.log_archive_bytes {
                continue;
            }

            match rotate(&path, &archive_dir, today) {
                Ok(archived) => {
                    tracing::info!(
                        "Archived {} ({len} bytes) to {}",
                        path.display(),
                        archived.display()
                    );
                    report.archived.push(archived);
                }
                Err(e) => tracing::warn!("Failed to archive {}: {e}", path.display()),
            }
        }
        Ok(())
    }
}

/// Regular files directly inside `dir`; empty if `dir` does not exist.
fn files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Move `path` to `archive_dir/<stem>.<YYYYmmdd>[-n].log` and leave an empty
/// log in its place.
fn rotate(path: &Path, archive_dir: &Path, today: NaiveDate) -> io::Result<PathBuf> {
    fs::create_dir_all(archive_dir)?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stamp = today.format("%Y%m%d");
    let mut target = archive_dir.join(format!("{stem}.{stamp}.log"));
    let mut n = 1;
    while target.exists() {
        target = archive_dir.join(format!("{stem}.{stamp}-{n}.log"));
        n += 1;
    }

    fs::rename(path, &target)?;
    fs::File::create(path)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn may1() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn touch(path: &Path, len: u64) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::File::create(path).unwrap().set_len(len).unwrap();
    }

    #[test]
    fn missing_directories_are_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let keeper = Housekeeper::in_dir(dir.path());
        let report = keeper.cleanup(SystemTime::now(), may1()).unwrap();
        assert_eq!(report, CleanupReport::default());
    }

    #[test]
    fn removes_only_temp_files_past_max_age() {
        let dir = tempfile::tempdir().unwrap();
        let keeper = Housekeeper::in_dir(dir.path());
        let audio = keeper.temp_dir().join("tts_audio_1.mp3");
        touch(&audio, 16);

        let report = keeper
            .cleanup(SystemTime::now() + Duration::from_secs(3600), may1())
            .unwrap();
        assert!(report.removed.is_empty());
        assert!(audio.exists());

        let report = keeper
            .cleanup(SystemTime::now() + TEMP_MAX_AGE * 2, may1())
            .unwrap();
        assert_eq!(report.removed, [audio.clone()]);
        assert!(!audio.exists());
    }

    #[test]
    fn temp_subdirectories_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let keeper = Housekeeper::in_dir(dir.path());
        let nested = keeper.temp_dir().join("render-scratch");
        fs::create_dir_all(&nested).unwrap();

        keeper
            .cleanup(SystemTime::now() + TEMP_MAX_AGE * 2, may1())
            .unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn oversized_logs_are_rotated() {
        let dir = tempfile::tempdir().unwrap();
        let keeper = Housekeeper::in_dir(dir.path()).with_log_archive_bytes(100);
        let big = keeper.logs_dir().join("render.log");
        let small = keeper.logs_dir().join("fetch.log");
        let other = keeper.logs_dir().join("render.txt");
        touch(&big, 101);
        touch(&small, 100);
        touch(&other, 500);

        let report = keeper.cleanup(SystemTime::now(), may1()).unwrap();

        let archived = keeper.logs_dir().join("archive/render.20240501.log");
        assert_eq!(report.archived, [archived.clone()]);
        assert_eq!(fs::metadata(&archived).unwrap().len(), 101);
        assert_eq!(fs::metadata(&big).unwrap().len(), 0);
        assert_eq!(fs::metadata(&small).unwrap().len(), 100);
        assert_eq!(fs::metadata(&other).unwrap().len(), 500);
    }

    #[test]
    fn same_day_rotation_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let keeper = Housekeeper::in_dir(dir.path()).with_log_archive_bytes(10);
        let log = keeper.logs_dir().join("app.log");

        touch(&log, 11);
        keeper.cleanup(SystemTime::now(), may1()).unwrap();
        touch(&log, 12);
        let report = keeper.cleanup(SystemTime::now(), may1()).unwrap();

        let archive = keeper.logs_dir().join("archive");
        assert_eq!(report.archived, [archive.join("app.20240501-1.log")]);
        assert_eq!(fs::metadata(archive.join("app.20240501.log")).unwrap().len(), 11);
    }

    #[test]
    fn report_is_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let keeper = Housekeeper::in_dir(dir.path());
        let path = keeper.write_report(may1(), &vec![1u32, 2, 3]).unwrap();

        assert_eq!(path, keeper.reports_dir().join("weekly_2024-05-01.json"));
        let back: Vec<u32> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, [1, 2, 3]);
    }
}
