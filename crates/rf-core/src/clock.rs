//! Wall-clock source injected into the engine and the admission controller.
//!
//! Admission windows are expressed in local hours, so the clock yields local
//! naive time. Stage durations do not use this clock; they are measured with
//! a monotonic instant inside the pipeline.

use std::time::SystemTime;

use chrono::{Duration, Local, NaiveDateTime, TimeZone};
use parking_lot::Mutex;

/// Source of the current local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    /// The same instant as filesystem time, for comparing against file
    /// modification times.
    fn system_time(&self) -> SystemTime {
        local_to_system(self.now())
    }
}

/// Interpret a local naive time as an absolute instant. Times skipped by a
/// DST transition fall back to the real current time.
pub fn local_to_system(local: NaiveDateTime) -> SystemTime {
    Local
        .from_local_datetime(&local)
        .earliest()
        .map(SystemTime::from)
        .unwrap_or_else(SystemTime::now)
}

/// The real local clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock that only moves when told to. Used for deterministic tests and
/// dry runs.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, to: NaiveDateTime) {
        *self.now.lock() = to;
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }
}
