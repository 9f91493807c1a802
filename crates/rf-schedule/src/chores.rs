//! Wall-clock calendar for the scheduler's periodic maintenance.
//!
//! Two chores run alongside pipeline ticks: a daily cleanup at 03:00 and a
//! weekly report on Sunday at 09:00.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

const CLEANUP_HOUR: i64 = 3;
const REPORT_WEEKDAY: Weekday = Weekday::Sun;
const REPORT_HOUR: i64 = 9;

/// A periodic maintenance job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chore {
    DailyCleanup,
    WeeklyReport,
}

impl Chore {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chore::DailyCleanup => "daily cleanup",
            Chore::WeeklyReport => "weekly report",
        }
    }
}

impl fmt::Display for Chore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Next slot for each chore.
///
/// A slot fires once when it is first observed at or after its time, however
/// late, and then moves to the first occurrence after the observation. Missed
/// slots are never replayed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoreSchedule {
    next_cleanup: NaiveDateTime,
    next_report: NaiveDateTime,
}

impl ChoreSchedule {
    /// Slots strictly after `now`; nothing is due at startup.
    pub fn starting_at(now: NaiveDateTime) -> Self {
        Self {
            next_cleanup: next_daily(now),
            next_report: next_weekly(now),
        }
    }

    pub fn next_cleanup(&self) -> NaiveDateTime {
        self.next_cleanup
    }

    pub fn next_report(&self) -> NaiveDateTime {
        self.next_report
    }

    /// The earliest pending slot.
    pub fn next_due(&self) -> NaiveDateTime {
        self.next_cleanup.min(self.next_report)
    }

    /// Chores whose slot is at or before `now`, each advanced past `now`.
    pub fn take_due(&mut self, now: NaiveDateTime) -> Vec<Chore> {
        let mut due = Vec::new();
        if now >= self.next_cleanup {
            due.push(Chore::DailyCleanup);
            self.next_cleanup = next_daily(now);
        }
        if now >= self.next_report {
            due.push(Chore::WeeklyReport);
            self.next_report = next_weekly(now);
        }
        due
    }
}

fn at_hour(date: NaiveDate, hour: i64) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + Duration::hours(hour)
}

fn next_daily(after: NaiveDateTime) -> NaiveDateTime {
    let slot = at_hour(after.date(), CLEANUP_HOUR);
    if slot > after {
        slot
    } else {
        slot + Duration::days(1)
    }
}

fn next_weekly(after: NaiveDateTime) -> NaiveDateTime {
    let ahead = (REPORT_WEEKDAY.num_days_from_monday() + 7
        - after.weekday().num_days_from_monday())
        % 7;
    let slot = at_hour(after.date() + Duration::days(i64::from(ahead)), REPORT_HOUR);
    if slot > after {
        slot
    } else {
        slot + Duration::days(7)
    }
}
