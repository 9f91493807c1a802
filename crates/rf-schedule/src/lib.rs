//! # rf-schedule
//!
//! Decides whether a pipeline run may start and which configuration profile
//! it should use.
//!
//! - **[`AdmissionController`]** -- quiet hours, weekend gate, daily quota and
//!   minimum gap, evaluated in that order; records finished runs.
//! - **[`optimal_config`]** -- pure peak/off-peak profile selection.
//! - **[`ScheduleStatus`]** / **[`WeeklySummary`]** -- read-only reports.
//! - **[`ChoreSchedule`]** -- when the daily cleanup and weekly report fall due.

pub mod admission;
pub mod chores;
pub mod report;

pub use admission::{optimal_config, Admission, AdmissionController, DenyReason};
pub use chores::{Chore, ChoreSchedule};
pub use report::{ScheduleStatus, WeeklySummary};
