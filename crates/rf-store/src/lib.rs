//! # rf-store
//!
//! Durable run bookkeeping for the scheduler.
//!
//! - **[`JsonFile`]** -- one JSON document on disk with atomic replace,
//!   serialized read-modify-write, and silent self-healing of corrupt files.
//! - **[`RunStats`]** / **[`LastRunRecord`]** -- the persisted aggregate
//!   counters and the most recent run.
//! - **[`StatsStore`]** -- both documents behind one handle.
//! - **[`Housekeeper`]** -- stale temp cleanup, log rotation, weekly reports.

pub mod file;
pub mod housekeeping;
pub mod records;
pub mod store;

pub use file::JsonFile;
pub use housekeeping::{CleanupReport, Housekeeper};
pub use records::{date_key, LastRunRecord, RunStats};
pub use store::StatsStore;
