//! rf-core: shared types, errors, configuration, and the injectable clock.
//!
//! This crate is the foundational dependency for all other rf-* crates,
//! providing a unified error type, schedule and pipeline configuration,
//! hour-of-day window arithmetic, and the content records that flow between
//! the pipeline and its collaborators.

pub mod clock;
pub mod config;
pub mod content;
pub mod error;
pub mod hours;
pub mod outcome;

// Re-export the most commonly used items at the crate root.
pub use clock::{local_to_system, Clock, ManualClock, SystemClock};
pub use content::*;
pub use error::{Error, Result};
pub use hours::HourRange;
pub use outcome::{RunOutcome, RunStatus};
