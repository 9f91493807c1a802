//! Hour-of-day windows.
//!
//! An [`HourRange`] is written `start-end` (e.g. `23-6`) and covers the
//! half-open interval `[start, end)` of local hours. Quiet hours may wrap past
//! midnight; peak hours may not, and [`HourRange::contains`] only honours the
//! non-wrapping form. Use [`HourRange::contains_wrapping`] for quiet windows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A half-open `[start, end)` range of hours in a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HourRange {
    pub start: u32,
    pub end: u32,
}

impl HourRange {
    /// Build a range without validating it.
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Whether `start > end`, i.e. the window spans midnight.
    pub fn wraps(&self) -> bool {
        self.start > self.end
    }

    /// Non-wrapping membership: `start <= hour < end`.
    pub fn contains(&self, hour: u32) -> bool {
        self.start <= hour && hour < self.end
    }

    /// Membership that treats `start > end` as a window spanning midnight.
    pub fn contains_wrapping(&self, hour: u32) -> bool {
        if self.wraps() {
            hour >= self.start || hour < self.end
        } else {
            self.contains(hour)
        }
    }

    /// Validate as a quiet window: both bounds must be hours of the day.
    pub fn validate_quiet(&self) -> Result<()> {
        if self.start >= 24 || self.end >= 24 {
            return Err(Error::Config(format!(
                "quiet hours {self} must use hours in 0..24"
            )));
        }
        Ok(())
    }

    /// Validate as a peak window: non-wrapping with `start < end <= 24`.
    pub fn validate_peak(&self) -> Result<()> {
        if self.start >= self.end {
            return Err(Error::Config(format!(
                "peak hours {self} must satisfy start < end"
            )));
        }
        if self.end > 24 {
            return Err(Error::Config(format!(
                "peak hours {self} must end at or before 24"
            )));
        }
        Ok(())
    }

    /// Parse a comma separated list such as `12-14,19-21`.
    pub fn parse_list(s: &str) -> Result<Vec<HourRange>> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for HourRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for HourRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| Error::Config(format!("hour range '{s}' must look like 'start-end'")))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|e| Error::Config(format!("hour range '{s}': {e}")))
        };
        Ok(Self::new(parse(start)?, parse(end)?))
    }
}

impl TryFrom<String> for HourRange {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<HourRange> for String {
    fn from(range: HourRange) -> Self {
        range.to_string()
    }
}
