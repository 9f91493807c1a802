//! The result of one pipeline run as reported to the scheduler.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Terminal status of a run as recorded in run history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    #[default]
    Failed,
    /// The engine itself errored before producing a final state.
    Crashed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
            RunStatus::Crashed => "crashed",
        })
    }
}

/// Summary of a finished run, independent of the pipeline's internal state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub error: Option<String>,
    pub video_path: Option<PathBuf>,
    /// Rating of the selected candidate; `0.0` when nothing was selected.
    pub rating: f64,
    /// Total elapsed pipeline time in seconds.
    pub processing_time_secs: f64,
    pub source: String,
    pub popularity_score: i64,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Outcome for a run whose engine call errored outright.
    pub fn crashed(error: impl fmt::Display) -> Self {
        Self {
            status: RunStatus::Crashed,
            error: Some(error.to_string()),
            ..Default::default()
        }
    }
}
