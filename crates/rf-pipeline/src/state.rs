//! Per-run pipeline state.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use rf_core::{
    AudioRef, CandidateItem, Error, Metadata, RatedCandidate, Result, RunOutcome, RunStatus,
    VideoRef,
};

/// One step of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Fetch,
    Assess,
    Select,
    Script,
    Synthesize,
    Render,
    Organize,
}

impl Stage {
    /// Every stage in the order the engine runs them.
    pub const ALL: [Stage; 7] = [
        Stage::Fetch,
        Stage::Assess,
        Stage::Select,
        Stage::Script,
        Stage::Synthesize,
        Stage::Render,
        Stage::Organize,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Assess => "assess",
            Stage::Select => "select",
            Stage::Script => "script",
            Stage::Synthesize => "synthesize",
            Stage::Render => "render",
            Stage::Organize => "organize",
        }
    }

    /// The status a run reports while this stage executes.
    pub fn status(self) -> PipelineStatus {
        match self {
            Stage::Fetch => PipelineStatus::Fetching,
            Stage::Assess => PipelineStatus::Assessing,
            Stage::Select => PipelineStatus::Selecting,
            Stage::Script => PipelineStatus::Scripting,
            Stage::Synthesize => PipelineStatus::Synthesizing,
            Stage::Render => PipelineStatus::Rendering,
            Stage::Organize => PipelineStatus::Organizing,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    #[default]
    Pending,
    Fetching,
    Assessing,
    Selecting,
    Scripting,
    Synthesizing,
    Rendering,
    Organizing,
    Success,
    Failed,
}

impl PipelineStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStatus::Success | PipelineStatus::Failed)
    }
}

/// Wall time spent in each completed or failed stage.
pub type StageTimings = BTreeMap<Stage, Duration>;

/// Everything a run has produced so far.
///
/// Fields are filled in stage order; a failed run keeps whatever the
/// earlier stages produced, but nothing is persisted for it.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineState {
    pub run_id: Uuid,
    pub started_at: NaiveDateTime,
    pub status: PipelineStatus,
    pub candidates: Vec<CandidateItem>,
    pub rated: Vec<RatedCandidate>,
    pub selected: Option<RatedCandidate>,
    pub script: Option<String>,
    pub audio: Option<AudioRef>,
    pub video: Option<VideoRef>,
    pub metadata: Option<Metadata>,
    pub error: Option<String>,
    pub failed_stage: Option<Stage>,
    pub timings: StageTimings,
    /// Set by the organize stage.
    pub total_time: Option<Duration>,
}

impl PipelineState {
    pub fn new(started_at: NaiveDateTime) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            status: PipelineStatus::Pending,
            candidates: Vec::new(),
            rated: Vec::new(),
            selected: None,
            script: None,
            audio: None,
            video: None,
            metadata: None,
            error: None,
            failed_stage: None,
            timings: StageTimings::new(),
            total_time: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PipelineStatus::Success
    }

    /// Mark the run failed at `stage`.
    pub(crate) fn fail(&mut self, stage: Stage, detail: impl Into<String>) {
        self.status = PipelineStatus::Failed;
        self.failed_stage = Some(stage);
        self.error = Some(Error::stage(stage.as_str(), detail).to_string());
    }

    pub(crate) fn require_selected(&self) -> Result<&RatedCandidate> {
        self.selected.as_ref().ok_or_else(|| missing("selected candidate"))
    }

    pub(crate) fn require_script(&self) -> Result<&str> {
        self.script.as_deref().ok_or_else(|| missing("script"))
    }

    pub(crate) fn require_audio(&self) -> Result<&AudioRef> {
        self.audio.as_ref().ok_or_else(|| missing("audio"))
    }

    pub(crate) fn require_video(&self) -> Result<&VideoRef> {
        self.video.as_ref().ok_or_else(|| missing("video"))
    }

    /// Condense the run into what the scheduler records.
    pub fn outcome(&self) -> RunOutcome {
        let selected = self.selected.as_ref();
        RunOutcome {
            status: if self.is_success() {
                RunStatus::Success
            } else {
                RunStatus::Failed
            },
            error: self.error.clone(),
            video_path: self
                .metadata
                .as_ref()
                .map(|m| m.video_path.clone())
                .or_else(|| self.video.as_ref().map(|v| v.path.clone())),
            rating: selected.map(|c| c.rating).unwrap_or(0.0),
            processing_time_secs: self.total_time.map(|d| d.as_secs_f64()).unwrap_or(0.0),
            source: selected.map(|c| c.item.source.clone()).unwrap_or_default(),
            popularity_score: selected.map(|c| c.item.popularity_score).unwrap_or(0),
        }
    }
}

fn missing(what: &str) -> Error {
    Error::Internal(format!("{what} not available at this stage"))
}
