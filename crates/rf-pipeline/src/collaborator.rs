//! External capabilities consumed by the pipeline.
//!
//! Each trait is one narrow contract. Implementations report failures as
//! [`rf_core::Error`]; the engine wraps every call in a timeout and turns any
//! error into a stage failure.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use rf_core::{
    AudioRef, CandidateItem, Metadata, RatedCandidate, RenderStyle, Result, ScriptStyle,
    SynthService, TimeFilter, VideoRef,
};

use crate::state::StageTimings;

/// Obtains candidate items from the configured sources.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_candidates(
        &self,
        source_selectors: &[String],
        limit: u32,
        time_filter: TimeFilter,
    ) -> Result<Vec<CandidateItem>>;
}

/// Scores candidates and drops those under `min_rating`.
///
/// Ratings are expected in `[1, 10]`.
#[async_trait]
pub trait Assessor: Send + Sync {
    async fn score_and_filter(
        &self,
        candidates: &[CandidateItem],
        min_rating: f64,
    ) -> Result<Vec<RatedCandidate>>;
}

/// Produces narration text for a candidate.
#[async_trait]
pub trait ScriptWriter: Send + Sync {
    async fn write_script(&self, candidate: &RatedCandidate, style: ScriptStyle) -> Result<String>;
}

/// What to synthesize.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_profile: String,
    /// File stem for the produced audio, without extension.
    pub output_stem: String,
}

/// Converts a script to audio on the requested service.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest, service: SynthService)
        -> Result<AudioRef>;
}

/// Produces a video from a candidate and its narration.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(
        &self,
        candidate: &RatedCandidate,
        audio: &AudioRef,
        style: RenderStyle,
    ) -> Result<VideoRef>;
}

/// Persists the finished artifact and returns its metadata.
#[async_trait]
pub trait Organizer: Send + Sync {
    async fn persist(
        &self,
        candidate: &RatedCandidate,
        video: &VideoRef,
        audio: &AudioRef,
        timings: &StageTimings,
    ) -> Result<Metadata>;
}

/// Handles to every collaborator the engine calls.
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn Fetcher>,
    pub assessor: Arc<dyn Assessor>,
    pub writer: Arc<dyn ScriptWriter>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub renderer: Arc<dyn Renderer>,
    pub organizer: Arc<dyn Organizer>,
}

impl Collaborators {
    /// Use one value for every contract.
    pub fn from_shared<T>(shared: Arc<T>) -> Self
    where
        T: Fetcher + Assessor + ScriptWriter + Synthesizer + Renderer + Organizer + 'static,
    {
        Self {
            fetcher: shared.clone(),
            assessor: shared.clone(),
            writer: shared.clone(),
            synthesizer: shared.clone(),
            renderer: shared.clone(),
            organizer: shared,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
