//! # rf-pipeline
//!
//! The content-to-video state machine.
//!
//! This crate provides:
//!
//! - **Collaborator traits** ([`collaborator`]) -- narrow async seams for
//!   fetching, assessing, scripting, synthesizing, rendering and persisting.
//! - **[`PipelineContext`]** -- collaborators, clock, per-call timeout and
//!   cancellation injected into the engine.
//! - **[`PipelineState`]** -- the typed record carried through the stages.
//! - **[`PipelineEngine`]** -- runs the seven stages strictly in order with a
//!   single failure exit, a synthesis fallback, and single-flight
//!   discipline; also runs sequential batches.

pub mod collaborator;
pub mod context;
pub mod engine;
pub mod select;
pub mod state;
pub mod voice;

// Re-export key types at the crate root.
pub use collaborator::{
    Assessor, Collaborators, Fetcher, Organizer, Renderer, ScriptWriter, SynthesisRequest,
    Synthesizer,
};
pub use context::PipelineContext;
pub use engine::{PipelineEngine, DEFAULT_BATCH_DELAY, MAX_SCRIPT_CHARS};
pub use state::{PipelineState, PipelineStatus, Stage, StageTimings};
