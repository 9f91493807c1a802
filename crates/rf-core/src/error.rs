//! Unified error type for reelforge.
//!
//! All crates funnel their failures into [`Error`]. Stage failures carry the
//! stage name so the pipeline can report `"<stage> error: <detail>"` without
//! re-wrapping, and collaborator failures keep the original message intact.

use std::time::Duration;

/// Unified error type covering all failure modes in reelforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A pipeline stage failed; aborts only the current run.
    #[error("{stage} error: {detail}")]
    Stage {
        /// The stage that failed (e.g. "fetch", "synthesize").
        stage: String,
        /// Human-readable error description.
        detail: String,
    },

    /// An external collaborator (fetcher, renderer, ...) reported a failure.
    #[error("{collaborator} failed: {message}")]
    Collaborator {
        /// Name of the collaborator that failed.
        collaborator: String,
        /// The collaborator's own error message.
        message: String,
    },

    /// A collaborator call exceeded its deadline.
    #[error("{collaborator} timed out after {after:?}")]
    Timeout {
        /// Name of the collaborator that was cut off.
        collaborator: String,
        /// The deadline that expired.
        after: Duration,
    },

    /// A run is already in flight on this engine.
    #[error("Pipeline busy: a run is already in progress")]
    Busy,

    /// Malformed configuration; fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {source}")]
    Serialization {
        /// The underlying serde_json error.
        #[from]
        source: serde_json::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::Stage`].
    pub fn stage(stage: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Stage {
            stage: stage.into(),
            detail: detail.into(),
        }
    }

    /// Convenience constructor for [`Error::Collaborator`].
    pub fn collaborator(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Collaborator {
            collaborator: collaborator.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Timeout`].
    pub fn timeout(collaborator: impl Into<String>, after: Duration) -> Self {
        Error::Timeout {
            collaborator: collaborator.into(),
            after,
        }
    }

    /// Whether this error is the single-flight rejection.
    pub fn is_busy(&self) -> bool {
        matches!(self, Error::Busy)
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
