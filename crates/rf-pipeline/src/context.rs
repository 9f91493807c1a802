//! Execution context injected into the pipeline engine.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use rf_core::{Clock, SystemClock};

use crate::collaborator::Collaborators;

/// Default deadline for a single collaborator call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Everything the engine needs besides the per-run profile.
pub struct PipelineContext {
    /// External capabilities invoked by the stages.
    pub collaborators: Collaborators,
    /// Wall-clock source for run start times and file naming.
    pub clock: Arc<dyn Clock>,
    /// Deadline applied to every collaborator call.
    pub call_timeout: Duration,
    /// Token checked between stages; when cancelled the run fails at the
    /// next stage boundary.
    pub cancellation: CancellationToken,
}

impl PipelineContext {
    /// Create a context using the system clock and default timeout.
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            clock: Arc::new(SystemClock),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            cancellation: CancellationToken::new(),
        }
    }

    /// Builder: use a different clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builder: set the per-call deadline.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Builder: attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("call_timeout", &self.call_timeout)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}
