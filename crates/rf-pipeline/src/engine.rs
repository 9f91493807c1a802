//! Pipeline engine: runs the seven stages in order with per-stage timing,
//! cancellation between stages, and a single failure exit.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use rf_core::config::PipelineConfig;
use rf_core::{Error, Result, SynthService};

use crate::collaborator::SynthesisRequest;
use crate::context::PipelineContext;
use crate::select::select;
use crate::state::{PipelineState, PipelineStatus, Stage};
use crate::voice::voice_for;

/// Scripts are cut to this many characters before synthesis.
pub const MAX_SCRIPT_CHARS: usize = 1000;

/// Pause between consecutive runs of a batch.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(5);

/// Runs the content-to-video state machine.
///
/// One engine admits one run at a time; a concurrent [`run`](Self::run)
/// returns [`Error::Busy`] instead of interleaving state.
pub struct PipelineEngine {
    ctx: PipelineContext,
    in_flight: Mutex<()>,
}

impl PipelineEngine {
    pub fn new(ctx: PipelineContext) -> Self {
        Self {
            ctx,
            in_flight: Mutex::new(()),
        }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    /// Execute one full run.
    ///
    /// Stage failures are reported in the returned state (`status ==
    /// Failed`, `error == "<stage> error: <detail>"`); later stages are
    /// skipped and nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] if another run is in progress on this engine.
    pub async fn run(&self, config: &PipelineConfig) -> Result<PipelineState> {
        let _flight = self.in_flight.try_lock().map_err(|_| Error::Busy)?;

        let mut state = PipelineState::new(self.ctx.clock.now());
        let started = Instant::now();
        tracing::info!(run_id = %state.run_id, "Starting pipeline run");

        for stage in Stage::ALL {
            if self.ctx.cancellation.is_cancelled() {
                tracing::info!(run_id = %state.run_id, "Pipeline cancelled before {stage}");
                state.fail(stage, "cancelled");
                break;
            }

            state.status = stage.status();
            tracing::debug!("Starting: {stage}");
            let stage_started = Instant::now();
            let result = self.execute_stage(stage, &mut state, config, started).await;
            state.timings.insert(stage, stage_started.elapsed());

            if let Err(e) = result {
                let detail = match e {
                    Error::Stage { detail, .. } => detail,
                    other => other.to_string(),
                };
                tracing::error!(run_id = %state.run_id, "Stage {stage} failed: {detail}");
                state.fail(stage, detail);
                break;
            }
        }

        if state.status != PipelineStatus::Failed {
            state.status = PipelineStatus::Success;
            tracing::info!(
                run_id = %state.run_id,
                elapsed = ?started.elapsed(),
                "Pipeline run succeeded"
            );
        }
        Ok(state)
    }

    /// Execute `count` runs one after another, pausing `delay` between them.
    ///
    /// No pause follows the last run. Cancellation stops the batch early,
    /// including during a pause.
    pub async fn run_batch(
        &self,
        count: usize,
        config: &PipelineConfig,
        delay: Duration,
    ) -> Vec<Result<PipelineState>> {
        let mut results = Vec::with_capacity(count);
        self.run_batch_with(count, config, delay, |_, result| results.push(result))
            .await;
        results
    }

    /// [`run_batch`](Self::run_batch), handing each result to `on_result`
    /// (with its zero-based index) as soon as that run finishes and before
    /// the pause that follows it.
    pub async fn run_batch_with(
        &self,
        count: usize,
        config: &PipelineConfig,
        delay: Duration,
        mut on_result: impl FnMut(usize, Result<PipelineState>),
    ) {
        for i in 0..count {
            tracing::info!("Creating video {}/{}", i + 1, count);
            let result = self.run(config).await;
            match &result {
                Ok(state) if state.is_success() => {
                    tracing::info!("Batch run {} succeeded", i + 1)
                }
                Ok(state) => tracing::warn!(
                    "Batch run {} failed: {}",
                    i + 1,
                    state.error.as_deref().unwrap_or("unknown error")
                ),
                Err(e) => tracing::error!("Batch run {} crashed: {e}", i + 1),
            }
            on_result(i, result);

            if i + 1 < count {
                tokio::select! {
                    biased;

                    _ = self.ctx.cancellation.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    async fn execute_stage(
        &self,
        stage: Stage,
        state: &mut PipelineState,
        config: &PipelineConfig,
        started: Instant,
    ) -> Result<()> {
        match stage {
            Stage::Fetch => self.fetch(state, config).await,
            Stage::Assess => self.assess(state, config).await,
            Stage::Select => Self::select_candidate(state, config),
            Stage::Script => self.script(state, config).await,
            Stage::Synthesize => self.synthesize(state, config).await,
            Stage::Render => self.render(state, config).await,
            Stage::Organize => self.organize(state, started).await,
        }
    }

    // -----------------------------------------------------------------------
    // Stages
    // -----------------------------------------------------------------------

    async fn fetch(&self, state: &mut PipelineState, config: &PipelineConfig) -> Result<()> {
        let fetcher = &self.ctx.collaborators.fetcher;
        let items = self
            .call(
                "fetcher",
                fetcher.fetch_candidates(
                    &config.source_selectors,
                    config.fetch_limit,
                    config.time_filter,
                ),
            )
            .await?;
        if items.is_empty() {
            return Err(Error::stage(Stage::Fetch.as_str(), "no candidate items found"));
        }
        tracing::info!("Fetched {} candidates", items.len());
        state.candidates = items;
        Ok(())
    }

    async fn assess(&self, state: &mut PipelineState, config: &PipelineConfig) -> Result<()> {
        let assessor = &self.ctx.collaborators.assessor;
        let mut rated = self
            .call(
                "assessor",
                assessor.score_and_filter(&state.candidates, config.min_rating),
            )
            .await?;

        for candidate in &mut rated {
            candidate.rating = candidate.rating.clamp(1.0, 10.0);
        }
        rated.retain(|c| c.rating >= config.min_rating);
        if rated.is_empty() {
            return Err(Error::stage(
                Stage::Assess.as_str(),
                format!(
                    "no candidates met quality threshold of {:.1}/10",
                    config.min_rating
                ),
            ));
        }

        // Stable, so equal ratings keep the assessor's order.
        rated.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        tracing::info!(
            "{} candidates passed assessment (best {:.1}/10)",
            rated.len(),
            rated[0].rating
        );
        state.rated = rated;
        Ok(())
    }

    fn select_candidate(state: &mut PipelineState, config: &PipelineConfig) -> Result<()> {
        let chosen = select(config.selection_strategy, &state.rated)
            .cloned()
            .ok_or_else(|| Error::stage(Stage::Select.as_str(), "no assessed candidates"))?;
        tracing::info!(
            strategy = %config.selection_strategy,
            "Selected '{}' ({:.1}/10)",
            chosen.item.title,
            chosen.rating
        );
        state.selected = Some(chosen);
        Ok(())
    }

    async fn script(&self, state: &mut PipelineState, config: &PipelineConfig) -> Result<()> {
        let writer = &self.ctx.collaborators.writer;
        let candidate = state.require_selected()?;
        let text = self
            .call("script writer", writer.write_script(candidate, config.script_style))
            .await?;

        let text = text.trim();
        if text.is_empty() {
            return Err(Error::stage(Stage::Script.as_str(), "script writer returned empty text"));
        }
        let script = truncate_chars(text, MAX_SCRIPT_CHARS);
        tracing::debug!("Script is {} characters", script.chars().count());
        state.script = Some(script);
        Ok(())
    }

    async fn synthesize(&self, state: &mut PipelineState, config: &PipelineConfig) -> Result<()> {
        let candidate = state.require_selected()?;
        let request = SynthesisRequest {
            text: state.require_script()?.to_owned(),
            voice_profile: config
                .voice_profile
                .clone()
                .unwrap_or_else(|| voice_for(&candidate.item)),
            output_stem: format!(
                "tts_audio_{}_{}",
                state.started_at.format("%Y%m%d_%H%M%S"),
                candidate.item.id
            ),
        };

        let synthesizer = &self.ctx.collaborators.synthesizer;
        let audio = match self
            .call(
                "synthesizer",
                synthesizer.synthesize(&request, SynthService::Primary),
            )
            .await
        {
            Ok(audio) => audio,
            Err(primary) => {
                tracing::warn!("Primary synthesis failed: {primary}; trying secondary service");
                self.call(
                    "secondary synthesizer",
                    synthesizer.synthesize(&request, SynthService::Secondary),
                )
                .await?
            }
        };

        tracing::info!(
            service = %audio.service,
            voice = %request.voice_profile,
            "Synthesized narration to {}",
            audio.path.display()
        );
        state.audio = Some(audio);
        Ok(())
    }

    async fn render(&self, state: &mut PipelineState, config: &PipelineConfig) -> Result<()> {
        let renderer = &self.ctx.collaborators.renderer;
        let candidate = state.require_selected()?;
        let audio = state.require_audio()?;
        let video = self
            .call(
                "renderer",
                renderer.render(candidate, audio, config.render_style),
            )
            .await?;
        tracing::info!(
            "Rendered {:.1}s video to {}",
            video.duration_secs,
            video.path.display()
        );
        state.video = Some(video);
        Ok(())
    }

    async fn organize(&self, state: &mut PipelineState, started: Instant) -> Result<()> {
        state.total_time = Some(started.elapsed());

        let organizer = &self.ctx.collaborators.organizer;
        let candidate = state.require_selected()?;
        let video = state.require_video()?;
        let audio = state.require_audio()?;
        let metadata = self
            .call(
                "organizer",
                organizer.persist(candidate, video, audio, &state.timings),
            )
            .await?;
        tracing::info!("Persisted video at {}", metadata.video_path.display());
        state.metadata = Some(metadata);
        Ok(())
    }

    /// Await a collaborator call under the context deadline.
    async fn call<T>(
        &self,
        collaborator: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.ctx.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(collaborator, self.ctx.call_timeout)),
        }
    }
}

impl std::fmt::Debug for PipelineEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineEngine")
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}
