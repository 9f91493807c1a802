//! The periodic driver: asks for admission, runs the engine, records the run.
//! Between ticks it also runs the daily cleanup and the weekly report.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use rf_core::config::PipelineConfig;
use rf_core::{Clock, RunOutcome};
use rf_pipeline::{PipelineEngine, PipelineState};
use rf_schedule::{Admission, AdmissionController, Chore, ChoreSchedule};
use rf_store::Housekeeper;

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Admission was denied; nothing ran.
    Skipped(String),
    /// A run happened (successfully or not) and was recorded.
    Ran(RunOutcome),
}

/// Cooperative timer loop. One tick at a time; a run blocks the loop until
/// it finishes, so stats are only ever touched from here.
pub struct Driver {
    controller: Arc<AdmissionController>,
    engine: Arc<PipelineEngine>,
    base: PipelineConfig,
    clock: Arc<dyn Clock>,
    interval: Duration,
    shutdown: CancellationToken,
    housekeeper: Housekeeper,
    chores: ChoreSchedule,
}

impl Driver {
    pub fn new(
        controller: Arc<AdmissionController>,
        engine: Arc<PipelineEngine>,
        base: PipelineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let interval = Duration::from_secs(controller.config().interval_hours.saturating_mul(3600));
        let data_dir = controller
            .store()
            .stats_path()
            .parent()
            .unwrap_or(Path::new("."));
        let housekeeper = Housekeeper::in_dir(data_dir);
        let chores = ChoreSchedule::starting_at(clock.now());
        Self {
            controller,
            engine,
            base,
            clock,
            interval,
            shutdown: CancellationToken::new(),
            housekeeper,
            chores,
        }
    }

    /// Builder: override the tick interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Builder: attach a shutdown token.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Builder: override where cleanup and reports operate.
    pub fn with_housekeeper(mut self, housekeeper: Housekeeper) -> Self {
        self.housekeeper = housekeeper;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One admission check and, if granted, one recorded run.
    ///
    /// Engine errors (e.g. busy) are recorded as a crashed run. Only a
    /// failure to persist the record is returned as an error.
    pub async fn tick(&self) -> rf_core::Result<TickOutcome> {
        let now = self.clock.now();
        if let Admission::Denied(reason) = self.controller.can_run_now(now) {
            tracing::info!("Skipping run: {reason}");
            return Ok(TickOutcome::Skipped(reason.to_string()));
        }

        let config = self.controller.optimal_config(&self.base, now);
        if self.controller.is_peak_time(now) {
            tracing::info!("Peak hours: using stricter profile");
        }

        let outcome = outcome_of(&self.engine.run(&config).await);
        self.controller.record_run(&outcome, self.clock.now())?;
        Ok(TickOutcome::Ran(outcome))
    }

    /// Run `count` pipelines back to back without admission checks, using
    /// the profile for the current time. Each run is recorded as soon as it
    /// finishes, so an interrupted batch keeps what it already made.
    pub async fn batch(&self, count: usize) -> Vec<RunOutcome> {
        let config = self.controller.optimal_config(&self.base, self.clock.now());
        let delay = Duration::from_secs(config.batch_delay_secs);

        let mut outcomes = Vec::with_capacity(count);
        self.engine
            .run_batch_with(count, &config, delay, |_, result| {
                let outcome = outcome_of(&result);
                if let Err(e) = self.controller.record_run(&outcome, self.clock.now()) {
                    tracing::error!("Failed to record run: {e}");
                }
                outcomes.push(outcome);
            })
            .await;
        outcomes
    }

    /// Run every chore whose slot has passed and return them.
    ///
    /// Chore failures are logged; they never stop the driver.
    pub fn run_due_chores(&mut self) -> Vec<Chore> {
        let now = self.clock.now();
        let due = self.chores.take_due(now);
        for chore in &due {
            tracing::info!("Running {chore}");
            let result = match chore {
                Chore::DailyCleanup => self
                    .housekeeper
                    .cleanup(self.clock.system_time(), now.date())
                    .map(|_| ()),
                Chore::WeeklyReport => {
                    let summary = self.controller.weekly_summary(now);
                    tracing::info!("Weekly report:\n{summary}");
                    self.housekeeper
                        .write_report(now.date(), &summary)
                        .map(|path| tracing::info!("Weekly report saved to {}", path.display()))
                }
            };
            if let Err(e) = result {
                tracing::error!("{chore} failed: {e}");
            }
        }
        due
    }

    /// Tick immediately, then every interval, until shutdown. Wakes early
    /// for chores without disturbing the tick cadence.
    pub async fn run(mut self) {
        tracing::info!(
            "Driver started (interval {}h, max {}/day)",
            self.controller.config().interval_hours,
            self.controller.config().max_videos_per_day
        );

        let mut next_tick = Instant::now();
        loop {
            if Instant::now() >= next_tick {
                if let Err(e) = self.tick().await {
                    tracing::error!("Failed to record run: {e}");
                }
                next_tick = Instant::now() + self.interval;
            }
            self.run_due_chores();

            let until_chore = (self.chores.next_due() - self.clock.now())
                .to_std()
                .unwrap_or_default();
            let wake = next_tick.min(Instant::now() + until_chore);

            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    tracing::info!("Driver shutting down");
                    break;
                }
                _ = tokio::time::sleep_until(wake) => {}
            }
        }
    }
}

/// Log a finished engine call and turn it into the record to store. Engine
/// errors (e.g. busy) become crashed runs.
fn outcome_of(result: &rf_core::Result<PipelineState>) -> RunOutcome {
    match result {
        Ok(state) => {
            let outcome = state.outcome();
            match &outcome.error {
                None => tracing::info!(
                    "Run succeeded: {}",
                    outcome
                        .video_path
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default()
                ),
                Some(error) => tracing::warn!("Run failed: {error}"),
            }
            outcome
        }
        Err(e) => {
            tracing::error!("Pipeline crashed: {e}");
            RunOutcome::crashed(e)
        }
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
