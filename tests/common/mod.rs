//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which wires a temp-dir [`StatsStore`], a
//! [`ManualClock`], an [`AdmissionController`] and a [`PipelineEngine`] over
//! [`FakeCollaborators`] that count every invocation.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use reelforge::driver::Driver;
use rf_core::config::{PipelineConfig, ScheduleConfig};
use rf_core::{
    AudioRef, CandidateItem, Clock, Error, ManualClock, Metadata, RatedCandidate, RenderStyle,
    Result, ScriptStyle, SynthService, TimeFilter, VideoRef,
};
use rf_pipeline::{
    Assessor, Collaborators, Fetcher, Organizer, PipelineContext, PipelineEngine, Renderer,
    ScriptWriter, StageTimings, SynthesisRequest, Synthesizer,
};
use rf_schedule::AdmissionController;
use rf_store::StatsStore;

// ---------------------------------------------------------------------------
// Time helpers
// ---------------------------------------------------------------------------

/// 2024-05-`day` at `hour:minute`. May 1st is a Wednesday, the 5th a Sunday.
pub fn may(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// 2024-05-01 (a Wednesday) at `hour:minute`.
pub fn wed(hour: u32, minute: u32) -> NaiveDateTime {
    may(1, hour, minute)
}

// ---------------------------------------------------------------------------
// Fake collaborators
// ---------------------------------------------------------------------------

/// Scripted collaborators with invocation counters.
pub struct FakeCollaborators {
    pub items: Mutex<Vec<CandidateItem>>,
    /// Rating assigned to `items[i]`; items without a rating are dropped.
    pub ratings: Mutex<Vec<f64>>,
    pub fail_primary: Mutex<bool>,
    pub fail_secondary: Mutex<bool>,
    /// Stall inside render, to hold a run in flight.
    pub render_delay: Mutex<Option<Duration>>,

    pub fetch_calls: AtomicUsize,
    pub assess_calls: AtomicUsize,
    pub script_calls: AtomicUsize,
    pub synth_calls: AtomicUsize,
    pub render_calls: AtomicUsize,
    pub persist_calls: AtomicUsize,
    pub synth_services: Mutex<Vec<SynthService>>,
}

impl FakeCollaborators {
    /// Three items rated 8.0, 9.0, 7.5.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(vec![
                item("p1", "funny", 500),
                item("p2", "tifu", 1500),
                item("p3", "wholesome", 90),
            ]),
            ratings: Mutex::new(vec![8.0, 9.0, 7.5]),
            fail_primary: Mutex::new(false),
            fail_secondary: Mutex::new(false),
            render_delay: Mutex::new(None),
            fetch_calls: AtomicUsize::new(0),
            assess_calls: AtomicUsize::new(0),
            script_calls: AtomicUsize::new(0),
            synth_calls: AtomicUsize::new(0),
            render_calls: AtomicUsize::new(0),
            persist_calls: AtomicUsize::new(0),
            synth_services: Mutex::new(Vec::new()),
        }
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    /// Calls made after the assess stage.
    pub fn downstream_calls(&self) -> usize {
        Self::count(&self.script_calls)
            + Self::count(&self.synth_calls)
            + Self::count(&self.render_calls)
            + Self::count(&self.persist_calls)
    }
}

pub fn item(id: &str, source: &str, popularity: i64) -> CandidateItem {
    CandidateItem {
        id: id.into(),
        title: format!("Post {id}"),
        body: "Something happened today.".into(),
        source: source.into(),
        popularity_score: popularity,
        comment_count: 10,
        ..Default::default()
    }
}

#[async_trait]
impl Fetcher for FakeCollaborators {
    async fn fetch_candidates(
        &self,
        _selectors: &[String],
        limit: u32,
        _filter: TimeFilter,
    ) -> Result<Vec<CandidateItem>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let items = self.items.lock();
        Ok(items.iter().take(limit as usize).cloned().collect())
    }
}

#[async_trait]
impl Assessor for FakeCollaborators {
    async fn score_and_filter(
        &self,
        candidates: &[CandidateItem],
        min_rating: f64,
    ) -> Result<Vec<RatedCandidate>> {
        self.assess_calls.fetch_add(1, Ordering::SeqCst);
        let ratings = self.ratings.lock();
        Ok(candidates
            .iter()
            .zip(ratings.iter())
            .filter(|(_, r)| **r >= min_rating)
            .map(|(c, r)| RatedCandidate::new(c.clone(), *r))
            .collect())
    }
}

#[async_trait]
impl ScriptWriter for FakeCollaborators {
    async fn write_script(&self, candidate: &RatedCandidate, style: ScriptStyle) -> Result<String> {
        self.script_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("[{style}] {}", candidate.item.title))
    }
}

#[async_trait]
impl Synthesizer for FakeCollaborators {
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        service: SynthService,
    ) -> Result<AudioRef> {
        self.synth_calls.fetch_add(1, Ordering::SeqCst);
        self.synth_services.lock().push(service);
        let fail = match service {
            SynthService::Primary => *self.fail_primary.lock(),
            SynthService::Secondary => *self.fail_secondary.lock(),
        };
        if fail {
            return Err(Error::collaborator(
                format!("{service} synthesizer"),
                format!("{service} service unavailable"),
            ));
        }
        Ok(AudioRef {
            path: PathBuf::from(format!("/tmp/{}.mp3", request.output_stem)),
            service,
            duration_secs: Some(42.0),
        })
    }
}

#[async_trait]
impl Renderer for FakeCollaborators {
    async fn render(
        &self,
        candidate: &RatedCandidate,
        audio: &AudioRef,
        _style: RenderStyle,
    ) -> Result<VideoRef> {
        self.render_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.render_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(VideoRef {
            path: PathBuf::from(format!("/tmp/video_{}.mp4", candidate.item.id)),
            duration_secs: audio.duration_secs.unwrap_or(0.0),
        })
    }
}

#[async_trait]
impl Organizer for FakeCollaborators {
    async fn persist(
        &self,
        candidate: &RatedCandidate,
        video: &VideoRef,
        _audio: &AudioRef,
        _timings: &StageTimings,
    ) -> Result<Metadata> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Metadata {
            video_path: video.path.clone(),
            caption: candidate.item.title.clone(),
            tags: vec![candidate.item.source.clone()],
            ..Default::default()
        })
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Fully wired scheduler and engine over a temp directory.
pub struct TestHarness {
    pub dir: TempDir,
    pub clock: Arc<ManualClock>,
    pub store: Arc<StatsStore>,
    pub controller: Arc<AdmissionController>,
    pub fake: Arc<FakeCollaborators>,
    pub engine: Arc<PipelineEngine>,
    pub shutdown: CancellationToken,
}

impl TestHarness {
    /// Default schedule, clock at Wednesday 10:00.
    pub fn new() -> Self {
        Self::with_schedule(ScheduleConfig::default())
    }

    pub fn with_schedule(schedule: ScheduleConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(wed(10, 0)));
        let store = Arc::new(StatsStore::in_dir(dir.path()));
        let controller = Arc::new(AdmissionController::new(schedule, store.clone()).unwrap());
        let fake = Arc::new(FakeCollaborators::new());
        let shutdown = CancellationToken::new();
        let ctx = PipelineContext::new(Collaborators::from_shared(fake.clone()))
            .with_clock(clock.clone())
            .with_cancellation(shutdown.clone());

        Self {
            dir,
            clock,
            store,
            controller,
            fake,
            engine: Arc::new(PipelineEngine::new(ctx)),
            shutdown,
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// A driver over this harness using the default pipeline profile.
    pub fn driver(&self) -> Driver {
        Driver::new(
            self.controller.clone(),
            self.engine.clone(),
            PipelineConfig::default(),
            self.clock.clone(),
        )
        .with_shutdown(self.shutdown.clone())
    }
}
