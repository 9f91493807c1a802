//! Collaborators backed by external programs.
//!
//! Each contract is served by a configured command. The command receives one
//! JSON request on stdin and must print one JSON response on stdout; a
//! non-zero exit status is a collaborator failure carrying its stderr.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use rf_core::config::{CollaboratorsConfig, CommandConfig};
use rf_core::{
    AudioRef, CandidateItem, Error, Metadata, RatedCandidate, RenderStyle, Result, ScriptStyle,
    SynthService, TimeFilter, VideoRef,
};
use rf_pipeline::{
    Assessor, Fetcher, Organizer, Renderer, ScriptWriter, StageTimings, SynthesisRequest,
    Synthesizer,
};

/// Satisfies every collaborator contract by shelling out.
///
/// Synthesized audio is an intermediate artifact and goes to
/// `<output_dir>/temp`, which the daily cleanup sweeps. Videos and metadata
/// go to `output_dir` itself.
#[derive(Debug, Clone)]
pub struct CommandCollaborators {
    commands: CollaboratorsConfig,
    output_dir: PathBuf,
    temp_dir: PathBuf,
    timeout: Duration,
}

impl CommandCollaborators {
    pub fn new(commands: CollaboratorsConfig, output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            commands,
            temp_dir: output_dir.join("temp"),
            output_dir,
            timeout: rf_pipeline::context::DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Set the process deadline. The engine applies its own deadline on top.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    async fn invoke<Req, Resp>(
        &self,
        name: &'static str,
        command: Option<&CommandConfig>,
        request: &Req,
    ) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let command = command.ok_or_else(|| {
            Error::collaborator(name, format!("no command configured for collaborators.{name}"))
        })?;
        let payload = serde_json::to_vec(request)?;
        let stdout = run_command(name, command, payload, self.timeout).await?;
        serde_json::from_str(&stdout)
            .map_err(|e| Error::collaborator(name, format!("invalid JSON response: {e}")))
    }
}

/// Spawn `command`, feed it `stdin`, and return its stdout.
async fn run_command(
    name: &'static str,
    command: &CommandConfig,
    stdin: Vec<u8>,
    timeout: Duration,
) -> Result<String> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!("Running {name}: {} {:?}", command.program.display(), command.args);
    let mut child = cmd
        .spawn()
        .map_err(|e| Error::collaborator(name, format!("failed to spawn: {e}")))?;

    if let Some(mut pipe) = child.stdin.take() {
        pipe.write_all(&stdin)
            .await
            .map_err(|e| Error::collaborator(name, format!("failed to write stdin: {e}")))?;
        // Dropping the pipe closes it so the child sees EOF.
    }

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(Error::collaborator(
                name,
                format!("I/O error waiting for process: {e}"),
            ))
        }
        Err(_) => return Err(Error::timeout(name, timeout)),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::collaborator(
            name,
            format!("exited with status {}: {}", output.status, stderr.trim()),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct FetchRequest<'a> {
    source_selectors: &'a [String],
    limit: u32,
    time_filter: TimeFilter,
}

#[derive(Serialize)]
struct AssessRequest<'a> {
    candidates: &'a [CandidateItem],
    min_rating: f64,
}

#[derive(Serialize)]
struct ScriptRequest<'a> {
    candidate: &'a RatedCandidate,
    style: ScriptStyle,
}

#[derive(Deserialize)]
struct ScriptResponse {
    script: String,
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    #[serde(flatten)]
    request: &'a SynthesisRequest,
    service: SynthService,
    output_dir: &'a Path,
}

#[derive(Deserialize)]
struct SynthesizeResponse {
    path: PathBuf,
    #[serde(default)]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct RenderRequest<'a> {
    candidate: &'a RatedCandidate,
    audio: &'a AudioRef,
    style: RenderStyle,
    output_dir: &'a Path,
}

#[derive(Serialize)]
struct PersistRequest<'a> {
    candidate: &'a RatedCandidate,
    video: &'a VideoRef,
    audio: &'a AudioRef,
    /// Stage name -> seconds.
    timings: Vec<(&'static str, f64)>,
    output_dir: &'a Path,
}

// ---------------------------------------------------------------------------
// Contract impls
// ---------------------------------------------------------------------------

#[async_trait]
impl Fetcher for CommandCollaborators {
    async fn fetch_candidates(
        &self,
        source_selectors: &[String],
        limit: u32,
        time_filter: TimeFilter,
    ) -> Result<Vec<CandidateItem>> {
        let request = FetchRequest {
            source_selectors,
            limit,
            time_filter,
        };
        self.invoke("fetch", self.commands.fetch.as_ref(), &request)
            .await
    }
}

#[async_trait]
impl Assessor for CommandCollaborators {
    async fn score_and_filter(
        &self,
        candidates: &[CandidateItem],
        min_rating: f64,
    ) -> Result<Vec<RatedCandidate>> {
        let request = AssessRequest {
            candidates,
            min_rating,
        };
        self.invoke("assess", self.commands.assess.as_ref(), &request)
            .await
    }
}

#[async_trait]
impl ScriptWriter for CommandCollaborators {
    async fn write_script(&self, candidate: &RatedCandidate, style: ScriptStyle) -> Result<String> {
        let request = ScriptRequest { candidate, style };
        let response: ScriptResponse = self
            .invoke("script", self.commands.script.as_ref(), &request)
            .await?;
        Ok(response.script)
    }
}

#[async_trait]
impl Synthesizer for CommandCollaborators {
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        service: SynthService,
    ) -> Result<AudioRef> {
        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let wire = SynthesizeRequest {
            request,
            service,
            output_dir: &self.temp_dir,
        };
        let response: SynthesizeResponse = self
            .invoke("synthesize", self.commands.synthesize.as_ref(), &wire)
            .await?;
        Ok(AudioRef {
            path: response.path,
            service,
            duration_secs: response.duration_secs,
        })
    }
}

#[async_trait]
impl Renderer for CommandCollaborators {
    async fn render(
        &self,
        candidate: &RatedCandidate,
        audio: &AudioRef,
        style: RenderStyle,
    ) -> Result<VideoRef> {
        let request = RenderRequest {
            candidate,
            audio,
            style,
            output_dir: &self.output_dir,
        };
        self.invoke("render", self.commands.render.as_ref(), &request)
            .await
    }
}

#[async_trait]
impl Organizer for CommandCollaborators {
    async fn persist(
        &self,
        candidate: &RatedCandidate,
        video: &VideoRef,
        audio: &AudioRef,
        timings: &StageTimings,
    ) -> Result<Metadata> {
        let request = PersistRequest {
            candidate,
            video,
            audio,
            timings: timings
                .iter()
                .map(|(stage, d)| (stage.as_str(), d.as_secs_f64()))
                .collect(),
            output_dir: &self.output_dir,
        };
        self.invoke("persist", self.commands.persist.as_ref(), &request)
            .await
    }
}
