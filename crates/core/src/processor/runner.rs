//! Request processor implementation.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::ProcessingError;
use crate::metrics::{PLANS_TOTAL, PROBE_FAILURES, REQUESTS_TOTAL, STEP_DURATION};
use crate::plan::{build_plan, EncoderSettings, PlanPaths, TransformPlan};
use crate::remote::{music_extension, AssetFetcher, AssetPublisher, PublishResult};
use crate::request::{ProcessingForm, ProcessingRequest};
use crate::scratch::{ScratchDir, TempArtifact};
use crate::transcoder::{execute_plan, TranscodeError, Transcoder};

/// Drives one upload through validate, probe, fetch, plan, transcode and
/// publish.
///
/// Holds no per-request state; a single instance serves concurrent requests.
pub struct RequestProcessor {
    transcoder: Arc<dyn Transcoder>,
    fetcher: Arc<dyn AssetFetcher>,
    publisher: Arc<dyn AssetPublisher>,
    scratch: ScratchDir,
    encoder: EncoderSettings,
}

impl RequestProcessor {
    pub fn new(
        transcoder: Arc<dyn Transcoder>,
        fetcher: Arc<dyn AssetFetcher>,
        publisher: Arc<dyn AssetPublisher>,
        scratch: ScratchDir,
    ) -> Self {
        Self {
            transcoder,
            fetcher,
            publisher,
            scratch,
            encoder: EncoderSettings::default(),
        }
    }

    /// Sets the video encoder knobs.
    pub fn with_encoder(mut self, encoder: EncoderSettings) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }

    /// Processes one upload.
    ///
    /// Takes ownership of the uploaded clip. Every scratch file created along
    /// the way, including the upload, is removed before this returns.
    pub async fn process(
        &self,
        upload: Option<TempArtifact>,
        form: ProcessingForm,
    ) -> Result<PublishResult, ProcessingError> {
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!("process_upload", request_id = %request_id);

        async move {
            let started = Instant::now();
            info!(milestone = "request_started", "Processing upload");

            let mut artifacts = RequestArtifacts {
                upload,
                ..RequestArtifacts::default()
            };
            let result = self.run(&mut artifacts, &form, started).await;
            artifacts.release().await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match &result {
                Ok(published) => {
                    REQUESTS_TOTAL.with_label_values(&["success"]).inc();
                    info!(
                        milestone = "request_finished",
                        correlation_id = %published.correlation_id,
                        elapsed_ms,
                        "Upload processed"
                    );
                }
                Err(e) => {
                    REQUESTS_TOTAL.with_label_values(&[e.kind()]).inc();
                    if e.is_client_error() {
                        warn!(milestone = "request_failed", kind = e.kind(), error = %e, elapsed_ms, "Upload rejected");
                    } else {
                        error!(milestone = "request_failed", kind = e.kind(), error = %e, elapsed_ms, "Upload processing failed");
                    }
                }
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        artifacts: &mut RequestArtifacts,
        form: &ProcessingForm,
        started: Instant,
    ) -> Result<PublishResult, ProcessingError> {
        let request = ProcessingRequest::from_form(
            form,
            artifacts.upload.as_ref().map(|a| a.path().to_path_buf()),
        )?;
        info!(
            milestone = "upload_received",
            facing_mode = %request.facing_mode,
            audio_mode = %request.audio_mode,
            has_music_url = request.has_music_url(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Upload validated"
        );

        let duration = timed("probe", self.transcoder.probe_duration(&request.video_path)).await;
        if duration.is_none() {
            PROBE_FAILURES.inc();
        }
        debug!(duration_secs = ?duration, "Duration probed");

        if let Some(url) = request.music_url.as_deref() {
            if request.audio_mode.needs_music() {
                let music = artifacts
                    .music
                    .insert(self.scratch.allocate("music", &music_extension(url)));
                let bytes = timed("fetch", self.fetcher.fetch(url, music.path())).await?;
                info!(
                    milestone = "music_fetched",
                    bytes,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Music track downloaded"
                );
            }
        }

        let output = artifacts
            .output
            .insert(self.scratch.allocate("output", ".mp4"))
            .path()
            .to_path_buf();
        let plan = build_plan(
            &request,
            &PlanPaths {
                music: artifacts.music.as_ref().map(TempArtifact::path),
                output: &output,
            },
            duration,
            &self.encoder,
        )?;

        let kind = plan.kind();
        PLANS_TOTAL.with_label_values(&[kind.label()]).inc();
        info!(
            milestone = "plan_selected",
            plan = kind.label(),
            flip = kind.flips(),
            "Transform plan selected"
        );

        if !plan.is_pass_through() {
            info!(
                milestone = "transcode_started",
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Transcoding"
            );
            let outcome = timed("transcode", execute_plan(self.transcoder.as_ref(), &plan)).await?;
            if let Some(outcome) = outcome {
                info!(
                    milestone = "transcode_finished",
                    output_bytes = outcome.output_size_bytes,
                    transcode_ms = outcome.duration_ms,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Transcode finished"
                );
            }
        }

        let artifact = match &plan {
            TransformPlan::PassThrough => request.video_path.as_path(),
            TransformPlan::MirrorOnly(_) | TransformPlan::FullTransform(_) => output.as_path(),
        };
        ensure_exists(artifact).await?;

        info!(
            milestone = "publish_started",
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Publishing"
        );
        let published = timed(
            "publish",
            self.publisher.publish(artifact, &request.destination_url),
        )
        .await?;
        info!(
            milestone = "publish_finished",
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Published"
        );

        Ok(published)
    }
}

/// Scratch files owned by one request: the upload, the music track and the
/// transcoded output.
#[derive(Default)]
struct RequestArtifacts {
    upload: Option<TempArtifact>,
    music: Option<TempArtifact>,
    output: Option<TempArtifact>,
}

impl RequestArtifacts {
    async fn release(self) {
        for artifact in [self.upload, self.music, self.output].into_iter().flatten() {
            artifact.remove().await;
        }
    }
}

async fn ensure_exists(path: &Path) -> Result<(), ProcessingError> {
    match tokio::fs::try_exists(path).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(TranscodeError::OutputMissing {
            path: path.to_path_buf(),
        }
        .into()),
        Err(e) => Err(ProcessingError::Io(e)),
    }
}

async fn timed<F: Future>(step: &'static str, fut: F) -> F::Output {
    let start = Instant::now();
    let output = fut.await;
    STEP_DURATION
        .with_label_values(&[step])
        .observe(start.elapsed().as_secs_f64());
    output
}

impl std::fmt::Debug for RequestProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestProcessor")
            .field("transcoder", &self.transcoder.name())
            .field("scratch", &self.scratch.root())
            .field("encoder", &self.encoder)
            .finish()
    }
}
