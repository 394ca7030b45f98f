//! Mock transcoder for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::plan::TranscodeCommand;
use crate::testing::PARTIAL_BYTES;
use crate::transcoder::{TranscodeError, TranscodeOutcome, Transcoder};

/// Bytes written to the output path when no custom output is configured.
pub const MOCK_OUTPUT_BYTES: &[u8] = b"mock-transcoded-output";

/// Mock implementation of the Transcoder trait.
///
/// Provides controllable behavior for testing:
/// - Control the probed duration
/// - Record every executed command
/// - Simulate ffmpeg failures
/// - Optionally "forget" to write the output file
/// - Leave a partial output behind when failing
///
/// # Example
///
/// ```rust,ignore
/// use reelpush_core::testing::MockTranscoder;
///
/// let transcoder = MockTranscoder::new();
/// transcoder.set_duration(Some(12.5)).await;
///
/// // ... run a request ...
///
/// let commands = transcoder.recorded_commands().await;
/// assert_eq!(commands.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockTranscoder {
    /// Duration returned by `probe_duration`.
    duration: Arc<RwLock<Option<f64>>>,
    /// Commands passed to `execute`, in order.
    commands: Arc<RwLock<Vec<TranscodeCommand>>>,
    /// If set, the next execute will fail with this error.
    next_error: Arc<RwLock<Option<TranscodeError>>>,
    /// Bytes written to the output path on success.
    output: Arc<RwLock<Vec<u8>>>,
    /// Whether execute writes the output file at all.
    write_output: Arc<RwLock<bool>>,
    /// Whether a failing execute first writes a partial output.
    partial_on_error: Arc<RwLock<bool>>,
    /// Number of probes performed.
    probes: Arc<RwLock<usize>>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    /// Create a new mock transcoder that reports a 10 second clip.
    pub fn new() -> Self {
        Self {
            duration: Arc::new(RwLock::new(Some(10.0))),
            commands: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            output: Arc::new(RwLock::new(MOCK_OUTPUT_BYTES.to_vec())),
            write_output: Arc::new(RwLock::new(true)),
            partial_on_error: Arc::new(RwLock::new(false)),
            probes: Arc::new(RwLock::new(0)),
        }
    }

    /// Set the duration reported by the next probes (`None` simulates a failed probe).
    pub async fn set_duration(&self, duration: Option<f64>) {
        *self.duration.write().await = duration;
    }

    /// Configure the next execute to fail with the given error.
    pub async fn set_next_error(&self, error: TranscodeError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the bytes written to the output file.
    pub async fn set_output(&self, bytes: impl Into<Vec<u8>>) {
        *self.output.write().await = bytes.into();
    }

    /// Enable or disable writing the output file on success.
    pub async fn set_write_output(&self, write: bool) {
        *self.write_output.write().await = write;
    }

    /// Write [`PARTIAL_BYTES`] to the output path before failing.
    pub async fn set_partial_on_error(&self, partial: bool) {
        *self.partial_on_error.write().await = partial;
    }

    /// Get all executed commands.
    pub async fn recorded_commands(&self) -> Vec<TranscodeCommand> {
        self.commands.read().await.clone()
    }

    /// Get the number of executed commands.
    pub async fn execution_count(&self) -> usize {
        self.commands.read().await.len()
    }

    /// Get the number of probes performed.
    pub async fn probe_count(&self) -> usize {
        *self.probes.read().await
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe_duration(&self, _path: &Path) -> Option<f64> {
        *self.probes.write().await += 1;
        *self.duration.read().await
    }

    async fn execute(&self, command: &TranscodeCommand) -> Result<TranscodeOutcome, TranscodeError> {
        self.commands.write().await.push(command.clone());

        if let Some(err) = self.next_error.write().await.take() {
            if *self.partial_on_error.read().await {
                tokio::fs::write(&command.output_path, PARTIAL_BYTES).await?;
            }
            return Err(err);
        }

        let mut size = 0;
        if *self.write_output.read().await {
            let output = self.output.read().await.clone();
            size = output.len() as u64;
            tokio::fs::write(&command.output_path, output).await?;
        }

        Ok(TranscodeOutcome {
            output_size_bytes: size,
            duration_ms: 1,
        })
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        Ok(())
    }
}
