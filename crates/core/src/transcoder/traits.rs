//! Trait definitions for the transcoder module.

use async_trait::async_trait;
use std::path::Path;

use super::error::TranscodeError;
use crate::plan::{TranscodeCommand, TransformPlan};

/// Result of a successful ffmpeg run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeOutcome {
    pub output_size_bytes: u64,
    pub duration_ms: u64,
}

/// Inspects and transforms media files.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Duration of the file's container in seconds.
    ///
    /// Never fails: any problem yields `None`.
    async fn probe_duration(&self, path: &Path) -> Option<f64>;

    /// Runs one transcode and verifies its output exists.
    async fn execute(&self, command: &TranscodeCommand)
        -> Result<TranscodeOutcome, TranscodeError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), TranscodeError>;
}

/// Runs a plan. Pass-through plans never touch the transcoder.
pub async fn execute_plan(
    transcoder: &dyn Transcoder,
    plan: &TransformPlan,
) -> Result<Option<TranscodeOutcome>, TranscodeError> {
    match plan.command() {
        Some(command) => transcoder.execute(command).await.map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanKind;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingTranscoder {
        executions: AtomicUsize,
    }

    #[async_trait]
    impl Transcoder for CountingTranscoder {
        fn name(&self) -> &str {
            "counting"
        }

        async fn probe_duration(&self, _path: &Path) -> Option<f64> {
            Some(1.0)
        }

        async fn execute(
            &self,
            _command: &TranscodeCommand,
        ) -> Result<TranscodeOutcome, TranscodeError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            Ok(TranscodeOutcome {
                output_size_bytes: 10,
                duration_ms: 1,
            })
        }

        async fn validate(&self) -> Result<(), TranscodeError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_execute_plan_skips_pass_through() {
        let transcoder = CountingTranscoder::default();
        let outcome = execute_plan(&transcoder, &TransformPlan::PassThrough)
            .await
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(transcoder.executions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_execute_plan_runs_command() {
        let transcoder = CountingTranscoder::default();
        let plan = TransformPlan::MirrorOnly(TranscodeCommand {
            kind: PlanKind::MirrorOnly,
            args: vec!["-y".into()],
            output_path: PathBuf::from("/tmp/out.mp4"),
        });
        let outcome = execute_plan(&transcoder, &plan).await.unwrap();
        assert_eq!(outcome.map(|o| o.output_size_bytes), Some(10));
        assert_eq!(transcoder.executions.load(Ordering::SeqCst), 1);
    }
}
