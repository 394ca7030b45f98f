//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::error::TranscodeError;
use super::traits::{TranscodeOutcome, Transcoder};
use crate::config::TranscoderConfig;
use crate::plan::TranscodeCommand;

/// FFmpeg-based transcoder implementation.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// ffprobe arguments asking for the container duration as a bare number.
    fn probe_args(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-select_streams".to_string(),
            "v:0".to_string(),
            "-show_entries".to_string(),
            "format=duration".to_string(),
            "-of".to_string(),
            "default=nokey=1:noprint_wrappers=1".to_string(),
            path.to_string_lossy().to_string(),
        ]
    }

    /// Parses ffprobe's plain-text duration output.
    fn parse_duration_output(output: &str) -> Option<f64> {
        output
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite())
    }

    /// Full ffmpeg argument list: log flags, then the plan's arguments.
    fn ffmpeg_args(&self, command: &TranscodeCommand) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-loglevel".to_string(),
            self.config.log_level.clone(),
        ];
        args.extend(command.args.iter().cloned());
        args
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe_duration(&self, path: &Path) -> Option<f64> {
        let probe = Command::new(&self.config.ffprobe_path)
            .args(Self::probe_args(path))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match timeout(
            Duration::from_secs(self.config.probe_timeout_secs),
            probe,
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(path = %path.display(), error = %e, "ffprobe could not be started");
                return None;
            }
            Err(_) => {
                warn!(
                    path = %path.display(),
                    timeout_secs = self.config.probe_timeout_secs,
                    "ffprobe timed out"
                );
                return None;
            }
        };

        if !output.status.success() {
            debug!(
                path = %path.display(),
                code = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "ffprobe exited unsuccessfully"
            );
            return None;
        }

        let duration = Self::parse_duration_output(&String::from_utf8_lossy(&output.stdout));
        if duration.is_none() {
            debug!(path = %path.display(), "ffprobe returned no usable duration");
        }
        duration
    }

    async fn execute(
        &self,
        command: &TranscodeCommand,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        let start = Instant::now();
        let args = self.ffmpeg_args(command);
        debug!(args = ?args, "Running ffmpeg");

        let child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        // Dropping the pending future on timeout kills the child.
        let output = timeout(
            Duration::from_secs(self.config.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| TranscodeError::Timeout {
            timeout_secs: self.config.timeout_secs,
        })??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!(stdout = %stdout.trim(), "ffmpeg stdout");
        }

        if !output.status.success() {
            return Err(TranscodeError::failed(
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }

        let output_meta = tokio::fs::metadata(&command.output_path)
            .await
            .map_err(|_| TranscodeError::OutputMissing {
                path: command.output_path.clone(),
            })?;

        Ok(TranscodeOutcome {
            output_size_bytes: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        let ffmpeg_result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffmpeg_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(TranscodeError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(TranscodeError::Io(e));
        }

        let ffprobe_result = Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffprobe_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(TranscodeError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                });
            }
            return Err(TranscodeError::Io(e));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanKind;
    use std::path::PathBuf;

    fn command(output: &Path) -> TranscodeCommand {
        TranscodeCommand {
            kind: PlanKind::Mute { flip: false },
            args: vec![
                "-y".to_string(),
                "-i".to_string(),
                "/in.mp4".to_string(),
                output.to_string_lossy().to_string(),
            ],
            output_path: output.to_path_buf(),
        }
    }

    fn with_binaries(ffmpeg: &str, ffprobe: &str) -> FfmpegTranscoder {
        FfmpegTranscoder::new(TranscoderConfig::with_paths(
            PathBuf::from(ffmpeg),
            PathBuf::from(ffprobe),
        ))
    }

    #[test]
    fn test_probe_args() {
        let args = FfmpegTranscoder::probe_args(Path::new("/clip.mp4"));
        assert_eq!(
            args,
            vec![
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "format=duration",
                "-of",
                "default=nokey=1:noprint_wrappers=1",
                "/clip.mp4",
            ]
        );
    }

    #[test]
    fn test_parse_duration_output() {
        assert_eq!(
            FfmpegTranscoder::parse_duration_output("12.345000\n"),
            Some(12.345)
        );
        assert_eq!(FfmpegTranscoder::parse_duration_output("N/A\n"), None);
        assert_eq!(FfmpegTranscoder::parse_duration_output(""), None);
        assert_eq!(FfmpegTranscoder::parse_duration_output("inf"), None);
    }

    #[test]
    fn test_ffmpeg_args_prepend_log_flags() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let args = transcoder.ffmpeg_args(&command(Path::new("/out.mp4")));
        assert_eq!(
            &args[..4],
            &["-hide_banner", "-nostdin", "-loglevel", "error"]
        );
        assert_eq!(args.last().map(String::as_str), Some("/out.mp4"));
    }

    #[tokio::test]
    async fn test_probe_missing_binary_is_none() {
        let transcoder = with_binaries("ffmpeg", "/nonexistent/ffprobe");
        assert_eq!(
            transcoder.probe_duration(Path::new("/clip.mp4")).await,
            None
        );
    }

    #[tokio::test]
    async fn test_execute_missing_binary() {
        let transcoder = with_binaries("/nonexistent/ffmpeg", "ffprobe");
        let err = transcoder
            .execute(&command(Path::new("/tmp/never.mp4")))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::FfmpegNotFound { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_non_zero_exit_is_none() {
        let transcoder = with_binaries("ffmpeg", "false");
        assert_eq!(
            transcoder.probe_duration(Path::new("/clip.mp4")).await,
            None
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_non_zero_exit_is_failure() {
        let transcoder = with_binaries("false", "ffprobe");
        let err = transcoder
            .execute(&command(Path::new("/tmp/never.mp4")))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Failed { code: Some(1), .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_clean_exit_without_output_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("missing.mp4");
        let transcoder = with_binaries("true", "ffprobe");
        let err = transcoder.execute(&command(&output)).await.unwrap_err();
        assert!(matches!(err, TranscodeError::OutputMissing { path } if path == output));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_clean_exit_with_output_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp4");
        std::fs::write(&output, b"0123456789").unwrap();
        let transcoder = with_binaries("true", "ffprobe");
        let outcome = transcoder.execute(&command(&output)).await.unwrap();
        assert_eq!(outcome.output_size_bytes, 10);
    }
}
