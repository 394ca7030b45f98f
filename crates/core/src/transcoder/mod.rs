//! Transcoder module: duration probing and plan execution.
//!
//! This module provides the `Transcoder` trait and an ffmpeg/ffprobe backed
//! implementation. Probing is a soft operation (it never fails the request);
//! execution reports failures as [`TranscodeError`] with ffmpeg's diagnostic
//! output attached.
//!
//! # Example
//!
//! ```ignore
//! use reelpush_core::transcoder::{FfmpegTranscoder, Transcoder, execute_plan};
//!
//! let transcoder = FfmpegTranscoder::with_defaults();
//! let duration = transcoder.probe_duration(Path::new("/tmp/clip.mp4")).await;
//! let plan = build_plan(&request, &paths, duration, &EncoderSettings::default())?;
//! execute_plan(&transcoder, &plan).await?;
//! ```

mod error;
mod ffmpeg;
mod traits;

pub use error::TranscodeError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::{execute_plan, TranscodeOutcome, Transcoder};
