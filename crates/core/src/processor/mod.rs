//! Request orchestration.
//!
//! [`RequestProcessor`] runs one upload through a single pass:
//!
//! ```text
//! Validate -> ProbeDuration -> [FetchMusic] -> BuildPlan -> [Execute] -> Publish -> Cleanup
//! ```
//!
//! Music is only fetched for the music audio modes and the transcoder is only
//! invoked for plans other than pass-through. Scratch files are
//! [`TempArtifact`](crate::scratch::TempArtifact)s owned by the call and
//! removed once it finishes, whether it succeeded or failed.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use reelpush_core::processor::RequestProcessor;
//! use reelpush_core::remote::HttpAssetClient;
//! use reelpush_core::scratch::ScratchDir;
//! use reelpush_core::transcoder::FfmpegTranscoder;
//!
//! let http = Arc::new(HttpAssetClient::new(&config.http)?);
//! let processor = RequestProcessor::new(
//!     Arc::new(FfmpegTranscoder::new(config.transcoder.clone())),
//!     http.clone(),
//!     http,
//!     ScratchDir::new(&config.scratch.dir)?,
//! );
//!
//! let published = processor.process(Some(upload), form).await?;
//! println!("asset id: {}", published.correlation_id);
//! ```

mod runner;

pub use runner::RequestProcessor;
