//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the transcoder and remote
//! transfer traits, so the processor and HTTP layer can be exercised without
//! ffmpeg or network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelpush_core::testing::{MockFetcher, MockPublisher, MockTranscoder};
//!
//! let transcoder = Arc::new(MockTranscoder::new());
//! let fetcher = Arc::new(MockFetcher::new());
//! let publisher = Arc::new(MockPublisher::new());
//!
//! // Configure mock behavior
//! transcoder.set_duration(None).await;
//! publisher.set_next_error(PublishError::Status { status: 403 }).await;
//!
//! // Use in a RequestProcessor...
//! ```

mod mock_remote;
mod mock_transcoder;

pub use mock_remote::{MockFetcher, MockPublisher, RecordedFetch, RecordedPublish, PARTIAL_BYTES};
pub use mock_transcoder::{MockTranscoder, MOCK_OUTPUT_BYTES};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::request::ProcessingForm;
    use crate::scratch::{ScratchDir, TempArtifact};

    /// Destination used by fixtures; its correlation id is `asset-123`.
    pub const DESTINATION_URL: &str =
        "https://storage.example.com/video-uploads/asset-123?X-Goog-Signature=abc";

    /// Bytes of the fake uploaded clip.
    pub const UPLOAD_BYTES: &[u8] = b"fake-uploaded-clip";

    /// Create a form with only a destination set.
    pub fn form() -> ProcessingForm {
        ProcessingForm {
            destination_url: Some(DESTINATION_URL.to_string()),
            ..Default::default()
        }
    }

    /// Create a form from `(field, value)` pairs on top of [`form`].
    pub fn form_with(fields: &[(&str, &str)]) -> ProcessingForm {
        let mut form = form();
        for (name, value) in fields {
            form.set_field(name, value.to_string());
        }
        form
    }

    /// Write [`UPLOAD_BYTES`] to a fresh upload artifact in `scratch`.
    pub fn upload(scratch: &ScratchDir) -> TempArtifact {
        let artifact = scratch.allocate("upload", ".mp4");
        write(artifact.path(), UPLOAD_BYTES);
        artifact
    }

    fn write(path: &Path, bytes: &[u8]) {
        if let Err(e) = std::fs::write(path, bytes) {
            panic!("failed to write fixture {}: {}", path.display(), e);
        }
    }
}
