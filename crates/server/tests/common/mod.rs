//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock dependencies injected, so uploads can be exercised without
//! ffmpeg or network access.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio_test::assert_ok;
use tower::ServiceExt;

use reelpush_core::{
    testing::{MockFetcher, MockPublisher, MockTranscoder},
    Config, RequestProcessor, ScratchDir,
};
use reelpush_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use reelpush_core::testing::fixtures;

/// Multipart boundary used by [`MultipartBody`].
pub const BOUNDARY: &str = "reelpush-test-boundary";

/// Test fixture for E2E testing with mock dependencies.
///
/// Provides an in-process server with fully controllable mocks for:
/// - Duration probing and transcoding (MockTranscoder)
/// - Music download (MockFetcher)
/// - Result upload (MockPublisher)
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_pass_through() {
///     let fixture = TestFixture::new();
///
///     let body = MultipartBody::new()
///         .video("clip.mp4", b"bytes")
///         .text("muxUploadUrl", "https://store/asset-1");
///     let response = fixture.upload("/process-upload", body).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub transcoder: Arc<MockTranscoder>,
    pub fetcher: Arc<MockFetcher>,
    pub publisher: Arc<MockPublisher>,
    /// Scratch directory backing every request
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a test fixture with custom configuration. The scratch directory
    /// is always replaced by a private temp dir.
    pub fn with_config(mut config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        config.scratch.dir = temp_dir.path().to_path_buf();

        let transcoder = Arc::new(MockTranscoder::new());
        let fetcher = Arc::new(MockFetcher::new());
        let publisher = Arc::new(MockPublisher::new());

        let scratch = ScratchDir::new(&config.scratch.dir).expect("Failed to create scratch dir");
        let processor = RequestProcessor::new(
            transcoder.clone(),
            fetcher.clone(),
            publisher.clone(),
            scratch,
        );

        let state = Arc::new(AppState::new(config, processor));
        let router = create_router(state);

        Self {
            router,
            transcoder,
            fetcher,
            publisher,
            temp_dir,
        }
    }

    /// Number of files left in the scratch directory.
    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.temp_dir.path())
            .expect("Failed to read scratch dir")
            .count()
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a multipart upload.
    pub async fn upload(&self, path: &str, body: MultipartBody) -> TestResponse {
        self.post_with_content_type(path, body.finish(), &body_content_type())
            .await
    }

    /// Send a POST request with a raw body and custom content type.
    pub async fn post_with_content_type(
        &self,
        path: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Send a raw request and return status plus the undecoded body.
    pub async fn send_raw(&self, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = assert_ok!(
            self.router.clone().oneshot(request).await,
            "Failed to send request"
        );

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes =
            assert_ok!(response.into_body().collect().await, "Failed to collect body").to_bytes();

        (status, headers, body_bytes.to_vec())
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let (status, _, body_bytes) = self.send_raw(request).await;

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Content-Type header value matching [`MultipartBody`].
pub fn body_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// Minimal multipart/form-data encoder.
#[derive(Debug, Default)]
pub struct MultipartBody {
    buffer: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file part named `video`.
    pub fn video(self, file_name: &str, bytes: &[u8]) -> Self {
        self.file("video", file_name, bytes)
    }

    /// Add a file part.
    pub fn file(mut self, name: &str, file_name: &str, bytes: &[u8]) -> Self {
        self.buffer.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name, file_name
            )
            .as_bytes(),
        );
        self.buffer.extend_from_slice(bytes);
        self.buffer.extend_from_slice(b"\r\n");
        self
    }

    /// Add a text part.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buffer.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    /// Close the body.
    pub fn finish(mut self) -> Vec<u8> {
        self.buffer
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.buffer
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
