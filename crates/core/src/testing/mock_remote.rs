//! Mock fetcher and publisher for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::remote::{
    correlation_id, AssetFetcher, AssetPublisher, FetchError, PublishError, PublishResult,
};

/// Bytes a mock leaves behind when asked to fail part-way.
pub const PARTIAL_BYTES: &[u8] = b"partial";

/// A recorded download for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    pub url: String,
    /// Extension of the destination file, with the leading dot.
    pub dest_extension: Option<String>,
}

/// A recorded upload for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedPublish {
    pub destination_url: String,
    /// File contents at the time of the upload.
    pub body: Vec<u8>,
}

/// Mock implementation of the AssetFetcher trait.
///
/// Writes configurable bytes to the destination unless an error is queued.
/// With `set_partial_on_error(true)` a failing download first leaves
/// [`PARTIAL_BYTES`] behind, like a transfer cut off mid-stream.
#[derive(Debug)]
pub struct MockFetcher {
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
    body: Arc<RwLock<Vec<u8>>>,
    next_error: Arc<RwLock<Option<FetchError>>>,
    partial_on_error: Arc<RwLock<bool>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    /// Create a new mock fetcher.
    pub fn new() -> Self {
        Self {
            fetches: Arc::new(RwLock::new(Vec::new())),
            body: Arc::new(RwLock::new(b"mock-music-track".to_vec())),
            next_error: Arc::new(RwLock::new(None)),
            partial_on_error: Arc::new(RwLock::new(false)),
        }
    }

    /// Set the bytes written for every download.
    pub async fn set_body(&self, body: impl Into<Vec<u8>>) {
        *self.body.write().await = body.into();
    }

    /// Configure the next download to fail with the given error.
    pub async fn set_next_error(&self, error: FetchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Write [`PARTIAL_BYTES`] to the destination before failing.
    pub async fn set_partial_on_error(&self, partial: bool) {
        *self.partial_on_error.write().await = partial;
    }

    /// Get all recorded downloads.
    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }

    /// Get the number of downloads attempted.
    pub async fn fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }
}

#[async_trait]
impl AssetFetcher for MockFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        self.fetches.write().await.push(RecordedFetch {
            url: url.to_string(),
            dest_extension: dest
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{}", e)),
        });

        if let Some(err) = self.next_error.write().await.take() {
            if *self.partial_on_error.read().await {
                tokio::fs::write(dest, PARTIAL_BYTES).await?;
            }
            return Err(err);
        }

        let body = self.body.read().await.clone();
        if body.is_empty() {
            return Err(FetchError::EmptyBody);
        }
        tokio::fs::write(dest, &body).await?;
        Ok(body.len() as u64)
    }
}

/// Mock implementation of the AssetPublisher trait.
///
/// Reads the published file eagerly so tests can assert on its contents after
/// the request has cleaned up its scratch files.
#[derive(Debug)]
pub struct MockPublisher {
    publishes: Arc<RwLock<Vec<RecordedPublish>>>,
    next_error: Arc<RwLock<Option<PublishError>>>,
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPublisher {
    /// Create a new mock publisher.
    pub fn new() -> Self {
        Self {
            publishes: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Configure the next upload to fail with the given error.
    pub async fn set_next_error(&self, error: PublishError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get all recorded uploads.
    pub async fn recorded_publishes(&self) -> Vec<RecordedPublish> {
        self.publishes.read().await.clone()
    }

    /// Get the number of uploads attempted.
    pub async fn publish_count(&self) -> usize {
        self.publishes.read().await.len()
    }
}

#[async_trait]
impl AssetPublisher for MockPublisher {
    async fn publish(
        &self,
        path: &Path,
        destination_url: &str,
    ) -> Result<PublishResult, PublishError> {
        let body = tokio::fs::read(path).await?;
        self.publishes.write().await.push(RecordedPublish {
            destination_url: destination_url.to_string(),
            body,
        });

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        Ok(PublishResult {
            correlation_id: correlation_id(destination_url),
            success: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetcher_writes_body() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("music.m4a");
        let fetcher = MockFetcher::new();
        fetcher.set_body(b"abc".to_vec()).await;

        let written = fetcher.fetch("https://cdn/x.m4a", &dest).await.unwrap();

        assert_eq!(written, 3);
        assert_eq!(std::fs::read(&dest).unwrap(), b"abc");
        let fetches = fetcher.recorded_fetches().await;
        assert_eq!(fetches[0].dest_extension.as_deref(), Some(".m4a"));
    }

    #[tokio::test]
    async fn test_fetcher_leaves_partial_file_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("music.mp3");
        let fetcher = MockFetcher::new();
        fetcher.set_partial_on_error(true).await;
        fetcher
            .set_next_error(FetchError::Status { status: 502 })
            .await;

        tokio_test::assert_err!(fetcher.fetch("https://cdn/x.mp3", &dest).await);
        assert_eq!(std::fs::read(&dest).unwrap(), PARTIAL_BYTES);
    }

    #[tokio::test]
    async fn test_publisher_records_body_and_derives_id() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.mp4");
        std::fs::write(&file, b"payload").unwrap();
        let publisher = MockPublisher::new();

        let result = publisher
            .publish(&file, "https://store.example.com/bucket/asset-7?sig=1")
            .await
            .unwrap();

        assert_eq!(result.correlation_id, "asset-7");
        assert_eq!(publisher.recorded_publishes().await[0].body, b"payload");
    }

    #[tokio::test]
    async fn test_publisher_error_injection() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.mp4");
        std::fs::write(&file, b"payload").unwrap();
        let publisher = MockPublisher::new();
        publisher
            .set_next_error(PublishError::Status { status: 500 })
            .await;

        let err = publisher.publish(&file, "https://x/y").await.unwrap_err();
        assert!(matches!(err, PublishError::Status { status: 500 }));
        assert_eq!(publisher.publish_count().await, 1);
    }
}
