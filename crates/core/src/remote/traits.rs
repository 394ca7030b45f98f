//! Trait definitions for remote asset transfer.

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

use super::error::{FetchError, PublishError};

/// Outcome of publishing a processed clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishResult {
    /// Last path segment of the destination URL.
    pub correlation_id: String,
    pub success: bool,
}

/// Downloads a remote asset to local storage.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Streams `url` into `dest`, returning the number of bytes written.
    ///
    /// A partially written `dest` is left for the caller to remove.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}

/// Uploads a local file to a caller-supplied destination.
#[async_trait]
pub trait AssetPublisher: Send + Sync {
    /// Streams `path` as the body of a PUT to `destination_url`.
    async fn publish(
        &self,
        path: &Path,
        destination_url: &str,
    ) -> Result<PublishResult, PublishError>;
}
