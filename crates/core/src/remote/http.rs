//! reqwest-backed fetcher and publisher.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Url};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::debug;

use super::error::{FetchError, PublishError};
use super::traits::{AssetFetcher, AssetPublisher, PublishResult};
use crate::config::HttpConfig;

/// Extension used for downloaded music when the URL does not reveal one.
pub const DEFAULT_MUSIC_EXTENSION: &str = ".mp3";

/// HTTP client for music downloads and result uploads.
pub struct HttpAssetClient {
    fetch_client: Client,
    publish_client: Client,
    content_type: String,
}

impl HttpAssetClient {
    /// Create a new client with the timeouts from `config`.
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);

        let fetch_client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()?;

        let publish_client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(Duration::from_secs(config.publish_timeout_secs))
            .build()?;

        Ok(Self {
            fetch_client,
            publish_client,
            content_type: config.content_type.clone(),
        })
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetClient {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        let start = Instant::now();
        let response = self.fetch_client.get(parsed).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        if written == 0 {
            return Err(FetchError::EmptyBody);
        }

        debug!(
            bytes = written,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Music track downloaded"
        );
        Ok(written)
    }
}

#[async_trait]
impl AssetPublisher for HttpAssetClient {
    async fn publish(
        &self,
        path: &Path,
        destination_url: &str,
    ) -> Result<PublishResult, PublishError> {
        let file = tokio::fs::File::open(path).await?;
        let size = file.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        let start = Instant::now();
        let response = self
            .publish_client
            .put(destination_url)
            .header(CONTENT_TYPE, self.content_type.as_str())
            .header(CONTENT_LENGTH, size)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Status {
                status: status.as_u16(),
            });
        }

        debug!(
            bytes = size,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Upload accepted"
        );

        Ok(PublishResult {
            correlation_id: correlation_id(destination_url),
            success: true,
        })
    }
}

/// Last path segment of `url` with the query string discarded.
///
/// Malformed URLs yield an empty identifier.
pub fn correlation_id(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.path_segments().and_then(|s| s.last().map(str::to_string)))
        .unwrap_or_default()
}

/// File extension (with leading dot) for a music URL's path.
///
/// Falls back to [`DEFAULT_MUSIC_EXTENSION`] when the URL is unparseable or
/// its path has no plain alphanumeric extension.
pub fn music_extension(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return DEFAULT_MUSIC_EXTENSION.to_string();
    };

    Path::new(parsed.path())
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e))
        .unwrap_or_else(|| DEFAULT_MUSIC_EXTENSION.to_string())
}
