//! Remote asset transfer: music download and result upload.

mod error;
mod http;
mod traits;

pub use error::{FetchError, PublishError};
pub use http::{correlation_id, music_extension, HttpAssetClient, DEFAULT_MUSIC_EXTENSION};
pub use traits::{AssetFetcher, AssetPublisher, PublishResult};
