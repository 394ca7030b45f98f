//! Error taxonomy for a processing request.

use thiserror::Error;

use crate::remote::{FetchError, PublishError};
use crate::transcoder::TranscodeError;

/// Bad or missing request parameters. Always the caller's fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing {0}")]
    MissingParameter(String),

    #[error("invalid {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl ValidationError {
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingParameter(name.into())
    }

    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Any failure that ends a processing request.
///
/// Duration probe failures are deliberately absent: they degrade to
/// "no trim applied" inside the processor.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("music download failed: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Scratch storage could not be prepared.
    #[error("scratch storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessingError {
    /// Whether the request itself was at fault (maps to HTTP 400).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Short stable label for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Fetch(_) => "fetch",
            Self::Transcode(_) => "transcode",
            Self::Publish(_) => "publish",
            Self::Io(_) => "io",
        }
    }
}
