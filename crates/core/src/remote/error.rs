//! Error types for remote asset transfer.

use thiserror::Error;

/// Music track download failures.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid music URL: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("download timed out")]
    Timeout,

    #[error("server responded with status {status}")]
    Status { status: u16 },

    #[error("response body was empty")]
    EmptyBody,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// Result upload failures.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("upload request failed: {0}")]
    Request(String),

    #[error("upload timed out")]
    Timeout,

    #[error("upload failed: {status}")]
    Status { status: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for PublishError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else {
            Self::Request(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_status_message_carries_code() {
        let err = PublishError::Status { status: 403 };
        assert_eq!(err.to_string(), "upload failed: 403");
    }

    #[test]
    fn test_fetch_status_message_carries_code() {
        let err = FetchError::Status { status: 404 };
        assert!(err.to_string().contains("404"));
    }
}
