//! Error types for feed operations.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching or parsing an exchange feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Empty response body")]
    EmptyBody,
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            FeedError::HttpStatus(status.as_u16())
        } else if err.is_decode() {
            FeedError::ParseError(err.to_string())
        } else {
            FeedError::RequestFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::ParseError(err.to_string())
    }
}

impl From<url::ParseError> for FeedError {
    fn from(err: url::ParseError) -> Self {
        FeedError::ParseError(err.to_string())
    }
}

impl FeedError {
    /// Returns true if this error is transient and likely to succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            FeedError::RequestFailed(_) | FeedError::Timeout(_) | FeedError::EmptyBody => true,
            FeedError::HttpStatus(status) => *status == 429 || *status >= 500,
            FeedError::ParseError(_) => false,
        }
    }

    /// Returns a suggested retry delay for this error type, if applicable.
    pub fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            FeedError::HttpStatus(429) => Some(Duration::from_secs(60)),
            FeedError::HttpStatus(status) if *status >= 500 => Some(Duration::from_secs(10)),
            FeedError::RequestFailed(_) => Some(Duration::from_secs(5)),
            FeedError::Timeout(_) | FeedError::EmptyBody => Some(Duration::from_secs(2)),
            // Markup changes and client errors will not fix themselves
            FeedError::HttpStatus(_) | FeedError::ParseError(_) => None,
        }
    }
}
