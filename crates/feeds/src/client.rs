//! HTTP plumbing shared by the exchange fetchers.
//!
//! Exchange notice boards are served to browsers, so requests carry
//! browser-like headers. Every request is bounded by the client timeout.

use crate::FeedError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Desktop browser user agent sent to exchange boards.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Default number of announcements kept per poll.
pub const DEFAULT_MAX_ANNOUNCEMENTS: usize = 10;

/// Default per-request timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Response body the request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Json,
}

impl ContentKind {
    fn accept(self) -> &'static str {
        match self {
            ContentKind::Html => {
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
            }
            ContentKind::Json => "application/json, text/plain, */*",
        }
    }
}

/// Fetcher configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum announcements returned per poll.
    pub max_announcements: usize,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent header value.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_announcements: DEFAULT_MAX_ANNOUNCEMENTS,
            timeout: DEFAULT_FETCH_TIMEOUT,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

/// Build an HTTP client honouring the configured timeout.
pub fn build_client(config: &FetchConfig) -> Result<Client, FeedError> {
    Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.timeout)
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .build()
        .map_err(|e| FeedError::RequestFailed(e.to_string()))
}

/// Browser-like request headers for the given content kind.
pub fn browser_headers(user_agent: &str, kind: ContentKind) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(user_agent) {
        headers.insert(USER_AGENT, value);
    }
    headers.insert(ACCEPT, HeaderValue::from_static(kind.accept()));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("ko-KR,ko;q=0.8,en-US;q=0.5,en;q=0.3"),
    );
    headers
}

/// GET a URL and return its body.
///
/// Non-2xx statuses and blank bodies are errors.
pub async fn fetch_body(
    client: &Client,
    url: &str,
    user_agent: &str,
    kind: ContentKind,
) -> Result<String, FeedError> {
    let response = client
        .get(url)
        .headers(browser_headers(user_agent, kind))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        debug!(url = url, status = status.as_u16(), "Non-success status");
        return Err(FeedError::HttpStatus(status.as_u16()));
    }

    let body = response.text().await?;
    if body.trim().is_empty() {
        return Err(FeedError::EmptyBody);
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.max_announcements, 10);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_browser_headers() {
        let headers = browser_headers(BROWSER_USER_AGENT, ContentKind::Json);
        assert_eq!(
            headers.get(ACCEPT).unwrap(),
            "application/json, text/plain, */*"
        );
        assert!(headers
            .get(ACCEPT_LANGUAGE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("ko-KR"));
        assert!(headers.get(USER_AGENT).is_some());
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(&FetchConfig::default()).is_ok());
    }
}
