//! Announcement fetcher abstraction.
//!
//! One implementation per exchange; the monitor only sees this trait.

use crate::FeedError;
use async_trait::async_trait;
use listing_core::{Announcement, Exchange};
use tracing::{debug, warn};

/// Whether the exchange feed could be read this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Available,
    /// The feed failed (transport, status, timeout, malformed body).
    Unavailable(String),
}

/// Result of one poll of an exchange feed. Never an error: failures degrade
/// to an empty list with [`FeedStatus::Unavailable`].
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub exchange: Exchange,
    /// Announcements in the exchange's own order
    pub announcements: Vec<Announcement>,
    pub status: FeedStatus,
}

impl FetchOutcome {
    pub fn available(exchange: Exchange, announcements: Vec<Announcement>) -> Self {
        Self {
            exchange,
            announcements,
            status: FeedStatus::Available,
        }
    }

    pub fn unavailable(exchange: Exchange, reason: impl Into<String>) -> Self {
        Self {
            exchange,
            announcements: Vec::new(),
            status: FeedStatus::Unavailable(reason.into()),
        }
    }
}

/// Source of raw announcements for one exchange.
#[async_trait]
pub trait AnnouncementFetcher: Send + Sync {
    /// Exchange served by this fetcher.
    fn exchange(&self) -> Exchange;

    /// Maximum announcements returned per poll.
    fn max_announcements(&self) -> usize;

    /// Fetch and parse the feed.
    async fn fetch_announcements(&self) -> Result<Vec<Announcement>, FeedError>;

    /// Poll the feed, swallowing every failure into an unavailable outcome.
    async fn fetch(&self) -> FetchOutcome {
        let exchange = self.exchange();
        match self.fetch_announcements().await {
            Ok(mut announcements) => {
                announcements.truncate(self.max_announcements());
                debug!(
                    exchange = %exchange,
                    count = announcements.len(),
                    "Fetched announcements"
                );
                FetchOutcome::available(exchange, announcements)
            }
            Err(e) => {
                warn!(
                    exchange = %exchange,
                    error = %e,
                    transient = e.is_transient(),
                    retry_in = ?e.suggested_retry_delay(),
                    "Announcement feed unavailable"
                );
                FetchOutcome::unavailable(exchange, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct StaticFetcher {
        result: fn() -> Result<Vec<Announcement>, FeedError>,
    }

    #[async_trait]
    impl AnnouncementFetcher for StaticFetcher {
        fn exchange(&self) -> Exchange {
            Exchange::Upbit
        }

        fn max_announcements(&self) -> usize {
            2
        }

        async fn fetch_announcements(&self) -> Result<Vec<Announcement>, FeedError> {
            (self.result)()
        }
    }

    fn three() -> Result<Vec<Announcement>, FeedError> {
        Ok((1..=3)
            .map(|i| {
                Announcement::new(Exchange::Upbit, i.to_string(), "공지", Utc::now(), "")
            })
            .collect())
    }

    fn failing() -> Result<Vec<Announcement>, FeedError> {
        Err(FeedError::HttpStatus(503))
    }

    #[tokio::test]
    async fn test_fetch_caps_and_preserves_order() {
        let outcome = StaticFetcher { result: three }.fetch().await;
        assert_eq!(outcome.status, FeedStatus::Available);
        let ids: Vec<_> = outcome
            .announcements
            .iter()
            .map(|a| a.native_id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_soft() {
        let outcome = StaticFetcher { result: failing }.fetch().await;
        assert_ne!(outcome.status, FeedStatus::Available);
        assert!(outcome.announcements.is_empty());
        assert_eq!(
            outcome.status,
            FeedStatus::Unavailable("HTTP status 503".to_string())
        );
    }
}
