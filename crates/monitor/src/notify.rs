//! Notification boundary.

use async_trait::async_trait;
use listing_core::ListingEvent;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("{channel} notification failed: {reason}")]
    Channel { channel: String, reason: String },

    #[error("All {0} notification channels failed")]
    AllChannelsFailed(usize),

    #[error("Notification timed out after {0:?}")]
    Timeout(Duration),
}

impl NotifyError {
    pub fn channel(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        NotifyError::Channel {
            channel: channel.into(),
            reason: reason.into(),
        }
    }
}

/// Delivers a freshly persisted listing to whoever is listening.
///
/// Called at most once per listing; failures are never retried.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_immediate(&self, listing: &ListingEvent) -> Result<(), NotifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            NotifyError::channel("telegram", "chat not found").to_string(),
            "telegram notification failed: chat not found"
        );
        assert_eq!(
            NotifyError::AllChannelsFailed(2).to_string(),
            "All 2 notification channels failed"
        );
        assert_eq!(
            NotifyError::Timeout(Duration::from_secs(15)).to_string(),
            "Notification timed out after 15s"
        );
    }
}
