//! Fan-out of listing alerts to every configured channel.

use crate::config::NotificationSettings;
use crate::email::EmailChannel;
use crate::telegram::{TelegramChannel, TelegramError};
use crate::webhook::{WebhookChannel, WebhookError};
use async_trait::async_trait;
use futures_util::future::join_all;
use listing_core::ListingEvent;
use listing_monitor::{Notifier, NotifyError};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Telegram error: {0}")]
    Telegram(#[from] TelegramError),
    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),
}

/// One delivery channel.
#[async_trait]
pub trait ListingChannel: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, listing: &ListingEvent) -> Result<(), NotifyError>;
}

#[async_trait]
impl ListingChannel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, listing: &ListingEvent) -> Result<(), NotifyError> {
        self.send_listing(listing)
            .await
            .map_err(|e| NotifyError::channel(self.name(), e.to_string()))
    }
}

#[async_trait]
impl ListingChannel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, listing: &ListingEvent) -> Result<(), NotifyError> {
        self.send_listing(listing)
            .await
            .map_err(|e| NotifyError::channel(self.name(), e.to_string()))
    }
}

#[async_trait]
impl ListingChannel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, listing: &ListingEvent) -> Result<(), NotifyError> {
        self.send_listing(listing);
        Ok(())
    }
}

/// Sends each listing to all channels concurrently.
///
/// Fails only when every channel failed; with no channels configured the
/// listing is just logged.
#[derive(Default)]
pub struct FanoutNotifier {
    channels: Vec<Box<dyn ListingChannel>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the channels that are active in `settings`.
    pub fn from_settings(settings: &NotificationSettings) -> Result<Self, NotifierError> {
        let mut notifier = Self::new();

        if settings.email_active() {
            if let Some(address) = &settings.email.address {
                notifier = notifier.with_channel(Box::new(EmailChannel::new(address.clone())));
            }
        }

        if settings.telegram_active() {
            if let (Some(token), Some(chat_id)) =
                (&settings.telegram.bot_token, &settings.telegram.chat_id)
            {
                notifier = notifier.with_channel(Box::new(TelegramChannel::new(token, chat_id)?));
            }
        }

        if settings.webhook_active() {
            if let Some(url) = &settings.webhook.url {
                notifier = notifier.with_channel(Box::new(WebhookChannel::new(
                    url.clone(),
                    settings.webhook.footer.clone(),
                )?));
            }
        }

        info!(channels = ?notifier.channel_names(), "Notification channels configured");
        Ok(notifier)
    }

    pub fn with_channel(mut self, channel: Box<dyn ListingChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    async fn notify_immediate(&self, listing: &ListingEvent) -> Result<(), NotifyError> {
        if self.channels.is_empty() {
            info!(
                exchange = %listing.exchange,
                symbol = %listing.symbol,
                market = %listing.market_id,
                "No notification channel configured"
            );
            return Ok(());
        }

        let results = join_all(self.channels.iter().map(|c| c.send(listing))).await;

        let mut failed = 0;
        for (channel, result) in self.channels.iter().zip(results) {
            match result {
                Ok(()) => debug!(channel = channel.name(), symbol = %listing.symbol, "Notification sent"),
                Err(e) => {
                    failed += 1;
                    error!(channel = channel.name(), error = %e, "Notification channel failed");
                }
            }
        }

        if failed == self.channels.len() {
            return Err(NotifyError::AllChannelsFailed(failed));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::tests::listing;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeChannel {
        name: &'static str,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ListingChannel for FakeChannel {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn send(&self, _listing: &ListingEvent) -> Result<(), NotifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(NotifyError::channel(self.name, "unreachable"));
            }
            Ok(())
        }
    }

    fn fake(name: &'static str, fail: bool, calls: &Arc<AtomicUsize>) -> Box<dyn ListingChannel> {
        Box::new(FakeChannel {
            name,
            fail,
            calls: calls.clone(),
        })
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_others() {
        let calls = Arc::new(AtomicUsize::new(0));
        let notifier = FanoutNotifier::new()
            .with_channel(fake("telegram", true, &calls))
            .with_channel(fake("webhook", false, &calls));

        assert!(notifier.notify_immediate(&listing()).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_all_channels_failed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let notifier = FanoutNotifier::new()
            .with_channel(fake("telegram", true, &calls))
            .with_channel(fake("webhook", true, &calls));

        let err = notifier.notify_immediate(&listing()).await.unwrap_err();
        assert!(matches!(err, NotifyError::AllChannelsFailed(2)));
    }

    #[tokio::test]
    async fn test_no_channels_is_ok() {
        assert!(FanoutNotifier::new().notify_immediate(&listing()).await.is_ok());
    }

    #[test]
    fn test_from_settings() {
        let mut settings = NotificationSettings::default();
        assert!(FanoutNotifier::from_settings(&settings)
            .unwrap()
            .channel_names()
            .is_empty());

        settings.email.address = Some("ops@example.com".to_string());
        settings.telegram.bot_token = Some("123:abc".to_string());
        settings.telegram.chat_id = Some("-100200".to_string());
        settings.webhook.url = Some("https://discord.com/api/webhooks/1/x".to_string());
        let notifier = FanoutNotifier::from_settings(&settings).unwrap();
        assert_eq!(notifier.channel_names(), vec!["email", "telegram", "webhook"]);

        settings.telegram.chat_id = Some("general".to_string());
        assert!(matches!(
            FanoutNotifier::from_settings(&settings),
            Err(NotifierError::Telegram(_))
        ));
    }
}
