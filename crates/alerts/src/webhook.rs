//! Webhook delivery (Discord-compatible embeds).

use crate::message::webhook_payload;
use listing_core::ListingEvent;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Webhook returned HTTP {0}")]
    Status(u16),
}

pub struct WebhookChannel {
    client: Client,
    url: String,
    footer: String,
}

impl WebhookChannel {
    pub fn new(url: impl Into<String>, footer: impl Into<String>) -> Result<Self, WebhookError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            url: url.into(),
            footer: footer.into(),
        })
    }

    pub async fn send_listing(&self, listing: &ListingEvent) -> Result<(), WebhookError> {
        let response = self
            .client
            .post(&self.url)
            .json(&webhook_payload(listing, &self.footer))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::Status(status.as_u16()));
        }

        debug!(symbol = %listing.symbol, "Webhook notification sent");
        Ok(())
    }
}
