//! Email rendering. There is no mail transport; messages are logged.

use crate::message::{email_body, email_subject};
use listing_core::ListingEvent;
use tracing::info;

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub struct EmailChannel {
    address: String,
}

impl EmailChannel {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn render(&self, listing: &ListingEvent) -> EmailMessage {
        EmailMessage {
            to: self.address.clone(),
            subject: email_subject(listing),
            body: email_body(listing),
        }
    }

    pub fn send_listing(&self, listing: &ListingEvent) -> EmailMessage {
        let email = self.render(listing);
        info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "Email notification rendered"
        );
        email
    }
}
