//! Telegram delivery.

use crate::message::telegram_message;
use listing_core::ListingEvent;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, Recipient};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
    #[error("Invalid chat id: {0}")]
    InvalidChatId(String),
}

/// Parse a numeric chat id or an `@channel` username.
pub fn parse_recipient(chat_id: &str) -> Result<Recipient, TelegramError> {
    let chat_id = chat_id.trim();
    if let Ok(id) = chat_id.parse::<i64>() {
        return Ok(Recipient::Id(ChatId(id)));
    }
    if chat_id.len() > 1 && chat_id.starts_with('@') {
        return Ok(Recipient::ChannelUsername(chat_id.to_string()));
    }
    Err(TelegramError::InvalidChatId(chat_id.to_string()))
}

/// Sends listing alerts to one chat.
pub struct TelegramChannel {
    bot: Bot,
    recipient: Recipient,
}

impl TelegramChannel {
    pub fn new(token: &str, chat_id: &str) -> Result<Self, TelegramError> {
        Ok(Self {
            bot: Bot::new(token),
            recipient: parse_recipient(chat_id)?,
        })
    }

    /// Send a pre-rendered HTML message.
    pub async fn send_html(&self, message: &str) -> Result<(), TelegramError> {
        self.bot
            .send_message(self.recipient.clone(), message)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    pub async fn send_listing(&self, listing: &ListingEvent) -> Result<(), TelegramError> {
        self.send_html(&telegram_message(listing)).await
    }
}
