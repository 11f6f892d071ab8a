//! Listing storage and alert delivery.
//!
//! This crate provides:
//! - SQLite-backed listing history (`ListingStore`)
//! - Telegram, webhook and email channels
//! - A fan-out `Notifier` over the configured channels

pub mod config;
pub mod db;
pub mod email;
pub mod message;
pub mod notifier;
pub mod telegram;
pub mod webhook;

pub use config::{EmailSettings, NotificationSettings, TelegramSettings, WebhookSettings};
pub use db::{DbError, ListingDatabase};
pub use email::{EmailChannel, EmailMessage};
pub use notifier::{FanoutNotifier, ListingChannel, NotifierError};
pub use telegram::{TelegramChannel, TelegramError};
pub use webhook::{WebhookChannel, WebhookError};
