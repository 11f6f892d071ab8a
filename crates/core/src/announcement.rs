//! Exchange announcements and their deduplication keys.

use crate::Exchange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A notice published on an exchange announcement board.
///
/// Re-fetched every poll cycle; only its [`AnnouncementKey`] outlives the cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Exchange that published the notice
    pub exchange: Exchange,
    /// Identifier assigned by the exchange (notice id, board sequence number)
    pub native_id: String,
    /// Notice title as shown on the board
    pub title: String,
    /// Publish time reported by the exchange
    pub published_at: DateTime<Utc>,
    /// Link to the notice
    pub source_url: String,
}

impl Announcement {
    pub fn new(
        exchange: Exchange,
        native_id: impl Into<String>,
        title: impl Into<String>,
        published_at: DateTime<Utc>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            exchange,
            native_id: native_id.into(),
            title: title.into(),
            published_at,
            source_url: source_url.into(),
        }
    }

    /// Deduplication key for this notice.
    pub fn key(&self) -> AnnouncementKey {
        AnnouncementKey::new(self.exchange, &self.native_id)
    }
}

/// Stable deduplication token: `<exchange>:<native id>` (e.g., `upbit:42`).
///
/// Two announcements with the same key are the same event, even if the title
/// changed between fetches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnouncementKey(String);

impl AnnouncementKey {
    pub fn new(exchange: Exchange, native_id: &str) -> Self {
        Self(format!("{}:{}", exchange.slug(), native_id.trim()))
    }

    /// Key for a listing detected from the exchange market list rather than a notice.
    pub fn for_market(exchange: Exchange, market_code: &str) -> Self {
        Self(format!("{}:market:{}", exchange.slug(), market_code))
    }

    /// Wrap a key loaded from storage.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exchange namespace of the key, if it is a known exchange.
    pub fn exchange(&self) -> Option<Exchange> {
        self.0.split_once(':').and_then(|(ns, _)| ns.parse().ok())
    }

    /// Part after the exchange namespace.
    pub fn native_id(&self) -> &str {
        self.0.split_once(':').map(|(_, id)| id).unwrap_or(&self.0)
    }
}

impl fmt::Display for AnnouncementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Announcement> for AnnouncementKey {
    fn from(announcement: &Announcement) -> Self {
        announcement.key()
    }
}
