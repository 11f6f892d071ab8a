//! Bithumb notice feed reader.

use crate::client::{build_client, fetch_body, ContentKind, FetchConfig};
use crate::datetime::{from_unix_millis, parse_exchange_datetime};
use crate::fetcher::AnnouncementFetcher;
use crate::FeedError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use listing_core::{Announcement, Exchange};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

pub const BITHUMB_NOTICE_URL: &str = "https://feed.bithumb.com/notice";

/// Fetches the Bithumb JSON notice feed.
pub struct BithumbNoticeFetcher {
    client: Client,
    config: FetchConfig,
    url: String,
}

impl BithumbNoticeFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FeedError> {
        Ok(Self {
            client: build_client(&config)?,
            config,
            url: BITHUMB_NOTICE_URL.to_string(),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl AnnouncementFetcher for BithumbNoticeFetcher {
    fn exchange(&self) -> Exchange {
        Exchange::Bithumb
    }

    fn max_announcements(&self) -> usize {
        self.config.max_announcements
    }

    async fn fetch_announcements(&self) -> Result<Vec<Announcement>, FeedError> {
        let body = fetch_body(
            &self.client,
            &self.url,
            &self.config.user_agent,
            ContentKind::Json,
        )
        .await?;

        let json: Value = serde_json::from_str(&body)?;
        parse_bithumb_notices(&json, self.config.max_announcements, Utc::now())
    }
}

/// Read notices from a feed body shaped `{"data": [...]}` or `{"data": {"list": [...]}}`.
///
/// Entries without a `seq` or title are dropped since they have no stable key.
pub fn parse_bithumb_notices(
    json: &Value,
    limit: usize,
    now: DateTime<Utc>,
) -> Result<Vec<Announcement>, FeedError> {
    let entries = json
        .get("data")
        .and_then(|data| data.as_array().or_else(|| data.get("list")?.as_array()))
        .ok_or_else(|| FeedError::ParseError("missing notice list".to_string()))?;

    let announcements = entries
        .iter()
        .filter_map(|entry| parse_entry(entry, now))
        .take(limit)
        .collect();

    Ok(announcements)
}

fn parse_entry(entry: &Value, now: DateTime<Utc>) -> Option<Announcement> {
    let seq = match entry.get("seq") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => {
            debug!(entry = %entry, "Skipping notice without seq");
            return None;
        }
    };

    let title = entry
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())?;

    let published_at = match entry.get("regDttm") {
        Some(Value::String(s)) => parse_exchange_datetime(s),
        Some(Value::Number(n)) => n.as_i64().and_then(from_unix_millis),
        _ => None,
    }
    .unwrap_or_else(|| {
        warn!(exchange = "bithumb", seq = %seq, "Unreadable notice date, using fetch time");
        now
    });

    let source_url = format!("{}/{}", BITHUMB_NOTICE_URL, seq);

    Some(Announcement::new(
        Exchange::Bithumb,
        seq,
        title,
        published_at,
        source_url,
    ))
}
