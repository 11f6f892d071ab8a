//! Upbit notice board scraper.

use crate::client::{build_client, fetch_body, ContentKind, FetchConfig};
use crate::datetime::parse_exchange_datetime;
use crate::fetcher::AnnouncementFetcher;
use crate::FeedError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use listing_core::{Announcement, Exchange};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

pub const UPBIT_ORIGIN: &str = "https://upbit.com";
pub const UPBIT_NOTICE_URL: &str = "https://upbit.com/service_center/notice";

const ROW_SELECTOR: &str = "tr";
const TITLE_SELECTOR: &str = "td[class*=\"title\"] a[href], td.lAlign a[href]";
const DATE_SELECTOR: &str = "td[class*=\"date\"]";

/// Fetches the Upbit notice board.
pub struct UpbitNoticeFetcher {
    client: Client,
    config: FetchConfig,
    url: String,
}

impl UpbitNoticeFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FeedError> {
        Ok(Self {
            client: build_client(&config)?,
            config,
            url: UPBIT_NOTICE_URL.to_string(),
        })
    }

    /// Point the fetcher at a different board URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl AnnouncementFetcher for UpbitNoticeFetcher {
    fn exchange(&self) -> Exchange {
        Exchange::Upbit
    }

    fn max_announcements(&self) -> usize {
        self.config.max_announcements
    }

    async fn fetch_announcements(&self) -> Result<Vec<Announcement>, FeedError> {
        let body = fetch_body(
            &self.client,
            &self.url,
            &self.config.user_agent,
            ContentKind::Html,
        )
        .await?;

        parse_upbit_notices(&body, self.config.max_announcements, Utc::now())
    }
}

/// Parse notice rows out of the board HTML, in page order.
///
/// Rows without a link or a usable notice id are skipped. A row whose date
/// cell is missing or unreadable is stamped with `now`.
pub fn parse_upbit_notices(
    html: &str,
    limit: usize,
    now: DateTime<Utc>,
) -> Result<Vec<Announcement>, FeedError> {
    let document = Html::parse_document(html);
    let rows = selector(ROW_SELECTOR)?;
    let title = selector(TITLE_SELECTOR)?;
    let date = selector(DATE_SELECTOR)?;
    let origin = Url::parse(UPBIT_ORIGIN)?;

    let mut announcements = Vec::new();

    for row in document.select(&rows) {
        if announcements.len() >= limit {
            break;
        }

        let Some(link) = row.select(&title).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };

        let text = element_text(link);
        if text.is_empty() {
            continue;
        }

        let url = match origin.join(href.trim()) {
            Ok(url) => url,
            Err(e) => {
                debug!(href = href, error = %e, "Skipping notice with bad link");
                continue;
            }
        };

        let Some(native_id) = notice_id(&url) else {
            debug!(href = href, "Skipping notice without id");
            continue;
        };

        let raw_date = row.select(&date).next().map(element_text).unwrap_or_default();
        let published_at = match parse_exchange_datetime(&raw_date) {
            Some(ts) => ts,
            None => {
                warn!(
                    exchange = "upbit",
                    native_id = %native_id,
                    raw_date = %raw_date,
                    "Unreadable notice date, using fetch time"
                );
                now
            }
        };

        announcements.push(Announcement::new(
            Exchange::Upbit,
            native_id,
            text,
            published_at,
            url.to_string(),
        ));
    }

    Ok(announcements)
}

/// Notice id from `?id=<n>`, otherwise the last path segment.
fn notice_id(url: &Url) -> Option<String> {
    if let Some((_, id)) = url.query_pairs().find(|(k, _)| k == "id") {
        let id = id.trim();
        return (!id.is_empty()).then(|| id.to_string());
    }

    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .filter(|segment| *segment != "notice")
        .map(str::to_string)
}

fn selector(css: &str) -> Result<Selector, FeedError> {
    Selector::parse(css).map_err(|e| FeedError::ParseError(format!("selector {}: {}", css, e)))
}

/// Element text with runs of whitespace collapsed.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
