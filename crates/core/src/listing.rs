//! Listing records produced by the monitor.

use crate::{Announcement, AnnouncementKey, Exchange, MarketInfo, QuoteCurrency};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Coin identified in a listing announcement title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedCoin {
    /// Uppercase ticker, 2-10 alphanumeric characters, never a reserved quote symbol
    pub symbol: CompactString,
    /// Name preceding the parenthesised symbol, trimmed
    pub display_name: Option<String>,
    /// Market named right after the symbol, when the title carries one
    pub quote: Option<QuoteCurrency>,
}

impl ExtractedCoin {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: CompactString::new(symbol),
            display_name: None,
            quote: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_quote(mut self, quote: QuoteCurrency) -> Self {
        self.quote = Some(quote);
        self
    }

    /// Quote the listing is recorded under (KRW unless the title says otherwise).
    pub fn market_quote(&self) -> QuoteCurrency {
        self.quote.unwrap_or_default()
    }

    pub fn market_id(&self) -> String {
        self.market_quote().market_id(&self.symbol)
    }
}

/// A newly observed listing, handed to the store and the notifier.
///
/// Created once per qualifying announcement and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEvent {
    pub exchange: Exchange,
    pub symbol: CompactString,
    /// Coin name, or the symbol when the source had no name
    pub display_name: String,
    /// Exchange-reported publish time of the source announcement
    pub listed_at: DateTime<Utc>,
    /// Market identifier such as `KRW-CYBER`
    pub market_id: String,
    pub source_announcement_key: AnnouncementKey,
    pub source_title: String,
    pub source_url: String,
    /// False for listings detected from the exchange market list
    pub is_from_announcement: bool,
}

impl ListingEvent {
    /// Build the event for a listing announcement.
    pub fn from_announcement(announcement: &Announcement, coin: &ExtractedCoin) -> Self {
        let display_name = coin
            .display_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| coin.symbol.to_string());

        Self {
            exchange: announcement.exchange,
            symbol: coin.symbol.clone(),
            display_name,
            listed_at: announcement.published_at,
            market_id: coin.market_id(),
            source_announcement_key: announcement.key(),
            source_title: announcement.title.clone(),
            source_url: announcement.source_url.clone(),
            is_from_announcement: true,
        }
    }

    /// Build the event for a market that appeared in the exchange market list.
    pub fn from_new_market(market: &MarketInfo, detected_at: DateTime<Utc>) -> Self {
        let symbol = CompactString::new(&market.base);
        Self {
            exchange: market.exchange,
            display_name: market.display_name().to_string(),
            listed_at: detected_at,
            market_id: market.market_code.clone(),
            source_announcement_key: AnnouncementKey::for_market(
                market.exchange,
                &market.market_code,
            ),
            source_title: format!(
                "{}({}) {} 마켓 디지털 자산 추가",
                market.display_name(),
                symbol,
                market.quote
            ),
            source_url: match market.exchange {
                Exchange::Upbit => format!(
                    "https://upbit.com/exchange?code=CRIX.UPBIT.{}",
                    market.market_code
                ),
                Exchange::Bithumb => format!(
                    "https://www.bithumb.com/react/trade/order/{}",
                    market.base
                ),
            },
            symbol,
            is_from_announcement: false,
        }
    }
}

/// A listing as recorded by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredListing {
    /// Store-assigned identifier
    pub id: i64,
    pub listing: ListingEvent,
    pub created_at: DateTime<Utc>,
}

impl StoredListing {
    pub fn announcement_key(&self) -> &AnnouncementKey {
        &self.listing.source_announcement_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn announcement() -> Announcement {
        Announcement::new(
            Exchange::Bithumb,
            "1234",
            "스테이더(SD) 원화 마켓 추가",
            Utc.with_ymd_and_hms(2024, 3, 2, 1, 0, 0).unwrap(),
            "https://feed.bithumb.com/notice/1234",
        )
    }

    #[test]
    fn test_extracted_coin_defaults_to_krw() {
        let coin = ExtractedCoin::new("SD");
        assert_eq!(coin.market_quote(), QuoteCurrency::KRW);
        assert_eq!(coin.market_id(), "KRW-SD");

        let coin = ExtractedCoin::new("SD").with_quote(QuoteCurrency::BTC);
        assert_eq!(coin.market_id(), "BTC-SD");
    }

    #[test]
    fn test_event_from_announcement() {
        let ann = announcement();
        let coin = ExtractedCoin::new("SD").with_name("스테이더");
        let event = ListingEvent::from_announcement(&ann, &coin);

        assert_eq!(event.exchange, Exchange::Bithumb);
        assert_eq!(event.symbol, "SD");
        assert_eq!(event.display_name, "스테이더");
        assert_eq!(event.market_id, "KRW-SD");
        assert_eq!(event.listed_at, ann.published_at);
        assert_eq!(event.source_announcement_key.as_str(), "bithumb:1234");
        assert_eq!(event.source_title, ann.title);
        assert!(event.is_from_announcement);
    }

    #[test]
    fn test_event_name_falls_back_to_symbol() {
        let event = ListingEvent::from_announcement(&announcement(), &ExtractedCoin::new("SD"));
        assert_eq!(event.display_name, "SD");
    }

    #[test]
    fn test_event_from_new_market() {
        let market = MarketInfo {
            exchange: Exchange::Upbit,
            market_code: "KRW-CYBER".to_string(),
            base: "CYBER".to_string(),
            quote: QuoteCurrency::KRW,
            korean_name: Some("사이버".to_string()),
            english_name: None,
        };
        let detected_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let event = ListingEvent::from_new_market(&market, detected_at);

        assert_eq!(event.market_id, "KRW-CYBER");
        assert_eq!(event.symbol, "CYBER");
        assert_eq!(event.listed_at, detected_at);
        assert_eq!(event.source_announcement_key.as_str(), "upbit:market:KRW-CYBER");
        assert!(!event.is_from_announcement);
    }
}
