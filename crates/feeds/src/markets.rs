//! Exchange market lists, used to spot markets opened without a notice.

use crate::client::{browser_headers, build_client, fetch_body, ContentKind, FetchConfig};
use crate::FeedError;
use async_trait::async_trait;
use listing_core::{Exchange, MarketInfo, QuoteCurrency};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

pub const UPBIT_MARKETS_URL: &str = "https://api.upbit.com/v1/market/all?isDetails=true";
pub const BITHUMB_TICKERS_URL: &str = "https://api.bithumb.com/public/ticker/all_krw";

/// Bithumb's success status code.
const BITHUMB_STATUS_OK: &str = "0000";

/// Source of the full market list of one exchange.
#[async_trait]
pub trait MarketSource: Send + Sync {
    fn exchange(&self) -> Exchange;

    /// Fetch every currently listed market.
    async fn fetch_markets(&self) -> Result<Vec<MarketInfo>, FeedError>;
}

#[derive(Debug, Deserialize)]
struct UpbitMarket {
    market: String,
    #[serde(default)]
    korean_name: Option<String>,
    #[serde(default)]
    english_name: Option<String>,
}

/// Upbit KRW market list.
pub struct UpbitMarketSource {
    client: Client,
    user_agent: String,
    url: String,
}

impl UpbitMarketSource {
    pub fn new(config: &FetchConfig) -> Result<Self, FeedError> {
        Ok(Self {
            client: build_client(config)?,
            user_agent: config.user_agent.clone(),
            url: UPBIT_MARKETS_URL.to_string(),
        })
    }
}

#[async_trait]
impl MarketSource for UpbitMarketSource {
    fn exchange(&self) -> Exchange {
        Exchange::Upbit
    }

    async fn fetch_markets(&self) -> Result<Vec<MarketInfo>, FeedError> {
        let response = self
            .client
            .get(&self.url)
            .headers(browser_headers(&self.user_agent, ContentKind::Json))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::HttpStatus(status.as_u16()));
        }

        let resp: Vec<UpbitMarket> = response.json().await?;
        let markets = krw_markets(resp);

        debug!("Upbit: fetched {} KRW markets", markets.len());
        Ok(markets)
    }
}

fn krw_markets(resp: Vec<UpbitMarket>) -> Vec<MarketInfo> {
    resp.into_iter()
        .filter_map(|m| {
            let (quote, base) = MarketInfo::parse_code(&m.market)?;
            if quote != QuoteCurrency::KRW {
                return None;
            }
            Some(MarketInfo {
                exchange: Exchange::Upbit,
                base: base.to_string(),
                quote,
                korean_name: m.korean_name,
                english_name: m.english_name,
                market_code: m.market,
            })
        })
        .collect()
}

/// Bithumb KRW market list, read from the all-tickers endpoint.
pub struct BithumbMarketSource {
    client: Client,
    config: FetchConfig,
    url: String,
}

impl BithumbMarketSource {
    pub fn new(config: &FetchConfig) -> Result<Self, FeedError> {
        Ok(Self {
            client: build_client(config)?,
            config: config.clone(),
            url: BITHUMB_TICKERS_URL.to_string(),
        })
    }
}

#[async_trait]
impl MarketSource for BithumbMarketSource {
    fn exchange(&self) -> Exchange {
        Exchange::Bithumb
    }

    async fn fetch_markets(&self) -> Result<Vec<MarketInfo>, FeedError> {
        let body = fetch_body(
            &self.client,
            &self.url,
            &self.config.user_agent,
            ContentKind::Json,
        )
        .await?;

        let json: Value = serde_json::from_str(&body)?;
        let markets = bithumb_krw_markets(&json)?;

        debug!("Bithumb: fetched {} KRW markets", markets.len());
        Ok(markets)
    }
}

/// Turn the ticker map into markets. Codes are written `KRW-<SYMBOL>` so they
/// match the market ids built from announcements.
fn bithumb_krw_markets(json: &Value) -> Result<Vec<MarketInfo>, FeedError> {
    let status = json.get("status").and_then(Value::as_str).unwrap_or_default();
    if status != BITHUMB_STATUS_OK {
        let message = json
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(FeedError::ParseError(format!(
            "Bithumb status {}: {}",
            status, message
        )));
    }

    let tickers = json
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| FeedError::ParseError("Bithumb tickers missing data".to_string()))?;

    Ok(tickers
        .iter()
        // "date" sits next to the tickers
        .filter(|(symbol, ticker)| symbol.as_str() != "date" && ticker.is_object())
        .map(|(symbol, _)| {
            let base = symbol.trim().to_uppercase();
            MarketInfo {
                exchange: Exchange::Bithumb,
                market_code: QuoteCurrency::KRW.market_id(&base),
                base,
                quote: QuoteCurrency::KRW,
                korean_name: None,
                english_name: None,
            }
        })
        .collect())
}
