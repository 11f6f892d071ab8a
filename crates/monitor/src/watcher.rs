//! New-market detection from exchange market lists.
//!
//! Catches markets that open without a recognisable notice. The first
//! successful fetch only records the baseline.

use listing_core::MarketInfo;
use listing_feeds::{FeedError, MarketSource};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct MarketWatcher {
    source: Arc<dyn MarketSource>,
    /// None until the baseline is taken
    seen: Mutex<Option<HashSet<String>>>,
}

impl MarketWatcher {
    pub fn new(source: Arc<dyn MarketSource>) -> Self {
        Self {
            source,
            seen: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &Arc<dyn MarketSource> {
        &self.source
    }

    /// Fetch the market list and return up to `limit` markets not seen before,
    /// in exchange order. Returns nothing on the baseline fetch.
    pub async fn poll(&self, limit: usize) -> Result<Vec<MarketInfo>, FeedError> {
        let markets = self.source.fetch_markets().await?;
        let exchange = self.source.exchange();

        let mut guard = self.seen.lock().await;
        if guard.is_none() {
            info!(
                exchange = %exchange,
                markets = markets.len(),
                "Market baseline recorded"
            );
            *guard = Some(markets.into_iter().map(|m| m.market_code).collect());
            return Ok(Vec::new());
        }
        let seen = guard.get_or_insert_with(HashSet::new);

        let fresh: Vec<MarketInfo> = markets
            .into_iter()
            .filter(|m| !seen.contains(&m.market_code))
            .collect();

        if fresh.len() > limit {
            debug!(
                exchange = %exchange,
                new = fresh.len(),
                limit = limit,
                "Deferring new markets to later cycles"
            );
        }

        Ok(fresh.into_iter().take(limit).collect())
    }

    /// Stop reporting a market once it has been handled.
    pub async fn mark_seen(&self, market_code: &str) {
        if let Some(seen) = self.seen.lock().await.as_mut() {
            seen.insert(market_code.to_string());
        }
    }

    #[cfg(test)]
    async fn has_baseline(&self) -> bool {
        self.seen.lock().await.is_some()
    }
}
