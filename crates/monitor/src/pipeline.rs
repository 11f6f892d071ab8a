//! Listing detection pipeline.
//!
//! One cycle polls every exchange concurrently. Inside an exchange,
//! announcements are handled one at a time in feed order:
//!
//! ```text
//! FETCHED -> known? -> CLASSIFIED -> EXTRACTED -> PERSISTED -> NOTIFIED -> MARKED_KNOWN
//! ```
//!
//! Nothing in a cycle returns an error to the caller; failures are logged
//! and counted in the [`CycleReport`].

use crate::classifier::TitleClassifier;
use crate::extractor::SymbolExtractor;
use crate::ledger::AnnouncementLedger;
use crate::notify::{Notifier, NotifyError};
use crate::report::{CycleReport, ExchangeReport, ProcessOutcome};
use crate::store::{ListingStore, StoreError};
use crate::watcher::MarketWatcher;
use chrono::Utc;
use futures_util::future::join_all;
use listing_core::{Announcement, AnnouncementKey, ListingEvent};
use listing_feeds::{AnnouncementFetcher, FeedStatus, FetchOutcome, MarketSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Timeouts and limits for one cycle.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub fetch_timeout: Duration,
    pub store_timeout: Duration,
    pub notify_timeout: Duration,
    /// New markets handled per watcher per cycle; the rest wait for later cycles
    pub max_new_markets_per_cycle: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            store_timeout: Duration::from_secs(10),
            notify_timeout: Duration::from_secs(15),
            max_new_markets_per_cycle: 5,
        }
    }
}

/// Fetch, classify, extract, persist, notify.
///
/// Safe to run overlapping cycles on the same instance: the ledger claim
/// guarantees a key is handed to the store by at most one run at a time.
pub struct Pipeline {
    fetchers: Vec<Arc<dyn AnnouncementFetcher>>,
    watchers: Vec<MarketWatcher>,
    classifier: TitleClassifier,
    extractor: SymbolExtractor,
    ledger: AnnouncementLedger,
    store: Arc<dyn ListingStore>,
    notifier: Arc<dyn Notifier>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(store: Arc<dyn ListingStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            fetchers: Vec::new(),
            watchers: Vec::new(),
            classifier: TitleClassifier::default(),
            extractor: SymbolExtractor::default(),
            ledger: AnnouncementLedger::new(),
            store,
            notifier,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn AnnouncementFetcher>) -> Self {
        self.fetchers.push(fetcher);
        self
    }

    pub fn with_market_source(mut self, source: Arc<dyn MarketSource>) -> Self {
        self.watchers.push(MarketWatcher::new(source));
        self
    }

    pub fn with_classifier(mut self, classifier: TitleClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_extractor(mut self, extractor: SymbolExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn is_known(&self, key: &AnnouncementKey) -> bool {
        self.ledger.is_known(key)
    }

    pub fn known_count(&self) -> usize {
        self.ledger.len()
    }

    /// Load the keys of every stored listing into the ledger.
    pub async fn seed_from_store(&self) -> Result<usize, StoreError> {
        let stored = self.store.list_all().await?;
        let total = stored.len();
        let added = self
            .ledger
            .seed(stored.into_iter().map(|s| s.listing.source_announcement_key));
        info!(stored = total, seeded = added, "Ledger seeded from store");
        Ok(added)
    }

    /// Run one cycle over every exchange and market watcher.
    pub async fn run_cycle(&self) -> CycleReport {
        let announcements = join_all(self.fetchers.iter().map(|f| self.run_exchange(f.as_ref())));
        let new_markets = join_all(self.watchers.iter().map(|w| self.run_watcher(w)));
        let (announcements, new_markets) = tokio::join!(announcements, new_markets);

        CycleReport {
            announcements,
            new_markets,
        }
    }

    /// Poll one exchange and process its announcements in feed order.
    pub async fn run_exchange(&self, fetcher: &dyn AnnouncementFetcher) -> ExchangeReport {
        let exchange = fetcher.exchange();
        let mut report = ExchangeReport::new(exchange);

        let outcome = match timeout(self.config.fetch_timeout, fetcher.fetch()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    exchange = %exchange,
                    timeout = ?self.config.fetch_timeout,
                    "Announcement fetch timed out"
                );
                FetchOutcome::unavailable(exchange, "fetch timed out")
            }
        };

        if let FeedStatus::Unavailable(reason) = &outcome.status {
            report.mark_unavailable(reason.as_str());
        }
        report.fetched = outcome.announcements.len();

        for announcement in &outcome.announcements {
            let result = self.process_announcement(announcement).await;
            report.record(result);
        }

        debug!(exchange = %exchange, ?report, "Exchange cycle finished");
        report
    }

    /// Take one announcement through the state machine.
    pub async fn process_announcement(&self, announcement: &Announcement) -> ProcessOutcome {
        let key = announcement.key();

        if self.ledger.is_known(&key) {
            debug!(key = %key, "Skipping known announcement");
            return ProcessOutcome::Known;
        }

        let Some(keyword) = self.classifier.matched_keyword(&announcement.title) else {
            debug!(key = %key, title = %announcement.title, "Not a listing");
            return ProcessOutcome::NotListing;
        };

        let Some((coin, pattern)) = self.extractor.extract_with_kind(&announcement.title) else {
            warn!(
                key = %key,
                title = %announcement.title,
                "Could not extract symbol from listing title"
            );
            return ProcessOutcome::Unparsed;
        };
        debug!(key = %key, keyword, symbol = %coin.symbol, ?pattern, "Extracted symbol");

        let listing = ListingEvent::from_announcement(announcement, &coin);
        self.persist_and_notify(key, listing).await
    }

    async fn run_watcher(&self, watcher: &MarketWatcher) -> ExchangeReport {
        let exchange = watcher.source().exchange();
        let mut report = ExchangeReport::new(exchange);

        let polled = timeout(
            self.config.fetch_timeout,
            watcher.poll(self.config.max_new_markets_per_cycle),
        )
        .await;

        let markets = match polled {
            Ok(Ok(markets)) => markets,
            Ok(Err(e)) => {
                warn!(exchange = %exchange, error = %e, "Market list unavailable");
                report.mark_unavailable(e.to_string());
                return report;
            }
            Err(_) => {
                warn!(exchange = %exchange, "Market list fetch timed out");
                report.mark_unavailable("market list fetch timed out");
                return report;
            }
        };

        report.fetched = markets.len();

        for market in markets {
            let key = AnnouncementKey::for_market(exchange, &market.market_code);
            let outcome = if self.ledger.is_known(&key) {
                ProcessOutcome::Known
            } else {
                info!(exchange = %exchange, market = %market.market_code, "New market detected");
                let listing = ListingEvent::from_new_market(&market, Utc::now());
                self.persist_and_notify(key.clone(), listing).await
            };

            // Offered again next cycle until some run has recorded it
            if self.ledger.is_known(&key) {
                watcher.mark_seen(&market.market_code).await;
            }
            report.record(outcome);
        }

        report
    }

    /// Hand a listing to the store, notify on success, then mark the key.
    async fn persist_and_notify(&self, key: AnnouncementKey, listing: ListingEvent) -> ProcessOutcome {
        let Some(claim) = self.ledger.try_claim(&key) else {
            if self.ledger.is_known(&key) {
                return ProcessOutcome::Known;
            }
            debug!(key = %key, "Announcement claimed by another run");
            return ProcessOutcome::InFlight;
        };

        match timeout(self.config.store_timeout, self.store.create(&listing)).await {
            Ok(Ok(stored)) => {
                info!(
                    exchange = %listing.exchange,
                    symbol = %listing.symbol,
                    market = %listing.market_id,
                    key = %key,
                    id = stored.id,
                    "New listing recorded"
                );
            }
            Ok(Err(e)) if e.is_duplicate() => {
                info!(key = %key, market = %listing.market_id, "Listing already recorded");
                claim.mark_known();
                return ProcessOutcome::Duplicate;
            }
            Ok(Err(e)) => {
                error!(key = %key, error = %e, "Failed to persist listing");
                return ProcessOutcome::StoreFailed;
            }
            Err(_) => {
                error!(
                    key = %key,
                    timeout = ?self.config.store_timeout,
                    "Persisting listing timed out"
                );
                return ProcessOutcome::StoreFailed;
            }
        }

        let notified = match timeout(self.config.notify_timeout, self.notifier.notify_immediate(&listing)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!(key = %key, error = %e, "Listing notification failed");
                false
            }
            Err(_) => {
                let e = NotifyError::Timeout(self.config.notify_timeout);
                error!(key = %key, error = %e, "Listing notification failed");
                false
            }
        };

        claim.mark_known();
        ProcessOutcome::Persisted { notified }
    }
}
