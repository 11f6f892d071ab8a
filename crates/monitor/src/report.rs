//! Per-cycle counters.

use listing_core::Exchange;
use serde::Serialize;
use std::fmt;

/// What happened to one announcement (or new market) during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Already processed
    Known,
    /// Claimed by an overlapping run that has not finished with it
    InFlight,
    NotListing,
    /// Classified as a listing but no valid symbol was found
    Unparsed,
    /// Persisted; `notified` is false when the notifier failed
    Persisted { notified: bool },
    /// The store already had it
    Duplicate,
    /// The store failed; the key stays unknown and is retried next cycle
    StoreFailed,
}

/// Counters for one exchange source in one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExchangeReport {
    pub exchange: Option<Exchange>,
    pub fetched: usize,
    pub known: usize,
    pub in_flight: usize,
    pub not_listing: usize,
    pub unparsed: usize,
    pub persisted: usize,
    pub duplicates: usize,
    pub store_failures: usize,
    pub notify_failures: usize,
    /// The feed could not be read this cycle
    pub unavailable: bool,
    /// Why the feed could not be read
    pub unavailable_reason: Option<String>,
}

impl ExchangeReport {
    pub fn new(exchange: Exchange) -> Self {
        Self {
            exchange: Some(exchange),
            ..Default::default()
        }
    }

    pub fn mark_unavailable(&mut self, reason: impl Into<String>) {
        self.unavailable = true;
        self.unavailable_reason = Some(reason.into());
    }

    pub fn record(&mut self, outcome: ProcessOutcome) {
        match outcome {
            ProcessOutcome::Known => self.known += 1,
            ProcessOutcome::InFlight => self.in_flight += 1,
            ProcessOutcome::NotListing => self.not_listing += 1,
            ProcessOutcome::Unparsed => self.unparsed += 1,
            ProcessOutcome::Persisted { notified } => {
                self.persisted += 1;
                if !notified {
                    self.notify_failures += 1;
                }
            }
            ProcessOutcome::Duplicate => self.duplicates += 1,
            ProcessOutcome::StoreFailed => self.store_failures += 1,
        }
    }

    fn merge(&mut self, other: &ExchangeReport) {
        self.fetched += other.fetched;
        self.known += other.known;
        self.in_flight += other.in_flight;
        self.not_listing += other.not_listing;
        self.unparsed += other.unparsed;
        self.persisted += other.persisted;
        self.duplicates += other.duplicates;
        self.store_failures += other.store_failures;
        self.notify_failures += other.notify_failures;
        self.unavailable |= other.unavailable;
        if self.unavailable_reason.is_none() {
            self.unavailable_reason = other.unavailable_reason.clone();
        }
    }
}

/// Result of one full cycle across all exchanges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// One entry per announcement feed, in configuration order
    pub announcements: Vec<ExchangeReport>,
    /// One entry per watched market list
    pub new_markets: Vec<ExchangeReport>,
}

impl CycleReport {
    /// Sum of every source.
    pub fn totals(&self) -> ExchangeReport {
        let mut total = ExchangeReport::default();
        for report in self.announcements.iter().chain(&self.new_markets) {
            total.merge(report);
        }
        total
    }

    pub fn persisted(&self) -> usize {
        self.totals().persisted
    }

    pub fn unavailable_sources(&self) -> usize {
        self.announcements
            .iter()
            .chain(&self.new_markets)
            .filter(|r| r.unavailable)
            .count()
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.totals();
        write!(
            f,
            "fetched={} known={} in_flight={} not_listing={} unparsed={} persisted={} duplicates={} store_failures={} notify_failures={} unavailable_sources={}",
            t.fetched,
            t.known,
            t.in_flight,
            t.not_listing,
            t.unparsed,
            t.persisted,
            t.duplicates,
            t.store_failures,
            t.notify_failures,
            self.unavailable_sources()
        )
    }
}
