//! Record of announcements already acted upon.
//!
//! Keys only ever move from unknown to known. A key is marked after the
//! listing was handed to the store, never before, so a failed hand-off is
//! retried on the next cycle.

use dashmap::DashSet;
use listing_core::AnnouncementKey;

/// Concurrent set of processed announcement keys.
///
/// Overlapping pipeline runs coordinate through [`try_claim`](Self::try_claim):
/// while one run holds the claim for a key, every other run skips it.
#[derive(Debug, Default)]
pub struct AnnouncementLedger {
    known: DashSet<AnnouncementKey>,
    in_flight: DashSet<AnnouncementKey>,
}

impl AnnouncementLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_known(&self, key: &AnnouncementKey) -> bool {
        self.known.contains(key)
    }

    /// Mark a key as processed. Marking a known key is a no-op.
    pub fn mark_known(&self, key: AnnouncementKey) {
        self.known.insert(key);
    }

    /// Bulk-load keys from persisted history. Returns how many were new.
    pub fn seed<I>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = AnnouncementKey>,
    {
        keys.into_iter().filter(|key| self.known.insert(key.clone())).count()
    }

    /// Reserve an unknown key for processing.
    ///
    /// Returns None if the key is already known or another run holds it.
    /// Dropping the claim without marking releases the key for retry.
    pub fn try_claim(&self, key: &AnnouncementKey) -> Option<LedgerClaim<'_>> {
        if self.is_known(key) || !self.in_flight.insert(key.clone()) {
            return None;
        }

        // The previous holder may have marked and released in between.
        if self.is_known(key) {
            self.in_flight.remove(key);
            return None;
        }

        Some(LedgerClaim {
            ledger: self,
            key: key.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

/// Exclusive right to process one key, released on drop.
#[derive(Debug)]
pub struct LedgerClaim<'a> {
    ledger: &'a AnnouncementLedger,
    key: AnnouncementKey,
}

impl LedgerClaim<'_> {
    pub fn key(&self) -> &AnnouncementKey {
        &self.key
    }

    /// Mark the key known, then release the claim.
    pub fn mark_known(self) {
        self.ledger.mark_known(self.key.clone());
    }
}

impl Drop for LedgerClaim<'_> {
    fn drop(&mut self) {
        self.ledger.in_flight.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listing_core::Exchange;
    use std::sync::Arc;

    fn key(id: &str) -> AnnouncementKey {
        AnnouncementKey::new(Exchange::Upbit, id)
    }

    #[test]
    fn test_mark_known_is_idempotent() {
        let ledger = AnnouncementLedger::new();
        assert!(!ledger.is_known(&key("1")));

        ledger.mark_known(key("1"));
        ledger.mark_known(key("1"));
        assert!(ledger.is_known(&key("1")));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_keys_are_namespaced() {
        let ledger = AnnouncementLedger::new();
        ledger.mark_known(key("42"));
        assert!(!ledger.is_known(&AnnouncementKey::new(Exchange::Bithumb, "42")));
    }

    #[test]
    fn test_seed() {
        let ledger = AnnouncementLedger::new();
        ledger.mark_known(key("1"));
        let added = ledger.seed(vec![key("1"), key("2"), key("3")]);
        assert_eq!(added, 2);
        assert_eq!(ledger.len(), 3);
        assert!(ledger.is_known(&key("3")));
    }

    #[test]
    fn test_claim_excludes_other_runs() {
        let ledger = AnnouncementLedger::new();
        let claim = ledger.try_claim(&key("7")).unwrap();
        assert_eq!(claim.key(), &key("7"));
        assert!(ledger.try_claim(&key("7")).is_none());
        assert_eq!(ledger.in_flight(), 1);

        claim.mark_known();
        assert!(ledger.is_known(&key("7")));
        assert_eq!(ledger.in_flight(), 0);
        assert!(ledger.try_claim(&key("7")).is_none());
    }

    #[test]
    fn test_dropped_claim_allows_retry() {
        let ledger = AnnouncementLedger::new();
        {
            let _claim = ledger.try_claim(&key("8")).unwrap();
        }
        assert!(!ledger.is_known(&key("8")));
        assert!(ledger.try_claim(&key("8")).is_some());
    }

    #[test]
    fn test_concurrent_claims_single_winner() {
        let ledger = Arc::new(AnnouncementLedger::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                std::thread::spawn(move || match ledger.try_claim(&key("9")) {
                    Some(claim) => {
                        claim.mark_known();
                        1
                    }
                    None => 0,
                })
            })
            .collect();

        let winners: i32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(winners, 1);
        assert!(ledger.is_known(&key("9")));
    }
}
