//! Listing persistence boundary.

use async_trait::async_trait;
use chrono::Utc;
use listing_core::{Exchange, ListingEvent, StoredListing};
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors returned by a [`ListingStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another run (or an earlier process) already recorded this listing.
    #[error("Listing already recorded: {exchange} {market_id}")]
    Duplicate { exchange: Exchange, market_id: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }
}

/// Durable record of detected listings.
///
/// Implementations must reject a second listing with the same
/// `(exchange, market_id)` or the same source announcement key with
/// [`StoreError::Duplicate`].
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn create(&self, listing: &ListingEvent) -> Result<StoredListing, StoreError>;

    /// Every stored listing, newest first.
    async fn list_all(&self) -> Result<Vec<StoredListing>, StoreError>;
}

/// Process-local store. History is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryListingStore {
    listings: RwLock<Vec<StoredListing>>,
}

impl InMemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.listings.read().await.len()
    }
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn create(&self, listing: &ListingEvent) -> Result<StoredListing, StoreError> {
        let mut listings = self.listings.write().await;

        let exists = listings.iter().any(|stored| {
            let s = &stored.listing;
            (s.exchange == listing.exchange && s.market_id == listing.market_id)
                || s.source_announcement_key == listing.source_announcement_key
        });
        if exists {
            return Err(StoreError::Duplicate {
                exchange: listing.exchange,
                market_id: listing.market_id.clone(),
            });
        }

        let stored = StoredListing {
            id: listings.len() as i64 + 1,
            listing: listing.clone(),
            created_at: Utc::now(),
        };
        listings.push(stored.clone());
        Ok(stored)
    }

    async fn list_all(&self) -> Result<Vec<StoredListing>, StoreError> {
        Ok(self.listings.read().await.iter().rev().cloned().collect())
    }
}
