//! SQLite listing history.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use compact_str::CompactString;
use listing_core::{AnnouncementKey, Exchange, ListingEvent, StoredListing};
use listing_monitor::{ListingStore, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Corrupt listing row {id}: {reason}")]
    Corrupt { id: i64, reason: String },
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Sqlx(sqlx::Error::PoolTimedOut)
            | DbError::Sqlx(sqlx::Error::PoolClosed)
            | DbError::Sqlx(sqlx::Error::Io(_)) => StoreError::Unavailable(err.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

type ListingRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    bool,
    String,
);

const SELECT_LISTINGS: &str = "SELECT id, exchange, symbol, display_name, market_id, listed_at, announcement_id, source_title, source_url, is_from_announcement, created_at FROM listings";

/// SQLite-backed [`ListingStore`].
#[derive(Clone)]
pub struct ListingDatabase {
    pool: SqlitePool,
}

/// Every connection to `:memory:` opens its own database, so a memory pool
/// holds exactly one connection and never recycles it.
fn pool_options(database_url: &str) -> SqlitePoolOptions {
    if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    }
}

impl ListingDatabase {
    /// Connect to SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = pool_options(database_url).connect_with(options).await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), DbError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS listings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                exchange TEXT NOT NULL,
                symbol TEXT NOT NULL,
                display_name TEXT NOT NULL,
                market_id TEXT NOT NULL,
                listed_at TEXT NOT NULL,
                announcement_id TEXT NOT NULL UNIQUE,
                source_title TEXT NOT NULL,
                source_url TEXT NOT NULL,
                is_from_announcement INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                UNIQUE(exchange, market_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_listings_created ON listings(created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a listing. Uniqueness violations surface as `sqlx` database errors.
    pub async fn insert_listing(&self, listing: &ListingEvent) -> Result<StoredListing, DbError> {
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO listings (exchange, symbol, display_name, market_id, listed_at,
                announcement_id, source_title, source_url, is_from_announcement, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(listing.exchange.slug())
        .bind(listing.symbol.as_str())
        .bind(&listing.display_name)
        .bind(&listing.market_id)
        .bind(timestamp(&listing.listed_at))
        .bind(listing.source_announcement_key.as_str())
        .bind(&listing.source_title)
        .bind(&listing.source_url)
        .bind(listing.is_from_announcement)
        .bind(timestamp(&created_at))
        .execute(&self.pool)
        .await?;

        Ok(StoredListing {
            id: result.last_insert_rowid(),
            listing: listing.clone(),
            created_at,
        })
    }

    /// Every listing, newest first.
    pub async fn list_listings(&self) -> Result<Vec<StoredListing>, DbError> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "{} ORDER BY created_at DESC, id DESC",
            SELECT_LISTINGS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(listing_from_row).collect()
    }

    pub async fn count_listings(&self) -> Result<i64, DbError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM listings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl ListingStore for ListingDatabase {
    async fn create(&self, listing: &ListingEvent) -> Result<StoredListing, StoreError> {
        match self.insert_listing(listing).await {
            Ok(stored) => Ok(stored),
            Err(DbError::Sqlx(sqlx::Error::Database(e))) if e.is_unique_violation() => {
                Err(StoreError::Duplicate {
                    exchange: listing.exchange,
                    market_id: listing.market_id.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_all(&self) -> Result<Vec<StoredListing>, StoreError> {
        Ok(self.list_listings().await?)
    }
}

fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(id: i64, raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DbError::Corrupt {
            id,
            reason: format!("bad timestamp {:?}: {}", raw, e),
        })
}

fn listing_from_row(row: ListingRow) -> Result<StoredListing, DbError> {
    let (
        id,
        exchange,
        symbol,
        display_name,
        market_id,
        listed_at,
        announcement_id,
        source_title,
        source_url,
        is_from_announcement,
        created_at,
    ) = row;

    let exchange = Exchange::from_str(&exchange).map_err(|e| DbError::Corrupt {
        id,
        reason: e.to_string(),
    })?;

    Ok(StoredListing {
        id,
        listing: ListingEvent {
            exchange,
            symbol: CompactString::from(symbol),
            display_name,
            listed_at: parse_timestamp(id, &listed_at)?,
            market_id,
            source_announcement_key: AnnouncementKey::from_raw(announcement_id),
            source_title,
            source_url,
            is_from_announcement,
        },
        created_at: parse_timestamp(id, &created_at)?,
    })
}
