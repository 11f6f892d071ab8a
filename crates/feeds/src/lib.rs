//! Exchange announcement feeds.
//!
//! Each exchange publishes notices in its own format. This crate turns them
//! into [`listing_core::Announcement`]s:
//!
//! - `upbit` - HTML notice board scraper
//! - `bithumb` - JSON notice feed reader
//! - `markets` - market lists for detecting markets opened without a notice
//! - `fetcher` - the [`AnnouncementFetcher`] trait the monitor polls

pub mod bithumb;
pub mod client;
pub mod datetime;
pub mod error;
pub mod fetcher;
pub mod markets;
pub mod upbit;

pub use bithumb::*;
pub use client::*;
pub use datetime::*;
pub use error::*;
pub use fetcher::*;
pub use markets::*;
pub use upbit::*;
