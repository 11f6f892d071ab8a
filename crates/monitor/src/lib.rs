//! Listing announcement monitor.
//!
//! Turns raw exchange announcements into deduplicated [`ListingEvent`]s:
//!
//! - `classifier` - keyword test for "is this a listing notice"
//! - `extractor` - ordered title patterns yielding the coin symbol and name
//! - `ledger` - keys of announcements already acted upon
//! - `pipeline` - one polling cycle over every exchange
//! - `store` / `notify` - the persistence and notification boundaries
//!
//! [`ListingEvent`]: listing_core::ListingEvent

pub mod classifier;
pub mod extractor;
pub mod ledger;
pub mod notify;
pub mod pipeline;
pub mod report;
pub mod store;
pub mod watcher;

pub use classifier::*;
pub use extractor::*;
pub use ledger::*;
pub use notify::*;
pub use pipeline::*;
pub use report::*;
pub use store::*;
pub use watcher::*;
