//! Core data types for the listing monitor.

pub mod announcement;
pub mod exchange;
pub mod listing;
pub mod market;
pub mod quote_currency;

pub use announcement::*;
pub use exchange::*;
pub use listing::*;
pub use market::*;
pub use quote_currency::*;
