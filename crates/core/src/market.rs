//! Exchange market-list entries used for new-market detection.

use crate::{Exchange, QuoteCurrency};
use serde::{Deserialize, Serialize};

/// A tradable market reported by an exchange market list (e.g., `KRW-CYBER`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketInfo {
    pub exchange: Exchange,
    /// Exchange market code (e.g., "KRW-CYBER")
    pub market_code: String,
    /// Base asset (e.g., "CYBER")
    pub base: String,
    pub quote: QuoteCurrency,
    pub korean_name: Option<String>,
    pub english_name: Option<String>,
}

impl MarketInfo {
    /// Split a `<QUOTE>-<BASE>` market code. Returns None for unknown quotes.
    pub fn parse_code(code: &str) -> Option<(QuoteCurrency, &str)> {
        let (quote, base) = code.split_once('-')?;
        if base.is_empty() {
            return None;
        }
        Some((QuoteCurrency::from_symbol(quote)?, base))
    }

    /// Name to show for the listing: Korean name, then English, then the base symbol.
    pub fn display_name(&self) -> &str {
        self.korean_name
            .as_deref()
            .or(self.english_name.as_deref())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.base)
    }
}
