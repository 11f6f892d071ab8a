//! Quote currency types for listing market identifiers.

use serde::{Deserialize, Serialize};

/// Local-language word Korean exchanges use for the KRW market ("원화").
pub const KRW_MARKET_WORD: &str = "원화";

/// Quote currency a new listing trades against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteCurrency {
    /// Korean Won
    KRW,
    /// Bitcoin market
    BTC,
    /// Tether
    USDT,
    /// Ether market
    ETH,
    /// US Dollar
    USD,
}

impl QuoteCurrency {
    /// Parse from a ticker (case-insensitive).
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "KRW" => Some(QuoteCurrency::KRW),
            "BTC" => Some(QuoteCurrency::BTC),
            "USDT" => Some(QuoteCurrency::USDT),
            "ETH" => Some(QuoteCurrency::ETH),
            "USD" => Some(QuoteCurrency::USD),
            _ => None,
        }
    }

    /// Parse a market token as it appears in announcement titles.
    /// Accepts tickers as well as the local KRW market word.
    pub fn from_market_token(token: &str) -> Option<Self> {
        if token.trim() == KRW_MARKET_WORD {
            return Some(QuoteCurrency::KRW);
        }
        Self::from_symbol(token)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuoteCurrency::KRW => "KRW",
            QuoteCurrency::BTC => "BTC",
            QuoteCurrency::USDT => "USDT",
            QuoteCurrency::ETH => "ETH",
            QuoteCurrency::USD => "USD",
        }
    }

    /// Build an exchange market id such as `KRW-CYBER`.
    pub fn market_id(self, symbol: &str) -> String {
        format!("{}-{}", self.as_str(), symbol)
    }
}

impl Default for QuoteCurrency {
    fn default() -> Self {
        QuoteCurrency::KRW
    }
}

impl std::fmt::Display for QuoteCurrency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
