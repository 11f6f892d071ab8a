//! Exchange identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Exchange whose announcement board is monitored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Upbit,
    Bithumb,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown exchange: {0}")]
pub struct UnknownExchange(pub String);

impl Exchange {
    /// Display name (e.g., "Upbit").
    pub fn as_str(self) -> &'static str {
        match self {
            Exchange::Upbit => "Upbit",
            Exchange::Bithumb => "Bithumb",
        }
    }

    /// Lowercase identifier used in announcement keys and storage (e.g., "upbit").
    pub fn slug(self) -> &'static str {
        match self {
            Exchange::Upbit => "upbit",
            Exchange::Bithumb => "bithumb",
        }
    }

    /// Korean display name used in notifications.
    pub fn korean_name(self) -> &'static str {
        match self {
            Exchange::Upbit => "업비트",
            Exchange::Bithumb => "빗썸",
        }
    }

    pub fn all() -> &'static [Exchange] {
        &[Exchange::Upbit, Exchange::Bithumb]
    }
}

impl FromStr for Exchange {
    type Err = UnknownExchange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upbit" => Ok(Exchange::Upbit),
            "bithumb" => Ok(Exchange::Bithumb),
            _ => Err(UnknownExchange(s.to_string())),
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
