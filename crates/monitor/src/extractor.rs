//! Coin symbol extraction from listing notice titles.
//!
//! Patterns are tried in order and the first one producing a valid symbol
//! wins. A pattern whose match fails the validity check counts as no match,
//! so the next pattern still gets a chance.

use lazy_static::lazy_static;
use listing_core::{ExtractedCoin, QuoteCurrency};
use regex::{Captures, Regex};
use std::collections::HashSet;

/// Quote currencies that are never accepted as the listed coin.
pub const DEFAULT_RESERVED_SYMBOLS: &[&str] = &["KRW", "BTC", "USDT", "ETH", "USD"];

const MIN_SYMBOL_LEN: usize = 2;
const MAX_SYMBOL_LEN: usize = 10;

lazy_static! {
    // 사이버(CYBER) KRW 마켓
    static ref NAME_SYMBOL_QUOTE: Regex = Regex::new(
        r"(?P<name>[^()]*)\((?P<symbol>[A-Za-z0-9]{2,10})\)\s*(?P<quote>KRW|BTC|USDT|ETH)"
    )
    .unwrap();
    // 스테이더(SD) 원화 마켓
    static ref NAME_SYMBOL_KRW_MARKET: Regex = Regex::new(
        r"(?P<name>[^()]*)\((?P<symbol>[A-Za-z0-9]{2,10})\)\s*(?P<quote>원화)"
    )
    .unwrap();
    // 사이버(CYBER) 거래지원 안내
    static ref NAME_SYMBOL: Regex =
        Regex::new(r"(?P<name>[^()]*)\((?P<symbol>[A-Za-z0-9]{2,10})\)").unwrap();
    // SD KRW 마켓 추가
    static ref LEADING_SYMBOL: Regex =
        Regex::new(r"^\s*(?P<symbol>[A-Za-z0-9]{2,10})\s*(?P<quote>KRW|BTC|USDT|ETH|원화)")
            .unwrap();
}

/// Shape of title a pattern recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// `<name>(<SYMBOL>) <QUOTE>`
    NameSymbolQuote,
    /// `<name>(<SYMBOL>) 원화`
    NameSymbolKrwMarket,
    /// `<name>(<SYMBOL>)`
    NameSymbol,
    /// `<SYMBOL> <QUOTE>` at the start of the title
    LeadingSymbol,
}

/// One entry of the ordered pattern list.
///
/// Named groups: `symbol` (required), `name` and `quote` (optional).
#[derive(Debug, Clone)]
pub struct TitlePattern {
    pub kind: PatternKind,
    regex: &'static Regex,
}

impl TitlePattern {
    pub fn new(kind: PatternKind, regex: &'static Regex) -> Self {
        Self { kind, regex }
    }

    /// Most specific first.
    pub fn defaults() -> Vec<TitlePattern> {
        vec![
            TitlePattern::new(PatternKind::NameSymbolQuote, &NAME_SYMBOL_QUOTE),
            TitlePattern::new(PatternKind::NameSymbolKrwMarket, &NAME_SYMBOL_KRW_MARKET),
            TitlePattern::new(PatternKind::NameSymbol, &NAME_SYMBOL),
            TitlePattern::new(PatternKind::LeadingSymbol, &LEADING_SYMBOL),
        ]
    }

    fn captures<'t>(&self, title: &'t str) -> Option<Captures<'t>> {
        self.regex.captures(title)
    }
}

/// Pulls `(symbol, name)` out of a title already classified as a listing.
#[derive(Debug, Clone)]
pub struct SymbolExtractor {
    patterns: Vec<TitlePattern>,
    reserved: HashSet<String>,
}

impl SymbolExtractor {
    pub fn new() -> Self {
        Self::with_reserved_symbols(DEFAULT_RESERVED_SYMBOLS)
    }

    /// Extractor rejecting exactly the given symbols (case-insensitive).
    pub fn with_reserved_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: TitlePattern::defaults(),
            reserved: symbols
                .into_iter()
                .map(|s| s.as_ref().trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Add a symbol to the reserved set.
    pub fn reserve(&mut self, symbol: &str) {
        self.reserved.insert(symbol.trim().to_uppercase());
    }

    pub fn is_reserved(&self, symbol: &str) -> bool {
        self.reserved.contains(&symbol.to_uppercase())
    }

    pub fn patterns(&self) -> &[TitlePattern] {
        &self.patterns
    }

    pub fn extract(&self, title: &str) -> Option<ExtractedCoin> {
        self.extract_with_kind(title).map(|(coin, _)| coin)
    }

    /// Like [`extract`](Self::extract), also reporting which pattern matched.
    pub fn extract_with_kind(&self, title: &str) -> Option<(ExtractedCoin, PatternKind)> {
        self.patterns.iter().find_map(|pattern| {
            let caps = pattern.captures(title)?;
            let symbol = caps.name("symbol")?.as_str().to_uppercase();
            if !self.is_valid_symbol(&symbol) {
                return None;
            }

            let mut coin = ExtractedCoin::new(&symbol);
            if let Some(name) = caps.name("name").and_then(|m| clean_name(m.as_str())) {
                coin = coin.with_name(name);
            }
            if let Some(quote) = caps
                .name("quote")
                .and_then(|m| QuoteCurrency::from_market_token(m.as_str()))
            {
                coin = coin.with_quote(quote);
            }
            Some((coin, pattern.kind))
        })
    }

    fn is_valid_symbol(&self, symbol: &str) -> bool {
        (MIN_SYMBOL_LEN..=MAX_SYMBOL_LEN).contains(&symbol.len())
            && symbol.chars().all(|c| c.is_ascii_alphanumeric())
            && symbol.chars().any(|c| c.is_ascii_alphabetic())
            && !self.reserved.contains(symbol)
    }
}

impl Default for SymbolExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Trim whitespace, list separators and leading `[tag]` prefixes.
fn clean_name(raw: &str) -> Option<String> {
    let mut name = raw.trim();
    while let Some(rest) = name.strip_prefix('[') {
        match rest.find(']') {
            Some(end) => name = rest[end + 1..].trim_start(),
            None => break,
        }
    }

    let name = name.trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '·' | ':' | '-'));
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(title: &str) -> Option<ExtractedCoin> {
        SymbolExtractor::new().extract(title)
    }

    #[test]
    fn test_name_symbol_quote() {
        let coin = extract("사이버(CYBER) KRW, USDT 마켓 디지털 자산 추가").unwrap();
        assert_eq!(coin.symbol, "CYBER");
        assert_eq!(coin.display_name.as_deref(), Some("사이버"));
        assert_eq!(coin.quote, Some(QuoteCurrency::KRW));
        assert_eq!(coin.market_id(), "KRW-CYBER");
    }

    #[test]
    fn test_btc_market() {
        let (coin, kind) = SymbolExtractor::new()
            .extract_with_kind("엔에스(NS) BTC 마켓 디지털 자산 추가")
            .unwrap();
        assert_eq!(kind, PatternKind::NameSymbolQuote);
        assert_eq!(coin.market_id(), "BTC-NS");
    }

    #[test]
    fn test_krw_market_word() {
        let (coin, kind) = SymbolExtractor::new()
            .extract_with_kind("스테이더(SD) 원화 마켓 추가")
            .unwrap();
        assert_eq!(kind, PatternKind::NameSymbolKrwMarket);
        assert_eq!(coin.symbol, "SD");
        assert_eq!(coin.display_name.as_deref(), Some("스테이더"));
        assert_eq!(coin.quote, Some(QuoteCurrency::KRW));
    }

    #[test]
    fn test_bare_parenthetical() {
        let (coin, kind) = SymbolExtractor::new()
            .extract_with_kind("[거래] 아이오넷(io) 거래지원 개시 안내")
            .unwrap();
        assert_eq!(kind, PatternKind::NameSymbol);
        assert_eq!(coin.symbol, "IO");
        assert_eq!(coin.display_name.as_deref(), Some("아이오넷"));
        assert_eq!(coin.quote, None);
        assert_eq!(coin.market_id(), "KRW-IO");
    }

    #[test]
    fn test_leading_symbol() {
        let (coin, kind) = SymbolExtractor::new()
            .extract_with_kind("SD KRW 마켓 디지털 자산 추가")
            .unwrap();
        assert_eq!(kind, PatternKind::LeadingSymbol);
        assert_eq!(coin.symbol, "SD");
        assert_eq!(coin.display_name, None);

        let coin = extract("CYBER 원화 마켓 추가").unwrap();
        assert_eq!(coin.symbol, "CYBER");
        assert_eq!(coin.quote, Some(QuoteCurrency::KRW));
    }

    #[test]
    fn test_leading_symbol_eth_and_lowercase() {
        let (coin, kind) = SymbolExtractor::new()
            .extract_with_kind("sd ETH 마켓 추가")
            .unwrap();
        assert_eq!(kind, PatternKind::LeadingSymbol);
        assert_eq!(coin.symbol, "SD");
        assert_eq!(coin.quote, Some(QuoteCurrency::ETH));
        assert_eq!(coin.market_id(), "ETH-SD");
    }

    #[test]
    fn test_reserved_only_title() {
        assert_eq!(extract("KRW 마켓 디지털 자산 추가"), None);
        assert_eq!(extract("비트코인(BTC) KRW 마켓 디지털 자산 추가"), None);
        assert_eq!(extract("USDT 마켓 디지털 자산 추가"), None);
    }

    #[test]
    fn test_rejected_candidate_falls_through() {
        // The quote pattern lands on (KRW); the bare pattern still finds CYBER.
        let (coin, kind) = SymbolExtractor::new()
            .extract_with_kind("사이버(CYBER) 거래지원 및 원화(KRW) BTC 마켓")
            .unwrap();
        assert_eq!(kind, PatternKind::NameSymbol);
        assert_eq!(coin.symbol, "CYBER");
        assert_eq!(coin.display_name.as_deref(), Some("사이버"));
    }

    #[test]
    fn test_invalid_symbols() {
        assert_eq!(extract("이벤트(2024) 마켓 추가"), None);
        assert_eq!(extract("공지 안내"), None);
        assert_eq!(extract("에이(A) KRW 마켓 추가"), None);
    }

    #[test]
    fn test_custom_reserved_symbols() {
        let mut extractor = SymbolExtractor::new();
        extractor.reserve("busd");
        assert!(extractor.is_reserved("BUSD"));
        assert_eq!(extractor.extract("바이낸스USD(BUSD) KRW 마켓 디지털 자산 추가"), None);

        let extractor = SymbolExtractor::with_reserved_symbols(["KRW"]);
        let coin = extractor.extract("이더리움(ETH) KRW 마켓 디지털 자산 추가").unwrap();
        assert_eq!(coin.symbol, "ETH");
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("  사이버 "), Some("사이버".to_string()));
        assert_eq!(clean_name("[마켓 추가] 사이버"), Some("사이버".to_string()));
        assert_eq!(clean_name(", 스테이더"), Some("스테이더".to_string()));
        assert_eq!(clean_name("  "), None);
    }

    #[test]
    fn test_patterns_are_ordered() {
        let kinds: Vec<_> = SymbolExtractor::new().patterns().iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PatternKind::NameSymbolQuote,
                PatternKind::NameSymbolKrwMarket,
                PatternKind::NameSymbol,
                PatternKind::LeadingSymbol,
            ]
        );
    }
}
