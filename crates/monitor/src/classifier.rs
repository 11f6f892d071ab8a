//! Listing notice classification.

/// Keywords marking a notice as a new listing, in the order they are checked.
pub const DEFAULT_LISTING_KEYWORDS: &[&str] = &[
    "마켓 디지털 자산 추가",
    "디지털 자산 추가",
    "KRW 마켓 디지털 자산 추가",
    "BTC 마켓 디지털 자산 추가",
    "USDT 마켓 디지털 자산 추가",
    "원화마켓 추가",
    "거래지원 개시",
    "거래 지원 개시",
    "신규 디지털 자산 거래",
    "원화 마켓 추가",
    "BTC 마켓 추가",
    "마켓 추가",
    "거래지원",
    "거래 개시",
    "Digital Asset Addition",
    "Market Addition",
    "New Listing",
];

/// Decides whether a notice title announces a new listing.
///
/// A title qualifies when it contains any keyword, ignoring case.
#[derive(Debug, Clone)]
pub struct TitleClassifier {
    /// Lowercased keywords
    keywords: Vec<String>,
}

impl TitleClassifier {
    /// Classifier over the given keywords. Blank keywords are ignored.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn is_listing_announcement(&self, title: &str) -> bool {
        self.matched_keyword(title).is_some()
    }

    /// First keyword found in the title.
    pub fn matched_keyword(&self, title: &str) -> Option<&str> {
        let title = title.to_lowercase();
        self.keywords
            .iter()
            .find(|k| title.contains(k.as_str()))
            .map(String::as_str)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Default for TitleClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_LISTING_KEYWORDS)
    }
}
