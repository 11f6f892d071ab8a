//! Application configuration.

use listing_alerts::NotificationSettings;
use listing_core::Exchange;
use listing_feeds::FetchConfig;
use listing_monitor::{
    PipelineConfig, SymbolExtractor, TitleClassifier, DEFAULT_LISTING_KEYWORDS,
    DEFAULT_RESERVED_SYMBOLS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Polling and timeouts.
    pub monitor: MonitorSettings,
    /// Listing keywords.
    pub classifier: ClassifierSettings,
    /// Symbol extraction.
    pub extractor: ExtractorSettings,
    /// Notification channels.
    pub notifications: NotificationSettings,
    /// SQLite URL; an in-memory store is used when unset.
    pub database_url: Option<String>,
}

impl AppConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fill unset secrets and targets from the environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.database_url.as_deref().map_or(true, |url| url.trim().is_empty()) {
            self.database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        }
        self.notifications.fill_from(lookup);
    }
}

/// Monitor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Seconds between cycles.
    pub poll_interval_secs: u64,
    /// Announcements kept per exchange per poll.
    pub max_announcements: usize,
    pub fetch_timeout_secs: u64,
    pub store_timeout_secs: u64,
    pub notify_timeout_secs: u64,
    /// Exchanges to poll.
    pub exchanges: Vec<Exchange>,
    /// Also diff the Upbit market list each cycle.
    pub watch_new_markets: bool,
    pub max_new_markets_per_cycle: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            max_announcements: 10,
            fetch_timeout_secs: 10,
            store_timeout_secs: 10,
            notify_timeout_secs: 15,
            exchanges: Exchange::all().to_vec(),
            watch_new_markets: true,
            max_new_markets_per_cycle: 5,
        }
    }
}

impl MonitorSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl From<&MonitorSettings> for PipelineConfig {
    fn from(settings: &MonitorSettings) -> Self {
        PipelineConfig {
            fetch_timeout: Duration::from_secs(settings.fetch_timeout_secs),
            store_timeout: Duration::from_secs(settings.store_timeout_secs),
            notify_timeout: Duration::from_secs(settings.notify_timeout_secs),
            max_new_markets_per_cycle: settings.max_new_markets_per_cycle,
        }
    }
}

impl From<&MonitorSettings> for FetchConfig {
    fn from(settings: &MonitorSettings) -> Self {
        FetchConfig {
            max_announcements: settings.max_announcements,
            timeout: Duration::from_secs(settings.fetch_timeout_secs),
            ..Default::default()
        }
    }
}

/// Classifier settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Replaces the built-in keyword list when set.
    pub keywords: Option<Vec<String>>,
}

impl ClassifierSettings {
    pub fn build(&self) -> TitleClassifier {
        match &self.keywords {
            Some(keywords) if !keywords.is_empty() => TitleClassifier::new(keywords),
            _ => TitleClassifier::new(DEFAULT_LISTING_KEYWORDS),
        }
    }
}

/// Extractor settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorSettings {
    /// Replaces the built-in reserved symbols when set.
    pub reserved_symbols: Option<Vec<String>>,
    /// Added to the reserved symbols (e.g., BUSD, DAI).
    pub extra_reserved_symbols: Vec<String>,
}

impl ExtractorSettings {
    pub fn build(&self) -> SymbolExtractor {
        let mut extractor = match &self.reserved_symbols {
            Some(symbols) => SymbolExtractor::with_reserved_symbols(symbols),
            None => SymbolExtractor::with_reserved_symbols(DEFAULT_RESERVED_SYMBOLS),
        };
        for symbol in &self.extra_reserved_symbols {
            extractor.reserve(symbol);
        }
        extractor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.monitor.poll_interval_secs, 30);
        assert_eq!(config.monitor.max_announcements, 10);
        assert_eq!(config.monitor.exchanges, vec![Exchange::Upbit, Exchange::Bithumb]);
        assert!(config.monitor.watch_new_markets);
        assert_eq!(config.database_url, None);
    }

    #[test]
    fn test_partial_file() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "monitor": { "poll_interval_secs": 15, "exchanges": ["bithumb"] },
                "extractor": { "extra_reserved_symbols": ["busd"] },
                "database_url": "sqlite://listings.db"
            }"#,
        )
        .unwrap();

        assert_eq!(config.monitor.poll_interval(), Duration::from_secs(15));
        assert_eq!(config.monitor.exchanges, vec![Exchange::Bithumb]);
        assert_eq!(config.monitor.fetch_timeout_secs, 10);
        assert_eq!(config.database_url.as_deref(), Some("sqlite://listings.db"));

        let extractor = config.extractor.build();
        assert!(extractor.is_reserved("BUSD"));
        assert!(extractor.is_reserved("KRW"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = AppConfig::load("/nonexistent/listing-monitor/config.json").unwrap();
        assert_eq!(config.monitor.poll_interval_secs, 30);
    }

    #[test]
    fn test_invalid_file() {
        let path = std::env::temp_dir().join("listing-monitor-invalid-config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_env_fills_database_url() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "sqlite://env.db"),
            ("TELEGRAM_CHAT_ID", "42"),
        ]);
        let lookup = |key: &str| env.get(key).map(|v| v.to_string());

        let mut config = AppConfig::default();
        config.apply_env_from(lookup);
        assert_eq!(config.database_url.as_deref(), Some("sqlite://env.db"));
        assert_eq!(config.notifications.telegram.chat_id.as_deref(), Some("42"));

        let mut config = AppConfig {
            database_url: Some("sqlite://file.db".to_string()),
            ..Default::default()
        };
        config.apply_env_from(lookup);
        assert_eq!(config.database_url.as_deref(), Some("sqlite://file.db"));
    }

    #[test]
    fn test_settings_to_pipeline_config() {
        let settings = MonitorSettings::default();
        let config: PipelineConfig = (&settings).into();
        assert_eq!(config.notify_timeout, Duration::from_secs(15));
        assert_eq!(config.max_new_markets_per_cycle, 5);

        let fetch: FetchConfig = (&settings).into();
        assert_eq!(fetch.max_announcements, 10);
    }

    #[test]
    fn test_classifier_override() {
        let settings = ClassifierSettings {
            keywords: Some(vec!["상장".to_string()]),
        };
        let classifier = settings.build();
        assert!(classifier.is_listing_announcement("코인 상장 안내"));
        assert!(!classifier.is_listing_announcement("Market Addition"));
    }
}
