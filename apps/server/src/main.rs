//! Listing Monitor - Headless Server
//!
//! Polls Korean exchange notice boards for new coin listings and alerts on
//! each one exactly once.

mod config;

use clap::Parser;
use config::{AppConfig, ConfigError};
use listing_alerts::{DbError, FanoutNotifier, ListingDatabase, NotifierError};
use listing_core::Exchange;
use listing_feeds::{
    AnnouncementFetcher, BithumbMarketSource, BithumbNoticeFetcher, FeedError, FetchConfig,
    MarketSource, UpbitMarketSource, UpbitNoticeFetcher,
};
use listing_monitor::{
    CycleReport, InMemoryListingStore, ListingStore, Pipeline, PipelineConfig, StoreError,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Listing Monitor CLI
#[derive(Parser, Debug)]
#[command(name = "listing-monitor")]
#[command(about = "Detects new coin listings on Upbit and Bithumb", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Log level: trace, debug, info, warn, error (RUST_LOG takes precedence)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Seconds between polling cycles (overrides the config file)
    #[arg(short, long)]
    interval_secs: Option<u64>,

    /// Run a single cycle and exit
    #[arg(long, default_value_t = false)]
    once: bool,

    /// SQLite database URL, e.g. sqlite://listings.db
    #[arg(long)]
    database_url: Option<String>,
}

#[derive(Error, Debug)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Failed to load listing history: {0}")]
    Store(#[from] StoreError),
    #[error("Failed to set up feeds: {0}")]
    Feed(#[from] FeedError),
    #[error("Failed to set up notifications: {0}")]
    Notifier(#[from] NotifierError),
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

async fn build_store(config: &AppConfig) -> Result<Arc<dyn ListingStore>, DbError> {
    match config.database_url.as_deref() {
        Some(url) => {
            let db = ListingDatabase::connect(url).await?;
            info!("  Store: SQLite ({}, {} listings)", url, db.count_listings().await?);
            Ok(Arc::new(db))
        }
        None => {
            warn!("  Store: in-memory (history is lost on restart)");
            Ok(Arc::new(InMemoryListingStore::new()))
        }
    }
}

fn build_fetchers(
    exchanges: &[Exchange],
    fetch_config: &FetchConfig,
) -> Result<Vec<Arc<dyn AnnouncementFetcher>>, FeedError> {
    let mut fetchers: Vec<Arc<dyn AnnouncementFetcher>> = Vec::new();
    let mut seen = Vec::new();

    for &exchange in exchanges {
        if seen.contains(&exchange) {
            continue;
        }
        seen.push(exchange);

        let fetcher: Arc<dyn AnnouncementFetcher> = match exchange {
            Exchange::Upbit => Arc::new(UpbitNoticeFetcher::new(fetch_config.clone())?),
            Exchange::Bithumb => Arc::new(BithumbNoticeFetcher::new(fetch_config.clone())?),
        };
        fetchers.push(fetcher);
    }

    Ok(fetchers)
}

fn build_market_sources(
    exchanges: &[Exchange],
    fetch_config: &FetchConfig,
) -> Result<Vec<Arc<dyn MarketSource>>, FeedError> {
    let mut sources: Vec<Arc<dyn MarketSource>> = Vec::new();
    for exchange in Exchange::all() {
        if !exchanges.contains(exchange) {
            continue;
        }
        let source: Arc<dyn MarketSource> = match exchange {
            Exchange::Upbit => Arc::new(UpbitMarketSource::new(fetch_config)?),
            Exchange::Bithumb => Arc::new(BithumbMarketSource::new(fetch_config)?),
        };
        sources.push(source);
    }
    Ok(sources)
}

async fn build_pipeline(config: &AppConfig) -> Result<Pipeline, StartupError> {
    let store = build_store(config).await?;
    let notifier = Arc::new(FanoutNotifier::from_settings(&config.notifications)?);
    let fetch_config = FetchConfig::from(&config.monitor);

    let mut pipeline = Pipeline::new(store, notifier)
        .with_classifier(config.classifier.build())
        .with_extractor(config.extractor.build())
        .with_config(PipelineConfig::from(&config.monitor));

    for fetcher in build_fetchers(&config.monitor.exchanges, &fetch_config)? {
        info!("  Watching notices: {}", fetcher.exchange());
        pipeline = pipeline.with_fetcher(fetcher);
    }

    if config.monitor.watch_new_markets {
        for source in build_market_sources(&config.monitor.exchanges, &fetch_config)? {
            info!("  Watching market list: {}", source.exchange());
            pipeline = pipeline.with_market_source(source);
        }
    }

    let seeded = pipeline.seed_from_store().await?;
    info!("  Known announcements: {}", seeded);

    Ok(pipeline)
}

fn log_report(report: &CycleReport) {
    for exchange in report.announcements.iter().chain(&report.new_markets) {
        debug!(?exchange, "Source report");
    }
    if report.persisted() > 0 || report.unavailable_sources() > 0 {
        info!("Cycle finished: {}", report);
    } else {
        debug!("Cycle finished: {}", report);
    }
}

async fn run(args: Args) -> Result<(), StartupError> {
    let mut config = AppConfig::load(&args.config)?;
    config.apply_env();
    if let Some(url) = args.database_url {
        config.database_url = Some(url);
    }
    if let Some(secs) = args.interval_secs {
        config.monitor.poll_interval_secs = secs;
    }

    info!("🚀 Listing Monitor starting...");
    info!("  Config: {}", args.config);
    info!("  Poll interval: {:?}", config.monitor.poll_interval());

    let pipeline = Arc::new(build_pipeline(&config).await?);

    if args.once {
        let report = pipeline.run_cycle().await;
        info!("Cycle finished: {}", report);
        return Ok(());
    }

    let mut ticker = tokio::time::interval(config.monitor.poll_interval());
    let mut cycles: JoinSet<CycleReport> = JoinSet::new();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Press Ctrl+C to stop...");

    // Cycles may overlap; the ledger keeps them from double-firing.
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !cycles.is_empty() {
                    debug!(in_flight = cycles.len(), "Starting cycle while previous still running");
                }
                let pipeline = pipeline.clone();
                cycles.spawn(async move { pipeline.run_cycle().await });
            }
            Some(result) = cycles.join_next(), if !cycles.is_empty() => {
                match result {
                    Ok(report) => log_report(&report),
                    Err(e) => error!(error = %e, "Cycle task failed"),
                }
            }
            result = &mut shutdown => {
                if let Err(e) = result {
                    error!(error = %e, "Failed to listen for shutdown signal");
                }
                info!("Shutdown signal received");
                break;
            }
        }
    }

    if !cycles.is_empty() {
        info!(in_flight = cycles.len(), "Waiting for running cycles to finish");
    }
    while let Some(result) = cycles.join_next().await {
        if let Ok(report) = result {
            log_report(&report);
        }
    }

    info!("👋 Listing Monitor stopped");
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_logging(&args.log_level);

    if let Err(e) = run(args).await {
        error!(error = %e, "Listing Monitor failed");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["listing-monitor"]);
        assert_eq!(args.config, "config.json");
        assert_eq!(args.log_level, "info");
        assert_eq!(args.interval_secs, None);
        assert!(!args.once);
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::parse_from([
            "listing-monitor",
            "--once",
            "--interval-secs",
            "10",
            "--database-url",
            "sqlite::memory:",
        ]);
        assert!(args.once);
        assert_eq!(args.interval_secs, Some(10));
        assert_eq!(args.database_url.as_deref(), Some("sqlite::memory:"));
    }

    #[test]
    fn test_fetchers_deduplicated() {
        let fetchers = build_fetchers(
            &[Exchange::Bithumb, Exchange::Upbit, Exchange::Bithumb],
            &FetchConfig::default(),
        )
        .unwrap();
        let exchanges: Vec<_> = fetchers.iter().map(|f| f.exchange()).collect();
        assert_eq!(exchanges, vec![Exchange::Bithumb, Exchange::Upbit]);
    }

    #[test]
    fn test_market_sources_follow_exchanges() {
        let sources = build_market_sources(&[Exchange::Bithumb], &FetchConfig::default()).unwrap();
        let exchanges: Vec<_> = sources.iter().map(|s| s.exchange()).collect();
        assert_eq!(exchanges, vec![Exchange::Bithumb]);

        let sources = build_market_sources(
            &[Exchange::Bithumb, Exchange::Upbit, Exchange::Bithumb],
            &FetchConfig::default(),
        )
        .unwrap();
        let exchanges: Vec<_> = sources.iter().map(|s| s.exchange()).collect();
        assert_eq!(exchanges, vec![Exchange::Upbit, Exchange::Bithumb]);
    }

    #[tokio::test]
    async fn test_build_pipeline_in_memory() {
        let mut config = AppConfig::default();
        config.monitor.watch_new_markets = false;
        let pipeline = build_pipeline(&config).await.unwrap();
        assert_eq!(pipeline.known_count(), 0);
    }

    #[tokio::test]
    async fn test_build_pipeline_sqlite_seeds_ledger() {
        let config = AppConfig {
            database_url: Some("sqlite::memory:".to_string()),
            ..Default::default()
        };
        let pipeline = build_pipeline(&config).await.unwrap();
        assert_eq!(pipeline.known_count(), 0);
    }
}
