//! Collector entry point.
//!
//! Scrapes the newest-questions listing until a non-empty filtered
//! batch is persisted to the shared store, then exits. Ctrl+C cancels
//! the retry loop cleanly.

use anyhow::Result;
use tracing::info;

use poolbid::config::AppConfig;
use poolbid::driver::chromium::ChromiumFactory;
use poolbid::engine::collector::Collector;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load_or_default("config.toml")?;

    poolbid::init_tracing();

    info!(
        listing = %cfg.site.listing_url,
        min_price = cfg.filter.minimum_price,
        categories = cfg.filter.preferred_categories.len(),
        retry_delay_secs = cfg.collector.retry_delay_secs,
        "POOLBID collector starting"
    );

    let session = cfg.site.resolve_session()?;
    let factory = ChromiumFactory::new(cfg.site.clone(), session);
    let collector = Collector::new(&cfg);

    tokio::select! {
        result = collector.run(&factory) => {
            let report = result?;
            info!(
                attempts = report.attempts,
                saved = report.records.len(),
                path = %cfg.store_path(),
                "Collection finished"
            );
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received.");
        }
    }

    Ok(())
}
