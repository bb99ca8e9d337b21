//! Bidder entry point.
//!
//! Reads the shared store written by `collect` and places up to the
//! configured number of bids, one per question, with randomized price
//! and delivery time.

use anyhow::Result;
use tracing::info;

use poolbid::config::AppConfig;
use poolbid::driver::chromium::ChromiumFactory;
use poolbid::engine::bidder::Bidder;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load_or_default("config.toml")?;

    poolbid::init_tracing();

    info!(
        store = %cfg.store_path(),
        max_bids = cfg.bidder.max_bids,
        price_range = ?cfg.bidder.price_range(),
        delivery_range = ?cfg.bidder.delivery_range(),
        "POOLBID bidder starting"
    );

    let session = cfg.site.resolve_session()?;
    let factory = ChromiumFactory::new(cfg.site.clone(), session);
    let bidder = Bidder::new(&cfg);

    tokio::select! {
        result = bidder.run(&factory) => {
            let report = result?;
            info!(
                placed = report.placed,
                attempted = report.attempted,
                aborted = report.aborted,
                skipped = report.missing_url,
                "Bidding process completed"
            );
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received.");
        }
    }

    Ok(())
}
