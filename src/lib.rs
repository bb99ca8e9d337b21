//! POOLBID — marketplace question collector and auto-bidder.
//!
//! Library crate exposing all modules for use by integration tests
//! and the two binary entry points (`collect` and `bid`).

pub mod config;
pub mod types;
pub mod driver;
pub mod engine;
pub mod storage;

/// Initialise the `tracing` subscriber.
///
/// Shared by both binaries. Honours `RUST_LOG`; set `POOLBID_LOG_JSON`
/// for machine-readable output.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("poolbid=info"));

    let json_logging = std::env::var("POOLBID_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
