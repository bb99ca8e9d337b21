//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every field has a documented default, so the tool runs without a
//! config file. The session credential is referenced by env-var name
//! and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Path of the JSON store bridging the collector to the bidder.
    pub store_path: Option<String>,
    pub site: SiteConfig,
    pub filter: FilterConfig,
    pub collector: CollectorConfig,
    pub bidder: BidderConfig,
}

/// Target site endpoints and session-cookie parameters.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub listing_url: String,
    pub cookie_name: String,
    pub cookie_domain: String,
    /// Env var holding the session credential.
    pub session_env: String,
    /// Timeout for the initial login navigation.
    pub login_timeout_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            base_url: "https://www.studypool.com".to_string(),
            listing_url: "https://www.studypool.com/questions/newest".to_string(),
            cookie_name: "PHPSESSID".to_string(),
            cookie_domain: "www.studypool.com".to_string(),
            session_env: "STUDYPOOL_SESSION".to_string(),
            login_timeout_secs: 90,
        }
    }
}

impl SiteConfig {
    /// Resolve the session credential from the configured env var.
    pub fn resolve_session(&self) -> Result<SecretString> {
        let value = std::env::var(&self.session_env)
            .with_context(|| format!("Environment variable not set: {}", self.session_env))?;
        Ok(SecretString::new(value))
    }
}

/// Question filtering thresholds.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FilterConfig {
    /// Inclusive price floor in dollars.
    pub minimum_price: f64,
    /// Hour floor for hour-denominated deadlines.
    pub min_deadline_hours: u32,
    /// Day floor for day-denominated deadlines.
    pub min_deadline_days: u32,
    /// Case-insensitive substrings matched against the subject label.
    pub preferred_categories: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            minimum_price: 3.0,
            min_deadline_hours: 3,
            min_deadline_days: 1,
            preferred_categories: [
                "Business",
                "Writing",
                "Science",
                "Programming",
                "Mathematics",
                "Humanities",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl FilterConfig {
    /// Whether the subject label contains any preferred category.
    pub fn matches_category(&self, subject: &str) -> bool {
        let subject = subject.to_lowercase();
        self.preferred_categories
            .iter()
            .any(|c| subject.contains(&c.to_lowercase()))
    }

    /// The full filter predicate.
    ///
    /// A record passes if its category matches, its price clears the
    /// floor, and its deadline clears either the hour floor or the day
    /// floor (the two floors are OR'd, not AND'd).
    pub fn accepts(&self, subject: &str, price: f64, deadline_hours: u32) -> bool {
        self.matches_category(subject)
            && price >= self.minimum_price
            && (deadline_hours >= self.min_deadline_hours
                || deadline_hours >= self.min_deadline_days.saturating_mul(24))
    }
}

/// Collector pacing and retry policy.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CollectorConfig {
    /// Backoff between collection passes.
    pub retry_delay_secs: u64,
    /// Timeout for listing navigation and for the list container to appear.
    pub page_timeout_secs: u64,
    /// Settle delay after the list container appears.
    pub settle_delay_ms: u64,
    /// Cap on collection passes. `None` retries until killed.
    pub max_attempts: Option<u32>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        CollectorConfig {
            retry_delay_secs: 60,
            page_timeout_secs: 60,
            settle_delay_ms: 5000,
            max_attempts: None,
        }
    }
}

/// Bidder budget, randomization ranges, and pacing.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BidderConfig {
    /// Successful bids to place per run.
    pub max_bids: u32,
    pub bid_price_min: u32,
    pub bid_price_max: u32,
    pub delivery_hours_min: u32,
    pub delivery_hours_max: u32,
    /// Timeout for question-page navigation.
    pub page_timeout_secs: u64,
    /// Settle delay after opening a question page.
    pub settle_delay_ms: u64,
    /// Pause after opening the price dropdown.
    pub dropdown_pause_ms: u64,
}

impl Default for BidderConfig {
    fn default() -> Self {
        BidderConfig {
            max_bids: 5,
            bid_price_min: 5,
            bid_price_max: 1000,
            delivery_hours_min: 5,
            delivery_hours_max: 360,
            page_timeout_secs: 60,
            settle_delay_ms: 3000,
            dropdown_pause_ms: 1000,
        }
    }
}

impl BidderConfig {
    pub fn price_range(&self) -> RangeInclusive<u32> {
        self.bid_price_min..=self.bid_price_max
    }

    pub fn delivery_range(&self) -> RangeInclusive<u32> {
        self.delivery_hours_min..=self.delivery_hours_max
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    /// A file that exists but fails to parse is still an error.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(AppConfig::default())
        }
    }

    /// The JSON store path bridging collector output to bidder input.
    pub fn store_path(&self) -> &str {
        self.store_path
            .as_deref()
            .unwrap_or(crate::storage::DEFAULT_STORE_FILE)
    }
}
