//! Page-driver abstraction.
//!
//! Defines the `PageDriver` trait — the capability surface the collector
//! and bidder need from a scripted browser session — plus the
//! `SessionFactory` trait used to open a fresh authenticated session per
//! run (the collector recreates its session on every retry pass).
//!
//! The only real implementation is `ChromiumDriver` (headless Chromium
//! over CDP); integration tests supply an in-memory mock.

pub mod chromium;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::SiteConfig;

/// Errors surfaced by a page driver.
///
/// The variants matter: a missing element aborts only the current bid
/// attempt, while navigation and session failures abort the whole pass.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("timed out after {timeout:?} waiting for `{selector}`")]
    WaitTimeout { selector: String, timeout: Duration },

    #[error("element not found: `{0}`")]
    ElementNotFound(String),

    #[error("browser session error: {0}")]
    Session(String),
}

impl DriverError {
    /// Whether this failure means an expected control was simply absent.
    pub fn is_element_missing(&self) -> bool {
        matches!(
            self,
            DriverError::ElementNotFound(_) | DriverError::WaitTimeout { .. }
        )
    }
}

/// An authentication cookie to inject into the browsing context.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub value: SecretString,
    pub domain: String,
}

impl SessionCookie {
    pub fn new(name: &str, value: SecretString, domain: &str) -> Self {
        SessionCookie {
            name: name.to_string(),
            value,
            domain: domain.to_string(),
        }
    }
}

/// Abstraction over a scripted browser page session.
///
/// Implementors own one page in one browsing context. All selector
/// arguments are CSS selectors. Operations are strictly sequential;
/// nothing here is called concurrently.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to a URL, bounded by `timeout`.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), DriverError>;

    /// Inject a session cookie scoped to its domain.
    async fn set_cookie(&self, cookie: &SessionCookie) -> Result<(), DriverError>;

    /// Reload the current page (applies freshly injected cookies).
    async fn reload(&self) -> Result<(), DriverError>;

    /// Wait until an element matching `selector` appears.
    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    /// Full HTML snapshot of the current page.
    async fn content(&self) -> Result<String, DriverError>;

    /// Whether an element matching `selector` currently exists.
    async fn exists(&self, selector: &str) -> Result<bool, DriverError>;

    /// Click the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<(), DriverError>;

    /// Type `value` into the first element matching `selector`.
    async fn fill(&self, selector: &str, value: &str) -> Result<(), DriverError>;

    /// Tear down the session. Idempotent.
    async fn close(&mut self) -> Result<(), DriverError>;
}

/// Opens fresh authenticated page sessions.
///
/// Each call yields an independent session; the caller owns its
/// lifecycle and must `close()` it.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageDriver>, DriverError>;
}

/// Authenticate a fresh session by injecting the site session cookie.
///
/// Loads the site root first (the cookie needs an origin), injects the
/// cookie, then reloads so the session takes effect.
pub async fn authenticate(
    driver: &dyn PageDriver,
    site: &SiteConfig,
    session: &SecretString,
) -> Result<(), DriverError> {
    let timeout = Duration::from_secs(site.login_timeout_secs);
    driver.goto(&site.base_url, timeout).await?;

    let cookie = SessionCookie::new(&site.cookie_name, session.clone(), &site.cookie_domain);
    driver.set_cookie(&cookie).await?;
    driver.reload().await?;

    debug!(domain = %cookie.domain, cookie = %cookie.name, "Session cookie applied");
    Ok(())
}

// Keep the secret out of Debug/log output entirely; only the chromium
// driver ever exposes it, at the CDP boundary.
pub(crate) fn expose(value: &SecretString) -> &str {
    value.expose_secret()
}
