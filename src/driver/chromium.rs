//! Headless-Chromium page driver over the Chrome DevTools Protocol.
//!
//! One `ChromiumDriver` owns one browser process and one page. The CDP
//! event handler runs on a background task for the life of the session.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::page::Page;
use futures::StreamExt;
use secrecy::SecretString;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{authenticate, expose, DriverError, PageDriver, SessionCookie, SessionFactory};
use crate::config::SiteConfig;

/// How often to re-query while waiting for an element to appear.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn session_err(e: impl std::fmt::Display) -> DriverError {
    DriverError::Session(e.to_string())
}

pub struct ChromiumDriver {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    closed: bool,
}

impl ChromiumDriver {
    /// Launch a headless browser and open a blank page.
    pub async fn launch() -> Result<Self, DriverError> {
        let config = BrowserConfig::builder()
            .build()
            .map_err(DriverError::Session)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(session_err)?;

        // Drive CDP events until the browser goes away.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(session_err)?;

        debug!("Headless Chromium session started");
        Ok(ChromiumDriver {
            browser,
            page,
            handler_task,
            closed: false,
        })
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), DriverError> {
        let nav = async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };

        match tokio::time::timeout(timeout, nav).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(DriverError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(DriverError::Navigation {
                url: url.to_string(),
                reason: format!("timed out after {timeout:?}"),
            }),
        }
    }

    async fn set_cookie(&self, cookie: &SessionCookie) -> Result<(), DriverError> {
        let param = CookieParam::builder()
            .name(&cookie.name)
            .value(expose(&cookie.value))
            .domain(&cookie.domain)
            .path("/")
            .secure(true)
            .http_only(true)
            .build()
            .map_err(DriverError::Session)?;

        self.page.set_cookie(param).await.map_err(session_err)?;
        Ok(())
    }

    async fn reload(&self) -> Result<(), DriverError> {
        self.page.reload().await.map_err(session_err)?;
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(DriverError::WaitTimeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn content(&self) -> Result<String, DriverError> {
        self.page.content().await.map_err(session_err)
    }

    async fn exists(&self, selector: &str) -> Result<bool, DriverError> {
        Ok(self.page.find_element(selector).await.is_ok())
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| DriverError::ElementNotFound(selector.to_string()))?;
        element.click().await.map_err(session_err)?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), DriverError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| DriverError::ElementNotFound(selector.to_string()))?;
        element.click().await.map_err(session_err)?;
        element.type_str(value).await.map_err(session_err)?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Browser did not close cleanly");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();

        debug!("Chromium session closed");
        Ok(())
    }
}

/// Opens authenticated `ChromiumDriver` sessions.
pub struct ChromiumFactory {
    site: SiteConfig,
    session: SecretString,
}

impl ChromiumFactory {
    pub fn new(site: SiteConfig, session: SecretString) -> Self {
        ChromiumFactory { site, session }
    }
}

#[async_trait]
impl SessionFactory for ChromiumFactory {
    async fn open(&self) -> Result<Box<dyn PageDriver>, DriverError> {
        let mut driver = ChromiumDriver::launch().await?;

        if let Err(e) = authenticate(&driver, &self.site, &self.session).await {
            // Don't leak a browser process on a failed login.
            let _ = driver.close().await;
            return Err(e);
        }

        Ok(Box::new(driver))
    }
}
