//! Mock page driver for integration testing.
//!
//! Provides a deterministic `PageDriver` implementation backed by
//! scripted in-memory pages: known HTML snapshots, known sets of
//! interactive elements, and an inspectable interaction log — no
//! browser involved.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use poolbid::driver::{DriverError, PageDriver, SessionCookie, SessionFactory};
use poolbid::engine::bidder::selectors as bid_selectors;

/// One scripted page: its HTML snapshot and which selectors resolve.
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    pub html: String,
    elements: HashSet<String>,
    /// Selector prefixes treated as present (e.g. every price option).
    element_patterns: Vec<String>,
}

impl MockPage {
    pub fn new(html: &str) -> Self {
        MockPage {
            html: html.to_string(),
            ..Default::default()
        }
    }

    pub fn with_elements(mut self, selectors: &[&str]) -> Self {
        self.elements.extend(selectors.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_pattern(mut self, prefix: &str) -> Self {
        self.element_patterns.push(prefix.to_string());
        self
    }

    fn has(&self, selector: &str) -> bool {
        self.elements.contains(selector)
            || self.element_patterns.iter().any(|p| selector.starts_with(p))
    }
}

/// A question page whose bid form is fully present, offering every
/// price option.
pub fn bid_page_all_controls() -> MockPage {
    MockPage::new("<html><body>bid form</body></html>")
        .with_elements(&[
            bid_selectors::PRICE_DROPDOWN,
            bid_selectors::DELIVERY_INPUT,
            bid_selectors::FINALIZE,
            bid_selectors::SUBMIT,
        ])
        .with_pattern("option[value='")
}

/// Like [`bid_page_all_controls`] but with one control removed.
pub fn bid_page_without(missing: &str) -> MockPage {
    let mut page = bid_page_all_controls();
    page.elements.remove(missing);
    page
}

/// A scripted page driver.
///
/// All state is in-memory. Pages are keyed by URL; navigation to an
/// unscripted URL fails like a dead link would.
pub struct MockDriver {
    pages: HashMap<String, MockPage>,
    fail_navigation: HashSet<String>,
    current: Mutex<Option<String>>,
    log: Arc<Mutex<Vec<String>>>,
    force_error: Mutex<Option<String>>,
}

impl MockDriver {
    pub fn new() -> Self {
        MockDriver {
            pages: HashMap::new(),
            fail_navigation: HashSet::new(),
            current: Mutex::new(None),
            log: Arc::new(Mutex::new(Vec::new())),
            force_error: Mutex::new(None),
        }
    }

    pub fn with_page(mut self, url: &str, page: MockPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// Make navigation to `url` fail with a navigation error.
    pub fn with_navigation_failure(mut self, url: &str) -> Self {
        self.fail_navigation.insert(url.to_string());
        self
    }

    /// Force all subsequent operations to return a session error.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    /// Handle to the interaction log; survives moving the driver into
    /// a factory.
    pub fn log_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.log)
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    fn forced(&self) -> Result<(), DriverError> {
        if let Some(msg) = self.force_error.lock().unwrap().as_ref() {
            return Err(DriverError::Session(msg.clone()));
        }
        Ok(())
    }

    fn current_page(&self) -> Result<MockPage, DriverError> {
        let current = self.current.lock().unwrap();
        let url = current
            .as_ref()
            .ok_or_else(|| DriverError::Session("no page open".to_string()))?;
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| DriverError::Session(format!("no scripted page for {url}")))
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<(), DriverError> {
        self.forced()?;
        self.record(format!("goto {url}"));

        if self.fail_navigation.contains(url) {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason: "scripted navigation failure".to_string(),
            });
        }
        if !self.pages.contains_key(url) {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason: "no scripted page".to_string(),
            });
        }

        *self.current.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn set_cookie(&self, cookie: &SessionCookie) -> Result<(), DriverError> {
        self.forced()?;
        self.record(format!("cookie {}@{}", cookie.name, cookie.domain));
        Ok(())
    }

    async fn reload(&self) -> Result<(), DriverError> {
        self.forced()?;
        self.record("reload".to_string());
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        self.forced()?;
        if self.current_page()?.has(selector) {
            Ok(())
        } else {
            Err(DriverError::WaitTimeout {
                selector: selector.to_string(),
                timeout,
            })
        }
    }

    async fn content(&self) -> Result<String, DriverError> {
        self.forced()?;
        Ok(self.current_page()?.html)
    }

    async fn exists(&self, selector: &str) -> Result<bool, DriverError> {
        self.forced()?;
        Ok(self.current_page()?.has(selector))
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        self.forced()?;
        if !self.current_page()?.has(selector) {
            return Err(DriverError::ElementNotFound(selector.to_string()));
        }
        self.record(format!("click {selector}"));
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), DriverError> {
        self.forced()?;
        if !self.current_page()?.has(selector) {
            return Err(DriverError::ElementNotFound(selector.to_string()));
        }
        self.record(format!("fill {selector}={value}"));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.record("close".to_string());
        Ok(())
    }
}

/// Hands out pre-scripted sessions in order, one per `open()` call.
pub struct MockSessionFactory {
    sessions: Mutex<VecDeque<MockDriver>>,
    opened: AtomicU32,
}

impl MockSessionFactory {
    pub fn new(sessions: Vec<MockDriver>) -> Self {
        MockSessionFactory {
            sessions: Mutex::new(sessions.into()),
            opened: AtomicU32::new(0),
        }
    }

    pub fn single(driver: MockDriver) -> Self {
        Self::new(vec![driver])
    }

    /// How many sessions have been opened so far.
    pub fn opened(&self) -> u32 {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for MockSessionFactory {
    async fn open(&self) -> Result<Box<dyn PageDriver>, DriverError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let driver = self
            .sessions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| DriverError::Session("no scripted session left".to_string()))?;
        Ok(Box::new(driver))
    }
}

// ---------------------------------------------------------------------------
// Listing fixtures
// ---------------------------------------------------------------------------

/// Build one listing entry in the marketplace's markup shape.
pub fn listing_entry(title: &str, subject: &str, deadline: &str, price: &str, href: &str) -> String {
    format!(
        r#"<div class="questionBox">
             <span class="upper-line">{price}</span>
             <span class="upper-line category-name">{subject}</span>
             <span class="timeVal upper-line">{deadline}</span>
             <div class="questionTitle">{title}</div>
             <a href="{href}">view</a>
           </div>"#
    )
}

/// Build a full listing page around the given entries.
pub fn listing_page(entries: &[String]) -> MockPage {
    let html = format!(
        r#"<html><body><div id="questions-list">{}</div></body></html>"#,
        entries.join("\n")
    );
    MockPage::new(&html).with_elements(&["#questions-list"])
}

/// A temp file path that won't collide across parallel tests.
pub fn temp_store_path() -> String {
    let mut p = std::env::temp_dir();
    p.push(format!("poolbid_sim_store_{}.json", uuid::Uuid::new_v4()));
    p.to_string_lossy().to_string()
}
