//! Question collector.
//!
//! Drives an authenticated page session to the newest-questions listing,
//! extracts candidate records from the rendered HTML, screens them
//! against the filter criteria, and persists the first non-empty batch
//! to the shared store. Empty passes are retried after a fixed backoff,
//! with a fresh browser session each time.
//!
//! Extraction is pure (HTML in, typed outcomes out) so it is testable
//! without a browser.

use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, CollectorConfig, FilterConfig, SiteConfig};
use crate::driver::{PageDriver, SessionFactory};
use crate::storage;
use crate::types::{parse_deadline, parse_price, QuestionRecord, RecordOutcome, SkipReason};

/// CSS selectors for the listing page.
mod selectors {
    pub const QUESTIONS_LIST: &str = "#questions-list";
    pub const QUESTION_BOX: &str = "div.questionBox";
    pub const TITLE: &str = ".questionTitle";
    pub const SUBJECT: &str = ".upper-line.category-name";
    pub const DEADLINE: &str = ".timeVal.upper-line";
    pub const PRICE: &str = ".upper-line";
    pub const QUESTION_LINK: &str = "a[href*='/questions/']";
}

/// Parse a static CSS selector literal.
fn selector(css: &str) -> Selector {
    // All selectors in this module are compile-time literals.
    Selector::parse(css).expect("static selector")
}

/// The listing selectors, parsed once per extraction pass.
struct EntrySelectors {
    list: Selector,
    entry: Selector,
    title: Selector,
    subject: Selector,
    deadline: Selector,
    price: Selector,
    link: Selector,
}

impl EntrySelectors {
    fn new() -> Self {
        EntrySelectors {
            list: selector(selectors::QUESTIONS_LIST),
            entry: selector(selectors::QUESTION_BOX),
            title: selector(selectors::TITLE),
            subject: selector(selectors::SUBJECT),
            deadline: selector(selectors::DEADLINE),
            price: selector(selectors::PRICE),
            link: selector(selectors::QUESTION_LINK),
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract all listing entries from a page snapshot.
///
/// Returns one typed outcome per entry; a page without the list
/// container yields no outcomes at all.
pub fn extract_records(html: &str, base_url: &str) -> Vec<RecordOutcome> {
    let doc = Html::parse_document(html);
    let sels = EntrySelectors::new();

    let Some(list) = doc.select(&sels.list).next() else {
        return Vec::new();
    };

    list.select(&sels.entry)
        .map(|entry| extract_entry(&entry, &sels, base_url))
        .collect()
}

/// Extract one listing entry. Any missing field skips the whole entry.
fn extract_entry(entry: &ElementRef<'_>, sels: &EntrySelectors, base_url: &str) -> RecordOutcome {
    let Some(title) = text_of(entry, &sels.title) else {
        return RecordOutcome::Skipped(SkipReason::MissingTitle);
    };
    let Some(subject) = text_of(entry, &sels.subject) else {
        return RecordOutcome::Skipped(SkipReason::MissingSubject);
    };
    let Some(deadline) = text_of(entry, &sels.deadline) else {
        return RecordOutcome::Skipped(SkipReason::MissingDeadline);
    };
    let Some(price) = text_of(entry, &sels.price) else {
        return RecordOutcome::Skipped(SkipReason::MissingPrice);
    };
    let Some(href) = attr_of(entry, &sels.link, "href") else {
        return RecordOutcome::Skipped(SkipReason::MissingUrl);
    };

    if parse_price(&price).is_none() {
        return RecordOutcome::Skipped(SkipReason::UnparsablePrice(price));
    }
    if parse_deadline(&deadline).is_none() {
        return RecordOutcome::Skipped(SkipReason::UnparsableDeadline(deadline));
    }

    let url = if href.starts_with("http") {
        href
    } else {
        format!("{base_url}{href}")
    };

    RecordOutcome::Kept(QuestionRecord {
        title,
        subject,
        deadline,
        price,
        url,
    })
}

/// Trimmed text of the first descendant matching `sel`, if any.
fn text_of(entry: &ElementRef<'_>, sel: &Selector) -> Option<String> {
    entry
        .select(sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

/// Attribute of the first descendant matching `sel`, if any.
fn attr_of(entry: &ElementRef<'_>, sel: &Selector, attr: &str) -> Option<String> {
    entry
        .select(sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.to_string())
}

// ---------------------------------------------------------------------------
// Screening
// ---------------------------------------------------------------------------

/// Result of screening one batch of extraction outcomes.
#[derive(Debug, Default)]
pub struct ScreenedBatch {
    /// Records that extracted cleanly and passed the filter.
    pub kept: Vec<QuestionRecord>,
    /// Per-entry extraction skips, in listing order.
    pub skipped: Vec<SkipReason>,
    /// Cleanly extracted records rejected by the filter predicate.
    pub rejected: usize,
}

/// Apply the filter predicate to a batch of extraction outcomes.
pub fn screen_records(outcomes: Vec<RecordOutcome>, filter: &FilterConfig) -> ScreenedBatch {
    let mut batch = ScreenedBatch::default();

    for outcome in outcomes {
        match outcome {
            RecordOutcome::Skipped(reason) => batch.skipped.push(reason),
            RecordOutcome::Kept(record) => {
                let Some(price) = record.price_value() else {
                    batch
                        .skipped
                        .push(SkipReason::UnparsablePrice(record.price.clone()));
                    continue;
                };
                if filter.accepts(&record.subject, price, record.deadline_hours()) {
                    batch.kept.push(record);
                } else {
                    batch.rejected += 1;
                }
            }
        }
    }

    batch
}

// ---------------------------------------------------------------------------
// Collector
// ---------------------------------------------------------------------------

/// Summary of a completed collection run.
#[derive(Debug)]
pub struct CollectReport {
    /// Collection passes taken, including the successful one.
    pub attempts: u32,
    /// The persisted records.
    pub records: Vec<QuestionRecord>,
}

pub struct Collector {
    site: SiteConfig,
    filter: FilterConfig,
    pacing: CollectorConfig,
    store_path: String,
}

impl Collector {
    pub fn new(cfg: &AppConfig) -> Self {
        Collector {
            site: cfg.site.clone(),
            filter: cfg.filter.clone(),
            pacing: cfg.collector.clone(),
            store_path: cfg.store_path().to_string(),
        }
    }

    /// Collect until a non-empty filtered batch is persisted.
    ///
    /// Each pass uses a fresh session. Failed or empty passes back off
    /// for `retry_delay_secs` and try again, up to `max_attempts` when
    /// one is configured (the default is to retry until cancelled).
    pub async fn run(&self, sessions: &dyn SessionFactory) -> Result<CollectReport> {
        let delay = Duration::from_secs(self.pacing.retry_delay_secs);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(attempt, "Starting collection pass");

            match self.collect_once(sessions).await {
                Ok(records) if !records.is_empty() => {
                    storage::save_records(&records, Some(&self.store_path))?;
                    info!(
                        count = records.len(),
                        path = %self.store_path,
                        "Filtered questions saved"
                    );
                    return Ok(CollectReport { attempts: attempt, records });
                }
                Ok(_) => {
                    info!(
                        attempt,
                        retry_in_secs = delay.as_secs(),
                        "No matching questions found, retrying"
                    );
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Collection pass failed, retrying");
                }
            }

            if let Some(max) = self.pacing.max_attempts {
                if attempt >= max {
                    anyhow::bail!("no matching questions after {attempt} passes");
                }
            }

            tokio::time::sleep(delay).await;
        }
    }

    /// One full collection pass on a fresh session.
    ///
    /// The session is closed whether or not the pass succeeds.
    pub async fn collect_once(&self, sessions: &dyn SessionFactory) -> Result<Vec<QuestionRecord>> {
        let mut driver = sessions.open().await.context("Failed to open session")?;

        let result = self.scan_listing(driver.as_ref()).await;

        if let Err(e) = driver.close().await {
            debug!(error = %e, "Session close failed");
        }

        result
    }

    async fn scan_listing(&self, driver: &dyn PageDriver) -> Result<Vec<QuestionRecord>> {
        let timeout = Duration::from_secs(self.pacing.page_timeout_secs);

        driver
            .goto(&self.site.listing_url, timeout)
            .await
            .context("Listing navigation failed")?;

        driver
            .wait_for_selector(selectors::QUESTIONS_LIST, timeout)
            .await
            .context("Question list did not appear")?;

        // Let client-side rendering settle before snapshotting.
        tokio::time::sleep(Duration::from_millis(self.pacing.settle_delay_ms)).await;

        let html = driver.content().await.context("Page snapshot failed")?;

        let outcomes = extract_records(&html, &self.site.base_url);
        debug!(entries = outcomes.len(), "Listing entries found");

        let batch = screen_records(outcomes, &self.filter);
        for reason in &batch.skipped {
            warn!(%reason, "Skipping listing entry");
        }
        info!(
            kept = batch.kept.len(),
            rejected = batch.rejected,
            skipped = batch.skipped.len(),
            "Listing pass screened"
        );

        Ok(batch.kept)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
