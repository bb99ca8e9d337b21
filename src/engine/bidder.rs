//! Auto-bidder.
//!
//! Reads the shared store and walks the bid form on each question page:
//! price dropdown → delivery input → finalize control → submit button.
//! Bid price and delivery time are re-randomized for every attempt. A
//! missing control aborts that attempt with a typed outcome and moves on
//! to the next record; navigation and session failures abort the run.

use anyhow::{Context, Result};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, BidderConfig};
use crate::driver::{PageDriver, SessionFactory};
use crate::storage;
use crate::types::BidRequest;

/// CSS selectors for the bid form.
pub mod selectors {
    pub const PRICE_DROPDOWN: &str = "#s2id_priceDropDown";
    pub const DELIVERY_INPUT: &str = "#deliver_in";
    pub const FINALIZE: &str = ".finalize-bid-description";
    pub const SUBMIT: &str = "#placeABidButton";

    /// Selector for the dropdown option carrying a specific bid price.
    pub fn price_option(bid_price: u32) -> String {
        format!("option[value='{bid_price}']")
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of one bid attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BidOutcome {
    Placed(BidRequest),
    /// The attempt stopped at a form step; nothing was submitted.
    Aborted(BidAbort),
}

/// The form step at which a bid attempt stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BidAbort {
    PriceControlMissing,
    /// The dropdown does not offer the sampled price.
    PriceOptionUnavailable(u32),
    DeliveryInputMissing,
    FinalizeControlMissing,
    SubmitControlMissing,
}

impl fmt::Display for BidAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BidAbort::PriceControlMissing => write!(f, "price dropdown not found"),
            BidAbort::PriceOptionUnavailable(p) => write!(f, "bid amount ${p} not offered"),
            BidAbort::DeliveryInputMissing => write!(f, "delivery time input not found"),
            BidAbort::FinalizeControlMissing => write!(f, "finalize control not found"),
            BidAbort::SubmitControlMissing => write!(f, "place-bid button not found"),
        }
    }
}

/// Summary of a completed bidding run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BidReport {
    /// Bids that made it through the whole form.
    pub placed: u32,
    /// Records with a usable URL that were attempted.
    pub attempted: u32,
    /// Attempts that stopped at a missing form control.
    pub aborted: u32,
    /// Records skipped for lacking a URL (don't consume the budget).
    pub missing_url: u32,
}

// ---------------------------------------------------------------------------
// Bidder
// ---------------------------------------------------------------------------

pub struct Bidder {
    cfg: BidderConfig,
    store_path: String,
}

impl Bidder {
    pub fn new(cfg: &AppConfig) -> Self {
        Bidder {
            cfg: cfg.bidder.clone(),
            store_path: cfg.store_path().to_string(),
        }
    }

    /// Place up to `max_bids` bids from the stored question list.
    ///
    /// An absent or empty store is a successful no-op. Navigation and
    /// session errors propagate and end the run; there is deliberately
    /// no outer retry here (see DESIGN.md).
    pub async fn run(&self, sessions: &dyn SessionFactory) -> Result<BidReport> {
        let mut driver = sessions.open().await.context("Failed to open session")?;

        let result = self.run_on(driver.as_ref()).await;

        if let Err(e) = driver.close().await {
            debug!(error = %e, "Session close failed");
        }

        result
    }

    async fn run_on(&self, driver: &dyn PageDriver) -> Result<BidReport> {
        let mut report = BidReport::default();

        let records = match storage::load_records(Some(&self.store_path))? {
            Some(records) if !records.is_empty() => records,
            _ => {
                info!(path = %self.store_path, "No stored questions; nothing to bid on");
                return Ok(report);
            }
        };

        info!(
            count = records.len(),
            max_bids = self.cfg.max_bids,
            "Starting bidding run"
        );

        for record in &records {
            if report.placed >= self.cfg.max_bids {
                info!(placed = report.placed, "Reached max bid limit");
                break;
            }

            if record.url.is_empty() {
                warn!(title = %record.title, "Record has no URL, skipping");
                report.missing_url += 1;
                continue;
            }

            report.attempted += 1;
            match self
                .place_bid(driver, &record.url)
                .await
                .with_context(|| format!("Bid attempt on {} failed", record.url))?
            {
                BidOutcome::Placed(request) => {
                    report.placed += 1;
                    info!(url = %record.url, bid = %request, "Bid placed");
                }
                BidOutcome::Aborted(step) => {
                    report.aborted += 1;
                    warn!(url = %record.url, %step, "Bid attempt aborted");
                }
            }
        }

        info!(
            placed = report.placed,
            aborted = report.aborted,
            skipped = report.missing_url,
            "Bidding run complete"
        );
        Ok(report)
    }

    /// Walk the bid form on one question page.
    ///
    /// Each step first checks its control exists; a missing control
    /// yields `BidOutcome::Aborted` naming the step. Driver errors
    /// (navigation, session) propagate.
    pub async fn place_bid(
        &self,
        driver: &dyn PageDriver,
        url: &str,
    ) -> Result<BidOutcome, crate::driver::DriverError> {
        let timeout = Duration::from_secs(self.cfg.page_timeout_secs);

        info!(url, "Opening question");
        driver.goto(url, timeout).await?;

        // Let the bid widget render.
        tokio::time::sleep(Duration::from_millis(self.cfg.settle_delay_ms)).await;

        let request = BidRequest::sample(
            self.cfg.price_range(),
            self.cfg.delivery_range(),
            &mut rand::thread_rng(),
        );
        info!(
            bid_price = request.bid_price,
            delivery_hours = request.delivery_hours,
            "Submitting bid"
        );

        if let Some(abort) = self
            .click_step(driver, selectors::PRICE_DROPDOWN, BidAbort::PriceControlMissing)
            .await?
        {
            return Ok(BidOutcome::Aborted(abort));
        }
        tokio::time::sleep(Duration::from_millis(self.cfg.dropdown_pause_ms)).await;

        let option = selectors::price_option(request.bid_price);
        let unavailable = BidAbort::PriceOptionUnavailable(request.bid_price);
        if let Some(abort) = self.click_step(driver, &option, unavailable).await? {
            return Ok(BidOutcome::Aborted(abort));
        }

        if let Some(abort) = self
            .fill_step(
                driver,
                selectors::DELIVERY_INPUT,
                &request.delivery_hours.to_string(),
                BidAbort::DeliveryInputMissing,
            )
            .await?
        {
            return Ok(BidOutcome::Aborted(abort));
        }

        if let Some(abort) = self
            .click_step(driver, selectors::FINALIZE, BidAbort::FinalizeControlMissing)
            .await?
        {
            return Ok(BidOutcome::Aborted(abort));
        }

        if let Some(abort) = self
            .click_step(driver, selectors::SUBMIT, BidAbort::SubmitControlMissing)
            .await?
        {
            return Ok(BidOutcome::Aborted(abort));
        }

        Ok(BidOutcome::Placed(request))
    }

    /// Click one form control, yielding `abort` if it is absent.
    ///
    /// A control that vanishes between the existence check and the
    /// click also counts as absent. Other driver errors propagate.
    async fn click_step(
        &self,
        driver: &dyn PageDriver,
        selector: &str,
        abort: BidAbort,
    ) -> Result<Option<BidAbort>, crate::driver::DriverError> {
        if !driver.exists(selector).await? {
            return Ok(Some(abort));
        }
        match driver.click(selector).await {
            Ok(()) => Ok(None),
            Err(e) if e.is_element_missing() => Ok(Some(abort)),
            Err(e) => Err(e),
        }
    }

    /// Fill one form input, yielding `abort` if it is absent.
    async fn fill_step(
        &self,
        driver: &dyn PageDriver,
        selector: &str,
        value: &str,
        abort: BidAbort,
    ) -> Result<Option<BidAbort>, crate::driver::DriverError> {
        if !driver.exists(selector).await? {
            return Ok(Some(abort));
        }
        match driver.fill(selector, value).await {
            Ok(()) => Ok(None),
            Err(e) if e.is_element_missing() => Ok(Some(abort)),
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
