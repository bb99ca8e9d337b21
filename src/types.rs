//! Shared types for the POOLBID tool.
//!
//! These types form the data model used across all modules: the
//! question record scraped from the listing page, the typed per-record
//! extraction outcome, and the randomized bid parameters.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

// ---------------------------------------------------------------------------
// QuestionRecord
// ---------------------------------------------------------------------------

/// One question listing entry, as persisted to the shared store.
///
/// `deadline` and `price` keep the raw marketplace text (e.g. `"10 H"`,
/// `"$65.00"`); parsed views are available via [`QuestionRecord::price_value`]
/// and [`QuestionRecord::deadline_hours`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(default)]
    pub title: String,
    /// Free-text category label, e.g. "Programming".
    #[serde(default)]
    pub subject: String,
    /// Raw deadline text: integer + "H" (hours) or integer + "D" (days).
    #[serde(default)]
    pub deadline: String,
    /// Raw currency text, e.g. "$65.00".
    #[serde(default)]
    pub price: String,
    /// Absolute URL of the question detail page.
    #[serde(default)]
    pub url: String,
}

impl fmt::Display for QuestionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({} | {})",
            self.subject, self.title, self.price, self.deadline,
        )
    }
}

impl QuestionRecord {
    /// Parsed numeric price, or `None` if the raw text is unusable.
    pub fn price_value(&self) -> Option<f64> {
        parse_price(&self.price)
    }

    /// Parsed deadline in hours (unparsable text counts as zero).
    pub fn deadline_hours(&self) -> u32 {
        parse_deadline(&self.deadline).unwrap_or(0)
    }

    /// Helper to build a test/sample record with sensible defaults.
    #[cfg(test)]
    pub fn sample() -> Self {
        QuestionRecord {
            title: "Fix a segfault in my C assignment".to_string(),
            subject: "Programming".to_string(),
            deadline: "10 H".to_string(),
            price: "$65.00".to_string(),
            url: "https://www.studypool.com/questions/12345".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction outcomes
// ---------------------------------------------------------------------------

/// Result of trying to extract one listing entry from the page.
///
/// Skips are a typed, inspectable outcome rather than a swallowed
/// exception, so tests and logs can tell exactly why an entry fell out.
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    Kept(QuestionRecord),
    Skipped(SkipReason),
}

/// Why a listing entry was dropped during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingTitle,
    MissingSubject,
    MissingDeadline,
    MissingPrice,
    MissingUrl,
    /// All five fields were present but the price text would not parse.
    UnparsablePrice(String),
    /// Deadline carried an H/D suffix but no usable hour count.
    UnparsableDeadline(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingTitle => write!(f, "title element missing"),
            SkipReason::MissingSubject => write!(f, "subject element missing"),
            SkipReason::MissingDeadline => write!(f, "deadline element missing"),
            SkipReason::MissingPrice => write!(f, "price element missing"),
            SkipReason::MissingUrl => write!(f, "question link missing"),
            SkipReason::UnparsablePrice(raw) => write!(f, "unparsable price text: {raw:?}"),
            SkipReason::UnparsableDeadline(raw) => write!(f, "unparsable deadline text: {raw:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// BidRequest
// ---------------------------------------------------------------------------

/// Randomized parameters for a single bid attempt.
///
/// Never persisted; regenerated on every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidRequest {
    pub bid_price: u32,
    pub delivery_hours: u32,
}

impl BidRequest {
    /// Sample bid parameters uniformly from the given closed ranges.
    pub fn sample<R: Rng>(
        price_range: RangeInclusive<u32>,
        delivery_range: RangeInclusive<u32>,
        rng: &mut R,
    ) -> Self {
        BidRequest {
            bid_price: rng.gen_range(price_range),
            delivery_hours: rng.gen_range(delivery_range),
        }
    }
}

impl fmt::Display for BidRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${} / {} h delivery", self.bid_price, self.delivery_hours)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Convert a currency string (e.g. `"$65.00"`) to its numeric value.
///
/// Strips the dollar sign and surrounding whitespace. Returns `None`
/// when the remainder is not a number.
pub fn parse_price(text: &str) -> Option<f64> {
    text.replace('$', "").trim().parse::<f64>().ok()
}

/// Convert deadline text (e.g. `"10 H"`, `"3 D"`) to hours.
///
/// "H" is checked before "D". Any other suffix (or none) yields zero
/// hours. `None` means a suffix was present but no usable hour count
/// came out of it (bad integer, or a day count too large to express in
/// hours), which disqualifies the record.
pub fn parse_deadline(text: &str) -> Option<u32> {
    if text.contains('H') {
        text.replace('H', "").trim().parse::<u32>().ok()
    } else if text.contains('D') {
        text.replace('D', "")
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(|d| d.checked_mul(24))
    } else {
        Some(0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
