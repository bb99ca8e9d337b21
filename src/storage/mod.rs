//! Persistence layer.
//!
//! The shared store is a JSON array of question records bridging the
//! collector's output to the bidder's input. It is fully overwritten on
//! every successful collection run and read once per bidding run.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::types::QuestionRecord;

/// Default store file path.
pub const DEFAULT_STORE_FILE: &str = "filtered_questions.json";

/// Save records to the JSON store, replacing any previous content.
pub fn save_records(records: &[QuestionRecord], path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_STORE_FILE);
    let json = serde_json::to_string_pretty(records)
        .context("Failed to serialise question records")?;

    std::fs::write(path, &json)
        .context(format!("Failed to write store to {path}"))?;

    debug!(path, count = records.len(), "Store written");
    Ok(())
}

/// Load records from the JSON store.
/// Returns None if the file doesn't exist (nothing collected yet).
pub fn load_records(path: Option<&str>) -> Result<Option<Vec<QuestionRecord>>> {
    let path = path.unwrap_or(DEFAULT_STORE_FILE);

    if !Path::new(path).exists() {
        info!(path, "No store file found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read store from {path}"))?;

    let records: Vec<QuestionRecord> = serde_json::from_str(&json)
        .context(format!("Failed to parse store from {path}"))?;

    info!(path, count = records.len(), "Store loaded");
    Ok(Some(records))
}

/// Delete the store file (for testing or reset).
pub fn delete_store(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_STORE_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .context(format!("Failed to delete store file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
