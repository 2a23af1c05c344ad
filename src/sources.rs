//! Raw record files.
//!
//! Accepts the shapes upstream news exports come in: a top-level JSON array
//! of objects (spreadsheet dumps), or a response object carrying the
//! objects under `articles` (NewsAPI) or `results` (NYT Top Stories).

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;
use tracing::warn;

use crate::models::RawRecord;

pub fn load_raw_records(path: &Path) -> Result<Vec<RawRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read records file: {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse records file: {}", path.display()))?;
    extract_records(value)
}

pub fn extract_records(value: Value) -> Result<Vec<RawRecord>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match ["articles", "results"]
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            }) {
            Some(items) => items,
            None => bail!("Expected a JSON array, or an object with an 'articles' or 'results' array"),
        },
        _ => bail!("Expected a JSON array, or an object with an 'articles' or 'results' array"),
    };

    let total = items.len();
    let records: Vec<RawRecord> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();
    if records.len() < total {
        warn!(
            skipped = total - records.len(),
            "skipping entries that are not JSON objects"
        );
    }
    Ok(records)
}
