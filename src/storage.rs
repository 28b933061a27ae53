use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::normalize::{MalformedRecord, Normalized, RawEventBatch, normalize_batch};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse event JSON: {0}")]
    JsonDecode(serde_json::Error),
    #[error("unsupported event file layout: expected a list or a date-keyed object, found {0}")]
    UnsupportedShape(&'static str),
}

/// Records read from an event file, plus the lines that never parsed as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedBatch {
    pub batch: RawEventBatch,
    pub rejected: Vec<MalformedRecord>,
}

/// Loads a raw batch from `path`.
///
/// `.jsonl` files hold one record per line; lines that are not valid JSON are
/// logged and reported in `rejected`. Anything else is read as one JSON document.
pub fn load_raw_events(path: &Path) -> Result<LoadedBatch, StorageError> {
    let raw = fs::read_to_string(path).map_err(|source| StorageError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let loaded = if is_jsonl(path) {
        parse_jsonl(&raw)
    } else {
        LoadedBatch {
            batch: parse_json(&raw)?,
            rejected: Vec::new(),
        }
    };

    info!(
        "event=events_loaded module=storage path={} records={} rejected={}",
        path.display(),
        loaded.batch.len(),
        loaded.rejected.len()
    );
    Ok(loaded)
}

/// Loads and normalizes in one step. Unparseable lines and malformed records
/// both end up in `skipped`.
pub fn load_events(path: &Path) -> Result<Normalized, StorageError> {
    let loaded = load_raw_events(path)?;
    let mut normalized = normalize_batch(&loaded.batch);
    let mut skipped = loaded.rejected;
    skipped.append(&mut normalized.skipped);
    normalized.skipped = skipped;
    Ok(normalized)
}

pub fn parse_json(raw: &str) -> Result<RawEventBatch, StorageError> {
    if raw.trim().is_empty() {
        return Ok(RawEventBatch::List(Vec::new()));
    }

    let document: Value = serde_json::from_str(raw).map_err(StorageError::JsonDecode)?;
    batch_from_value(document)
}

pub fn parse_jsonl(raw: &str) -> LoadedBatch {
    let mut records = Vec::new();
    let mut rejected = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(
                    "event=line_skipped module=storage line={} reason=\"{}\"",
                    index + 1,
                    err
                );
                rejected.push(MalformedRecord::Shape {
                    position: format!("line#{}", index + 1),
                    reason: err.to_string(),
                });
            }
        }
    }
    LoadedBatch {
        batch: RawEventBatch::List(records),
        rejected,
    }
}

/// Accepts a flat list, or an object keyed by date whose values are lists of
/// records (or a single record).
pub fn batch_from_value(document: Value) -> Result<RawEventBatch, StorageError> {
    match document {
        Value::Array(records) => Ok(RawEventBatch::List(records)),
        Value::Object(days) => {
            let mut by_date = BTreeMap::new();
            for (day, records) in days {
                let records = match records {
                    Value::Array(records) => records,
                    Value::Object(_) => vec![records],
                    Value::Null => Vec::new(),
                    other => {
                        warn!(
                            "event=day_skipped module=storage day={} reason=\"expected records, found {}\"",
                            day,
                            value_kind(&other)
                        );
                        continue;
                    }
                };
                by_date.insert(day, records);
            }
            Ok(RawEventBatch::ByDate(by_date))
        }
        other => Err(StorageError::UnsupportedShape(value_kind(&other))),
    }
}

fn is_jsonl(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("jsonl"))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
