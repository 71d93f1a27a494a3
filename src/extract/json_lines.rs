//! Gzip-compressed JSON-lines decoding
//!
//! Each line is an independent JSON object. Lines that don't parse are logged
//! and skipped; the table is built from the rest.

use crate::error::EtlError;

use eyre::{Context, Result};
use flate2::read::MultiGzDecoder;
use polars::prelude::*;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Cursor};
use std::num::NonZeroUsize;
use std::path::Path;

/// Read a gzip-compressed JSON-lines file
///
/// # Errors
/// Returns an error if the file can't be decompressed or if not a single line
/// holds a JSON object.
pub fn read_gzip_json_lines(path: &Path) -> Result<DataFrame> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let reader = BufReader::new(MultiGzDecoder::new(file));
    parse_json_lines(reader, &path.display().to_string())
}

/// Parse JSON-lines text into a table, skipping lines that aren't JSON objects
///
/// A key whose values have more than one JSON type across lines is stored as
/// text, so no value is lost to schema inference.
pub(crate) fn parse_json_lines<R: BufRead>(reader: R, source: &str) -> Result<DataFrame> {
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| EtlError::malformed(source, format!("read error: {e}")))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(record)) => records.push(record),
            Ok(other) => {
                log::warn!(
                    "Skipping line {} of {}: expected a JSON object, found {}",
                    index + 1,
                    source,
                    json_kind(&other)
                );
                skipped += 1;
            }
            Err(e) => {
                log::warn!("Skipping line {} of {}: {}", index + 1, source, e);
                skipped += 1;
            }
        }
    }

    if records.is_empty() {
        return Err(EtlError::malformed(source, "no parseable JSON records").into());
    }

    if skipped > 0 {
        log::warn!("Skipped {} malformed line(s) in {}", skipped, source);
    }
    log::debug!("Parsed {} JSON record(s) from {}", records.len(), source);

    let mixed = mixed_type_keys(&records);
    if !mixed.is_empty() {
        log::warn!(
            "Key(s) {} in {} hold more than one JSON type, storing them as text",
            mixed.join(", "),
            source
        );
    }

    let parsed = records.len();
    let mut buffer = Vec::new();
    for mut record in records {
        for key in &mixed {
            if let Some(value) = record.get_mut(key.as_str()) {
                stringify(value);
            }
        }
        serde_json::to_writer(&mut buffer, &record)
            .map_err(|e| EtlError::malformed(source, format!("JSON encode error: {e}")))?;
        buffer.push(b'\n');
    }

    let table = JsonLineReader::new(Cursor::new(buffer))
        .infer_schema_len(NonZeroUsize::new(parsed))
        .finish()
        .map_err(|e| EtlError::malformed(source, format!("JSON decode error: {e}")))?;

    Ok(table)
}

/// Keys that hold values of more than one JSON type, in first-seen order
///
/// Nulls don't count as a type.
fn mixed_type_keys(records: &[Map<String, Value>]) -> Vec<String> {
    let mut kinds: HashMap<&str, u8> = HashMap::new();
    let mut order = Vec::new();

    for record in records {
        for (key, value) in record {
            let kind = match value {
                Value::Null => continue,
                Value::Bool(_) => 1,
                Value::Number(_) => 2,
                Value::String(_) => 4,
                Value::Array(_) => 8,
                Value::Object(_) => 16,
            };
            let seen = kinds.entry(key.as_str()).or_insert_with(|| {
                order.push(key.as_str());
                0
            });
            *seen |= kind;
        }
    }

    order
        .into_iter()
        .filter(|key| kinds[key].count_ones() > 1)
        .map(str::to_string)
        .collect()
}

/// Replace a non-text value with its JSON text
fn stringify(value: &mut Value) {
    let text = match &*value {
        Value::Null | Value::String(_) => return,
        other => other.to_string(),
    };
    *value = Value::String(text);
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
