//! Gzip-compressed CSV decoding

use super::gunzip;
use crate::error::EtlError;

use eyre::Result;
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;

/// Read a gzip-compressed CSV file with a header row
///
/// # Errors
/// Any decompression or parse error is fatal for the file.
pub fn read_gzip_csv(path: &Path) -> Result<DataFrame> {
    let bytes = gunzip(path)?;
    parse_csv(bytes, &path.display().to_string())
}

/// Parse comma-separated text with a header row
///
/// Column types are inferred over every row, so a column with one non-numeric
/// value stays text and is left for type coercion to sort out.
pub(crate) fn parse_csv(bytes: Vec<u8>, source: &str) -> Result<DataFrame> {
    let table = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| EtlError::malformed(source, format!("CSV parse error: {e}")))?;

    Ok(table)
}
