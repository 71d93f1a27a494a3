//! CSV member selection inside a gzip tar archive

use super::csv::parse_csv;
use crate::error::EtlError;

use eyre::{Context, Result};
use flate2::read::MultiGzDecoder;
use polars::prelude::DataFrame;
use std::io::Read;
use std::path::Path;

/// Read the first `<prefix>*.csv` regular file in a `.tar.gz` archive
///
/// Members are scanned in archive order. Names are matched on the full member
/// path, so `._ab_test.csv` resource forks and files in subdirectories don't
/// match a bare prefix.
///
/// # Errors
/// Returns an error if the archive is unreadable, no member matches, or the
/// member isn't valid CSV.
pub fn read_tar_csv_member(path: &Path, prefix: &str) -> Result<DataFrame> {
    let source = path.display().to_string();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let mut archive = tar::Archive::new(MultiGzDecoder::new(file));

    let entries = archive
        .entries()
        .map_err(|e| EtlError::malformed(&source, format!("unreadable tar archive: {e}")))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| EtlError::malformed(&source, format!("corrupt tar entry: {e}")))?;

        if !entry.header().entry_type().is_file() {
            continue;
        }

        let name = entry
            .path()
            .map_err(|e| EtlError::malformed(&source, format!("bad member name: {e}")))?
            .to_string_lossy()
            .into_owned();

        if !(name.starts_with(prefix) && name.ends_with(".csv")) {
            log::debug!("Ignoring tar member {}", name);
            continue;
        }

        log::info!("Reading tar member {} from {}", name, source);
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| EtlError::malformed(&source, format!("failed to read {name}: {e}")))?;

        return parse_csv(bytes, &format!("{source}:{name}"));
    }

    Err(EtlError::malformed(
        source,
        format!("no member named '{prefix}*.csv' in archive"),
    )
    .into())
}
