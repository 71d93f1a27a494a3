//! Extraction of compressed source files into tables
//!
//! A source file is decoded according to its [`ContainerKind`]:
//! - plain gzip CSV
//! - gzip JSON-lines
//! - a CSV member inside a gzip tar archive
//!
//! [`ArchiveExtractor`] wraps decoding with the raw snapshot: the decoded table
//! is always written to `extracted/<stem>.parquet` before any cleaning runs,
//! and an existing snapshot is reused instead of decoding again.

mod csv;
mod json_lines;
mod tar_member;

pub use csv::read_gzip_csv;
pub use json_lines::read_gzip_json_lines;
pub use tar_member::read_tar_csv_member;

use crate::etl::Extractor;
use crate::storage::{Compression, read_parquet, write_parquet};

use eyre::{Context, Result};
use flate2::read::MultiGzDecoder;
use polars::prelude::DataFrame;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Member name prefix selected from tar archives unless a source overrides it
pub const DEFAULT_MEMBER_PREFIX: &str = "ab";

/// How a source file is packaged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerKind {
    /// `.csv.gz`
    GzipCsv,
    /// `.json.gz`, one JSON object per line
    GzipJsonLines,
    /// `.tar.gz` holding a CSV member whose name starts with `prefix`
    TarGzipCsvMember { prefix: String },
}

impl ContainerKind {
    /// Resolve the container kind from a file name suffix
    ///
    /// Returns `None` for unsupported suffixes.
    pub fn from_file_name(name: &str) -> Option<Self> {
        if name.ends_with(".tar.gz") {
            Some(Self::TarGzipCsvMember {
                prefix: DEFAULT_MEMBER_PREFIX.to_string(),
            })
        } else if name.ends_with(".csv.gz") {
            Some(Self::GzipCsv)
        } else if name.ends_with(".json.gz") {
            Some(Self::GzipJsonLines)
        } else {
            None
        }
    }

    /// Replace the tar member prefix; other kinds are returned unchanged
    pub fn with_member_prefix(self, prefix: impl Into<String>) -> Self {
        match self {
            Self::TarGzipCsvMember { .. } => Self::TarGzipCsvMember {
                prefix: prefix.into(),
            },
            other => other,
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GzipCsv => write!(f, "gzip csv"),
            Self::GzipJsonLines => write!(f, "gzip json-lines"),
            Self::TarGzipCsvMember { prefix } => write!(f, "tar.gz csv member '{prefix}*.csv'"),
        }
    }
}

/// Decode a local source file into a table
pub fn decode(path: &Path, kind: &ContainerKind) -> Result<DataFrame> {
    match kind {
        ContainerKind::GzipCsv => read_gzip_csv(path),
        ContainerKind::GzipJsonLines => read_gzip_json_lines(path),
        ContainerKind::TarGzipCsvMember { prefix } => read_tar_csv_member(path, prefix),
    }
}

/// Decompress a whole gzip file into memory
///
/// Concatenated gzip members are decoded one after the other.
pub(crate) fn gunzip(path: &Path) -> Result<Vec<u8>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let mut bytes = Vec::new();
    MultiGzDecoder::new(file).read_to_end(&mut bytes).map_err(|e| {
        crate::error::EtlError::malformed(path.display().to_string(), format!("gzip: {e}"))
    })?;

    Ok(bytes)
}

/// Extractor for one compressed source file
///
/// # Example
/// ```no_run
/// use parquet_etl::extract::{ArchiveExtractor, ContainerKind};
/// use parquet_etl::etl::Extractor;
///
/// # async fn example() -> eyre::Result<()> {
/// let extractor = ArchiveExtractor::new(
///     "data/raw/orders.json.gz",
///     ContainerKind::GzipJsonLines,
///     "data/extracted/orders.parquet",
/// );
/// let table = extractor.extract().await?;
/// println!("{} rows", table.height());
/// # Ok(())
/// # }
/// ```
pub struct ArchiveExtractor {
    source: PathBuf,
    kind: ContainerKind,
    snapshot: PathBuf,
    refresh: bool,
}

impl ArchiveExtractor {
    /// Create a new extractor
    ///
    /// # Arguments
    /// * `source` - Compressed file to decode
    /// * `kind` - How the file is packaged
    /// * `snapshot` - Where the decoded table is persisted
    pub fn new(source: impl AsRef<Path>, kind: ContainerKind, snapshot: impl AsRef<Path>) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            kind,
            snapshot: snapshot.as_ref().to_path_buf(),
            refresh: false,
        }
    }

    /// Decode again even when a snapshot exists (default: false)
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    /// Decode the source, or reuse the snapshot, and persist the snapshot
    ///
    /// A snapshot write failure is logged and does not fail extraction.
    pub fn extract_table(&self) -> Result<DataFrame> {
        if !self.refresh && self.snapshot.exists() {
            log::info!(
                "Extracted file already exists, reusing {}",
                self.snapshot.display()
            );
            return read_parquet(&self.snapshot);
        }

        log::info!(
            "Extracting {} ({}) to {}",
            self.source.display(),
            self.kind,
            self.snapshot.display()
        );

        let table = decode(&self.source, &self.kind)?;

        match write_parquet(&table, &self.snapshot, Compression::Gzip) {
            Ok(()) => log::info!(
                "Extraction completed: {} ({} rows, {} columns)",
                self.snapshot.display(),
                table.height(),
                table.width()
            ),
            Err(e) => log::error!(
                "Failed to write snapshot {}: {:#}",
                self.snapshot.display(),
                e
            ),
        }

        Ok(table)
    }
}

impl Extractor for ArchiveExtractor {
    type Output = DataFrame;

    async fn extract(&self) -> Result<Self::Output> {
        self.extract_table()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_container_kind_from_file_name() {
        assert_eq!(
            ContainerKind::from_file_name("ab_test.tar.gz"),
            Some(ContainerKind::TarGzipCsvMember {
                prefix: "ab".to_string()
            })
        );
        assert_eq!(
            ContainerKind::from_file_name("consumers.csv.gz"),
            Some(ContainerKind::GzipCsv)
        );
        assert_eq!(
            ContainerKind::from_file_name("orders.json.gz"),
            Some(ContainerKind::GzipJsonLines)
        );
        assert_eq!(ContainerKind::from_file_name("orders.zip"), None);
        assert_eq!(ContainerKind::from_file_name("notes.csv"), None);
    }

    #[test]
    fn test_member_prefix_override() {
        let kind = ContainerKind::from_file_name("x.tar.gz")
            .unwrap()
            .with_member_prefix("exp");
        assert_eq!(
            kind,
            ContainerKind::TarGzipCsvMember {
                prefix: "exp".to_string()
            }
        );
        assert_eq!(
            ContainerKind::GzipCsv.with_member_prefix("exp"),
            ContainerKind::GzipCsv
        );
    }

    #[tokio::test]
    async fn test_extract_writes_snapshot() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("consumers.csv.gz");
        let snapshot = temp.path().join("extracted").join("consumers.parquet");
        fixtures::write_gzip(&source, "customer_id,customer_name\nc1,Ana\nc2,\n");

        let extractor = ArchiveExtractor::new(&source, ContainerKind::GzipCsv, &snapshot);
        let table = extractor.extract().await.unwrap();

        assert_eq!(table.height(), 2);
        assert!(snapshot.exists());
        assert!(read_parquet(&snapshot).unwrap().equals_missing(&table));
    }

    #[tokio::test]
    async fn test_existing_snapshot_is_reused() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("consumers.csv.gz");
        let snapshot = temp.path().join("consumers.parquet");
        fixtures::write_gzip(&source, "customer_id\nc1\nc2\n");

        let first = ArchiveExtractor::new(&source, ContainerKind::GzipCsv, &snapshot)
            .extract()
            .await
            .unwrap();

        // Source changes, snapshot wins
        fixtures::write_gzip(&source, "customer_id\nc1\nc2\nc3\n");
        let second = ArchiveExtractor::new(&source, ContainerKind::GzipCsv, &snapshot)
            .extract()
            .await
            .unwrap();
        assert_eq!(second.height(), first.height());

        let refreshed = ArchiveExtractor::new(&source, ContainerKind::GzipCsv, &snapshot)
            .with_refresh(true)
            .extract()
            .await
            .unwrap();
        assert_eq!(refreshed.height(), 3);
    }

    #[test]
    fn test_decode_reads_every_gzip_member() {
        let temp = TempDir::new().unwrap();

        let csv = temp.path().join("events.csv.gz");
        fixtures::write_gzip_members(&csv, &["id,v\n1,a\n", "2,b\n3,c\n"]);
        assert_eq!(decode(&csv, &ContainerKind::GzipCsv).unwrap().height(), 3);

        let json = temp.path().join("events.json.gz");
        fixtures::write_gzip_members(
            &json,
            &[
                "{\"id\": 1, \"v\": \"a\"}\n",
                "{\"id\": 2, \"v\": \"b\"}\n{\"id\": 3, \"v\": \"c\"}\n",
            ],
        );
        assert_eq!(decode(&json, &ContainerKind::GzipJsonLines).unwrap().height(), 3);
    }

    #[test]
    fn test_decode_dispatches_on_kind() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mixed.gz");
        fixtures::write_gzip(&path, "{\"a\": 1}\n");

        assert_eq!(decode(&path, &ContainerKind::GzipJsonLines).unwrap().height(), 1);
        // Plain gzip is not a tar archive
        let tar_kind = ContainerKind::from_file_name("mixed.tar.gz").unwrap();
        assert!(decode(&path, &tar_kind).is_err());
    }
}
