//! Parquet file operations

use crate::error::EtlError;
use crate::etl::{LoadOutcome, Loader};

use eyre::{Context, Result};
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Compression applied to a Parquet file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Polars' default codec; used for final artifacts
    #[default]
    Default,
    /// Gzip; used for raw snapshots
    Gzip,
}

/// Write a table to a Parquet file
///
/// The file is written to a `.tmp` sibling first and renamed into place, so a
/// half-written file never carries the final name.
pub fn write_parquet(table: &DataFrame, path: &Path, compression: Compression) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let tmp_path = path.with_extension("parquet.tmp");
    let file = fs::File::create(&tmp_path)
        .with_context(|| format!("Failed to create file: {}", tmp_path.display()))?;

    let writer = match compression {
        Compression::Default => ParquetWriter::new(file),
        Compression::Gzip => ParquetWriter::new(file).with_compression(ParquetCompression::Gzip(None)),
    };

    let write_result = writer
        .finish(&mut table.clone())
        .with_context(|| format!("Failed to write Parquet file: {}", tmp_path.display()));

    if let Err(e) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        eyre::Report::new(e).wrap_err(format!("Failed to move Parquet file into {}", path.display()))
    })?;

    Ok(())
}

/// Read a Parquet file into a table
pub fn read_parquet(path: &Path) -> Result<DataFrame> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open Parquet file: {}", path.display()))?;
    ParquetReader::new(file)
        .finish()
        .with_context(|| format!("Failed to read Parquet file: {}", path.display()))
}

/// Loader that persists a table as `{output_dir}/{artifact}.parquet`
pub struct ParquetLoader {
    output_dir: PathBuf,
    artifact: String,
}

impl ParquetLoader {
    /// Create a loader for one artifact
    ///
    /// # Arguments
    /// * `output_dir` - Directory the artifact is written to (created on demand)
    /// * `artifact` - Artifact name, without extension
    pub fn new(output_dir: impl AsRef<Path>, artifact: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            artifact: artifact.into(),
        }
    }

    /// Full path of the artifact file
    pub fn path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.artifact, super::PARQUET_EXTENSION))
    }

    /// Validate and write a table
    ///
    /// A table without columns is a configuration error. An empty table is
    /// skipped with a warning. Write failures are logged and reported as
    /// [`LoadOutcome::Failed`].
    pub fn write(&self, table: &DataFrame) -> Result<LoadOutcome> {
        if table.width() == 0 {
            return Err(EtlError::config(format!(
                "cannot load '{}': input is not a table (no columns)",
                self.artifact
            ))
            .into());
        }

        if table.height() == 0 {
            log::warn!("Table for '{}' is empty, no data to load", self.artifact);
            return Ok(LoadOutcome::SkippedEmpty);
        }

        let path = self.path();
        log::info!("Loading {} row(s) into {}", table.height(), path.display());

        match write_parquet(table, &path, Compression::Default) {
            Ok(()) => {
                log::info!("Data loaded into {}", path.display());
                Ok(LoadOutcome::Written {
                    rows: table.height(),
                    path,
                })
            }
            Err(e) => {
                log::error!("Error loading '{}': {:#}", self.artifact, e);
                Ok(LoadOutcome::Failed {
                    reason: format!("{:#}", e),
                })
            }
        }
    }
}

impl Loader for ParquetLoader {
    type Item = DataFrame;

    async fn load(&self, item: Self::Item) -> Result<LoadOutcome> {
        self.write(&item)
    }
}
