//! Data directory layout

use eyre::{Context, Result};
use std::path::{Path, PathBuf};

/// Extension used for every columnar file the pipeline writes
pub const PARQUET_EXTENSION: &str = "parquet";

/// Layout of the data directory
///
/// ```text
/// {root}/raw/<name>                  fetched compressed originals
/// {root}/extracted/<stem>.parquet    decoded raw snapshots
/// {root}/processed/<artifact>.parquet final artifacts
/// ```
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Create the three stage directories if they don't exist
    pub fn ensure(&self) -> Result<()> {
        for dir in [self.raw_dir(), self.extracted_dir(), self.processed_dir()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    pub fn extracted_dir(&self) -> PathBuf {
        self.root.join("extracted")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join("processed")
    }

    /// Where a fetched file lands
    pub fn raw_path(&self, name: &str) -> PathBuf {
        self.raw_dir().join(name)
    }

    /// Where the raw snapshot of a dataset lands
    pub fn snapshot_path(&self, stem: &str) -> PathBuf {
        self.extracted_dir()
            .join(format!("{}.{}", stem, PARQUET_EXTENSION))
    }

    /// Where the final artifact of a dataset lands
    pub fn artifact_path(&self, artifact: &str) -> PathBuf {
        self.processed_dir()
            .join(format!("{}.{}", artifact, PARQUET_EXTENSION))
    }

    /// List artifact names currently present in the processed directory
    pub fn list_artifacts(&self) -> Result<Vec<String>> {
        let dir = self.processed_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut artifacts = Vec::new();

        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();

            if let Some(ext) = path.extension().and_then(|s| s.to_str())
                && ext == PARQUET_EXTENSION
                && let Some(name) = path.file_stem().and_then(|s| s.to_str())
            {
                artifacts.push(name.to_string());
            }
        }

        artifacts.sort();
        Ok(artifacts)
    }
}
