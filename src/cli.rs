//! CLI helper functions

use crate::{
    config::Settings, driver::BatchDriver, manifest::SourcesManifest, report::BatchSummary,
};
use eyre::{Result, bail};
use std::path::Path;

/// One line of `pqetl sources` output
#[derive(Debug, Clone, PartialEq)]
pub struct SourceListing {
    pub name: String,
    /// Container kind, `None` when the suffix is unsupported
    pub kind: Option<String>,
    pub artifact: String,
    pub url: String,
    pub steps: usize,
}

/// Run the configured manifest once
///
/// Pipeline per source: Fetcher → ArchiveExtractor → Recipe → ParquetLoader
pub async fn run_batch(settings: &Settings) -> Result<BatchSummary> {
    let manifest = settings.load_manifest()?;
    log::info!(
        "Manifest loaded: {} source(s), data directory {}",
        manifest.count(),
        settings.data_dir.display()
    );

    let driver = BatchDriver::from_settings(settings)?;
    driver.run(&manifest).await
}

/// Describe every source in the configured manifest
pub fn list_sources(settings: &Settings) -> Result<Vec<SourceListing>> {
    let manifest = settings.load_manifest()?;

    Ok(manifest
        .sources
        .iter()
        .map(|entry| SourceListing {
            name: entry.name.clone(),
            kind: entry.container_kind().map(|kind| kind.to_string()),
            artifact: entry.artifact_name(),
            url: entry.url.to_string(),
            steps: entry.recipe.as_ref().map_or(0, |recipe| recipe.steps().len()),
        })
        .collect())
}

/// Write the built-in manifest to `path` for editing
///
/// Returns the number of sources written.
pub fn init_manifest(path: impl AsRef<Path>, force: bool) -> Result<usize> {
    let path = path.as_ref();
    if path.exists() && !force {
        bail!(
            "Manifest already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    let manifest = SourcesManifest::builtin()?;
    manifest.write(path)?;
    log::info!("Wrote {} source(s) to {}", manifest.count(), path.display());
    Ok(manifest.count())
}
