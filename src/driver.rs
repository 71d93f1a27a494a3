//! Batch driver
//!
//! Runs every manifest entry through fetch, extract, transform and load, one
//! source at a time. A failing source is recorded and the batch moves on.

use crate::config::Settings;
use crate::etl::{Extractor, LoadOutcome, Loader, Pipeline, Transformer};
use crate::extract::{ArchiveExtractor, ContainerKind};
use crate::fetch::Fetcher;
use crate::manifest::{SourceEntry, SourcesManifest};
use crate::report::{BatchObserver, BatchSummary, LogObserver, SourceOutcome, Stage};
use crate::storage::{DataLayout, ParquetLoader};

use eyre::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Runs a manifest against a data directory
///
/// # Example
/// ```no_run
/// use parquet_etl::driver::BatchDriver;
/// use parquet_etl::fetch::Fetcher;
/// use parquet_etl::manifest::SourcesManifest;
/// use parquet_etl::storage::DataLayout;
///
/// # async fn example() -> eyre::Result<()> {
/// let driver = BatchDriver::new(DataLayout::new("data"), Fetcher::try_new()?);
/// let summary = driver.run(&SourcesManifest::builtin()?).await?;
/// println!("{} source(s) succeeded", summary.succeeded());
/// # Ok(())
/// # }
/// ```
pub struct BatchDriver {
    layout: DataLayout,
    fetcher: Fetcher,
    refresh: bool,
    observer: Arc<dyn BatchObserver>,
}

impl BatchDriver {
    pub fn new(layout: DataLayout, fetcher: Fetcher) -> Self {
        Self {
            layout,
            fetcher,
            refresh: false,
            observer: Arc::new(LogObserver),
        }
    }

    /// Build a driver for the configured data directory
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let fetcher = Fetcher::try_new()?.with_refresh(settings.refresh);
        Ok(Self::new(settings.layout(), fetcher).with_refresh(settings.refresh))
    }

    /// Re-extract even when a snapshot exists (default: false)
    ///
    /// Downloads follow the fetcher's own refresh setting.
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    /// Report progress to `observer` instead of the log
    pub fn with_observer(mut self, observer: Arc<dyn BatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Process every source in manifest order
    ///
    /// # Errors
    /// Only a data directory that can't be created fails the batch; per-source
    /// failures are recorded in the summary.
    pub async fn run(&self, manifest: &SourcesManifest) -> Result<BatchSummary> {
        let started = Instant::now();
        self.layout.ensure()?;
        self.observer.batch_started(manifest.count());

        let mut summary = BatchSummary::default();
        for entry in &manifest.sources {
            let outcome = self.process(entry).await;
            self.observer.source_finished(&entry.name, &outcome);
            summary.push(entry.name.as_str(), outcome);
        }

        summary.elapsed = started.elapsed();
        self.observer.batch_finished(&summary);
        Ok(summary)
    }

    /// Process one source, turning every failure into an outcome
    pub async fn process(&self, entry: &SourceEntry) -> SourceOutcome {
        let Some(kind) = entry.container_kind() else {
            log::warn!("Unsupported file type, skipping: {}", entry.name);
            return SourceOutcome::Unsupported;
        };

        self.observer.stage_started(&entry.name, Stage::Fetch);
        let raw = self.layout.raw_path(&entry.name);
        if !self.fetcher.fetch(&entry.url, &raw).await {
            log::error!("Failed to download {}, skipping", entry.name);
            return SourceOutcome::SkippedDownload;
        }

        match self.process_local(entry, kind, &raw).await {
            Ok(LoadOutcome::Written { rows, .. }) => SourceOutcome::Succeeded { rows },
            Ok(LoadOutcome::SkippedEmpty) => SourceOutcome::SkippedEmpty,
            Ok(LoadOutcome::Failed { reason }) => SourceOutcome::Failed { reason },
            Err(e) => {
                log::error!("Error processing {}: {:?}", entry.name, e);
                SourceOutcome::Failed {
                    reason: format!("{e:#}"),
                }
            }
        }
    }

    async fn process_local(
        &self,
        entry: &SourceEntry,
        kind: ContainerKind,
        raw: &Path,
    ) -> Result<LoadOutcome> {
        let extractor = ArchiveExtractor::new(raw, kind, self.layout.snapshot_path(entry.stem()))
            .with_refresh(self.refresh);
        // An empty recipe passes the table through unchanged
        let recipe = entry.recipe.clone().unwrap_or_default();
        let loader = ParquetLoader::new(self.layout.processed_dir(), entry.artifact_name());

        Pipeline::new(
            self.observed(entry, extractor),
            self.observed(entry, recipe),
            self.observed(entry, loader),
        )
        .run()
        .await
    }

    fn observed<'a, T>(&'a self, entry: &'a SourceEntry, inner: T) -> Observed<'a, T> {
        Observed {
            inner,
            source: &entry.name,
            observer: self.observer.as_ref(),
        }
    }
}

/// Pipeline stage that reports itself to the observer and names the source in
/// its errors
struct Observed<'a, T> {
    inner: T,
    source: &'a str,
    observer: &'a dyn BatchObserver,
}

impl<E: Extractor> Extractor for Observed<'_, E> {
    type Output = E::Output;

    async fn extract(&self) -> Result<Self::Output> {
        self.observer.stage_started(self.source, Stage::Extract);
        self.inner
            .extract()
            .await
            .with_context(|| format!("Extraction failed for {}", self.source))
    }
}

impl<T: Transformer> Transformer for Observed<'_, T> {
    type Input = T::Input;
    type Output = T::Output;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        self.observer.stage_started(self.source, Stage::Transform);
        self.inner
            .transform(input)
            .with_context(|| format!("Transformation failed for {}", self.source))
    }
}

impl<L: Loader> Loader for Observed<'_, L> {
    type Item = L::Item;

    async fn load(&self, item: Self::Item) -> Result<LoadOutcome> {
        self.observer.stage_started(self.source, Stage::Load);
        self.inner
            .load(item)
            .await
            .with_context(|| format!("Loading failed for {}", self.source))
    }
}
