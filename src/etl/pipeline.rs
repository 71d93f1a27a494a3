//! Pipeline orchestration for ETL operations

use super::{Extractor, LoadOutcome, Loader, Transformer};
use eyre::Result;

/// ETL Pipeline that orchestrates Extract, Transform, and Load operations
///
/// # Type Parameters
/// - `E`: Extractor type
/// - `T`: Transformer type (must transform from E::Output)
/// - `L`: Loader type (must load T::Output)
///
/// # Example
/// ```no_run
/// use parquet_etl::etl::{IdentityTransformer, Pipeline};
/// use parquet_etl::extract::{ArchiveExtractor, ContainerKind};
/// use parquet_etl::storage::ParquetLoader;
/// use polars::prelude::DataFrame;
///
/// # async fn example() -> eyre::Result<()> {
/// let pipeline = Pipeline::new(
///     ArchiveExtractor::new("data/raw/consumers.csv.gz", ContainerKind::GzipCsv, "data/extracted/consumers.parquet"),
///     IdentityTransformer::<DataFrame>::new(),
///     ParquetLoader::new("data/processed", "consumers"),
/// );
///
/// let outcome = pipeline.run().await?;
/// println!("Loaded {} rows", outcome.rows());
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<E, T, L> {
    extractor: E,
    transformer: T,
    loader: L,
}

impl<E, T, L> Pipeline<E, T, L>
where
    E: Extractor,
    T: Transformer<Input = E::Output>,
    L: Loader<Item = T::Output>,
{
    /// Create a new pipeline
    pub fn new(extractor: E, transformer: T, loader: L) -> Self {
        Self {
            extractor,
            transformer,
            loader,
        }
    }

    /// Run the complete ETL pipeline
    ///
    /// Steps:
    /// 1. Extract from source
    /// 2. Transform
    /// 3. Load to destination
    ///
    /// The extracted and transformed values are moved through each stage, so
    /// nothing outlives the call.
    ///
    /// # Errors
    /// Returns an error if extraction or transformation fails, or if the
    /// loader rejects its input
    pub async fn run(self) -> Result<LoadOutcome> {
        log::debug!("Extracting from source...");
        let extracted = self.extractor.extract().await?;

        log::debug!("Transforming...");
        let transformed = self.transformer.transform(extracted)?;

        log::debug!("Loading to destination...");
        let outcome = self.loader.load(transformed).await?;
        log::debug!("Load finished: {:?}", outcome);

        Ok(outcome)
    }
}
