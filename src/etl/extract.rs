//! Extractor trait for pulling a table out of a source

use eyre::Result;

/// Extractor trait for extracting data from a source
///
/// Implementors define how to turn a source into a value the rest of the
/// pipeline can work on, such as:
/// - Compressed archives on disk
/// - Cached columnar snapshots
/// - In-memory fixtures in tests
///
/// # Example
/// ```no_run
/// use parquet_etl::etl::Extractor;
/// use eyre::Result;
/// use polars::prelude::*;
///
/// struct FixtureExtractor;
///
/// impl Extractor for FixtureExtractor {
///     type Output = DataFrame;
///
///     async fn extract(&self) -> Result<Self::Output> {
///         Ok(df!("id" => [1i64, 2, 3])?)
///     }
/// }
/// ```
pub trait Extractor: Send + Sync {
    /// The type produced by extraction
    type Output: Send;

    /// Extract from the source
    ///
    /// # Errors
    /// Returns an error if extraction fails (I/O, decompression, parsing, etc.)
    fn extract(&self) -> impl std::future::Future<Output = Result<Self::Output>> + Send;
}
