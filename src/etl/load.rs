//! Loader trait for persisting data to destinations

use eyre::Result;
use std::path::PathBuf;

/// What a loader did with the value it was given
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The value was persisted
    Written { rows: usize, path: PathBuf },
    /// Nothing to persist; not an error
    SkippedEmpty,
    /// Persisting failed; the failure was logged and absorbed
    Failed { reason: String },
}

impl LoadOutcome {
    /// Rows persisted (zero unless written)
    pub fn rows(&self) -> usize {
        match self {
            Self::Written { rows, .. } => *rows,
            _ => 0,
        }
    }
}

/// Loader trait for loading data to a destination
///
/// Implementors define how to persist a value:
/// - Parquet files
/// - Other columnar formats
///
/// I/O trouble at the destination is reported through
/// [`LoadOutcome::Failed`] rather than an error so one bad write never aborts a
/// batch. `Err` is reserved for invalid input.
///
/// # Example
/// ```no_run
/// use parquet_etl::etl::{LoadOutcome, Loader};
/// use eyre::Result;
/// use polars::prelude::*;
///
/// struct CountingLoader;
///
/// impl Loader for CountingLoader {
///     type Item = DataFrame;
///
///     async fn load(&self, item: Self::Item) -> Result<LoadOutcome> {
///         Ok(LoadOutcome::Written { rows: item.height(), path: "memory".into() })
///     }
/// }
/// ```
pub trait Loader: Send + Sync {
    /// The type of value to load
    type Item: Send;

    /// Load a value to the destination
    ///
    /// # Errors
    /// Returns an error if the value is not loadable (validation)
    fn load(
        &self,
        item: Self::Item,
    ) -> impl std::future::Future<Output = Result<LoadOutcome>> + Send;
}
