//! Parquet ETL
//!
//! Fetches compressed CSV, JSON-lines and tar archives, cleans them with
//! declarative recipes and stores the results as Parquet.

pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod etl;
pub mod extract;
pub mod fetch;
pub mod manifest;
pub mod report;
pub mod storage;
pub mod transform;

// Re-exports for convenience
pub use config::Settings;
pub use driver::BatchDriver;
pub use error::EtlError;
pub use etl::{Extractor, IdentityTransformer, LoadOutcome, Loader, Pipeline, Transformer};
pub use extract::{ArchiveExtractor, ContainerKind};
pub use fetch::Fetcher;
pub use manifest::{SourceEntry, SourcesManifest};
pub use report::{BatchObserver, BatchSummary, LogObserver, SourceOutcome, Stage};
pub use storage::{DataLayout, ParquetLoader};
pub use transform::{Deduplicator, MissingHandler, MissingPolicy, Recipe, TargetType, TypeCoercer};
