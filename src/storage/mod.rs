//! File system storage operations
//!
//! This module handles the on-disk side of the pipeline:
//! - Data directory layout (raw, extracted, processed)
//! - Parquet reading/writing
//! - The final-artifact loader

mod layout;
mod parquet;

pub use layout::{DataLayout, PARQUET_EXTENSION};
pub use parquet::{Compression, ParquetLoader, read_parquet, write_parquet};
