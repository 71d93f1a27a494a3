//! Table cleaning operations
//!
//! Each operation is a [`Transformer`](crate::etl::Transformer) from
//! `DataFrame` to `DataFrame`:
//! - [`MissingHandler`] fills or drops nulls
//! - [`TypeCoercer`] converts columns to declared types
//! - [`Deduplicator`] keeps the latest row per key
//!
//! [`Recipe`] strings them together as data.

mod coerce;
mod dedup;
mod missing;
mod recipe;

pub use coerce::{TargetType, TypeCoercer, coerce_column, parse_datetime};
pub use dedup::Deduplicator;
pub use missing::{FillValue, MissingHandler, MissingPolicy};
pub use recipe::{Recipe, Step};

use crate::error::EtlError;
use polars::prelude::DataFrame;

/// Fail with [`EtlError::MissingColumn`] unless `table` has `column`
pub(crate) fn require_column(
    table: &DataFrame,
    column: &str,
    operation: &'static str,
) -> Result<(), EtlError> {
    match table.get_column_index(column) {
        Some(_) => Ok(()),
        None => Err(EtlError::MissingColumn {
            column: column.to_string(),
            operation,
        }),
    }
}
