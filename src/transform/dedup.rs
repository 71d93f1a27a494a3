//! Duplicate resolution

use super::require_column;
use crate::etl::Transformer;

use eyre::{Context, Result};
use polars::prelude::*;
use std::collections::HashSet;

/// Transformer that keeps one row per key value
///
/// Rows are stably sorted by `tie_break` descending with nulls last, then the
/// first row for each distinct key is kept. Null keys count as one value.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    key: String,
    tie_break: String,
}

impl Deduplicator {
    pub fn new(key: impl Into<String>, tie_break: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            tie_break: tie_break.into(),
        }
    }
}

impl Transformer for Deduplicator {
    type Input = DataFrame;
    type Output = DataFrame;

    fn transform(&self, table: Self::Input) -> Result<Self::Output> {
        require_column(&table, &self.key, "deduplicate")?;
        require_column(&table, &self.tie_break, "deduplicate")?;

        log::info!(
            "Removing duplicates on '{}', keeping latest '{}'",
            self.key,
            self.tie_break
        );

        let sorted = table
            .sort(
                [self.tie_break.as_str()],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_nulls_last(true)
                    .with_maintain_order(true),
            )
            .with_context(|| format!("Failed to sort by '{}'", self.tie_break))?;

        let keys = sorted
            .column(&self.key)?
            .cast(&DataType::String)
            .with_context(|| format!("Failed to read key column '{}'", self.key))?;

        let mut seen: HashSet<Option<&str>> = HashSet::new();
        let keep: Vec<IdxSize> = keys
            .str()?
            .into_iter()
            .enumerate()
            .filter(|(_, key)| seen.insert(*key))
            .map(|(index, _)| index as IdxSize)
            .collect();

        let before = sorted.height();
        let output = sorted.take(&IdxCa::from_vec("keep".into(), keep))?;

        log::info!(
            "Removed {} duplicate row(s), {} remain",
            before - output.height(),
            output.height()
        );
        Ok(output)
    }
}
