//! Missing value handling
//!
//! Either fills nulls in the named columns with a constant, or drops every row
//! with a null in any of them.

use super::require_column;
use crate::error::EtlError;
use crate::etl::Transformer;

use eyre::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Constant used to fill nulls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FillValue {
    fn to_expr(&self) -> Expr {
        match self {
            Self::Int(v) => lit(*v),
            Self::Float(v) => lit(*v),
            Self::Text(v) => lit(v.clone()),
        }
    }
}

impl From<i64> for FillValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for FillValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FillValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// What to do with nulls
///
/// In a recipe this is written as `policy: drop` or `policy: fill` plus a
/// `value:` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Replace every null with `value`
    Fill { value: FillValue },
    /// Remove rows with a null in any named column
    Drop,
}

impl MissingPolicy {
    /// Shorthand for `MissingPolicy::Fill { value }`
    pub fn fill(value: impl Into<FillValue>) -> Self {
        Self::Fill {
            value: value.into(),
        }
    }

    /// Build a policy from a policy name and an optional fill value
    ///
    /// # Errors
    /// `"fill"` without a value and unknown policy names are configuration
    /// errors.
    pub fn parse(name: &str, value: Option<FillValue>) -> Result<Self, EtlError> {
        match (name, value) {
            ("fill", Some(value)) => Ok(Self::Fill { value }),
            ("fill", None) => Err(EtlError::config(
                "a fill value must be provided for the 'fill' policy",
            )),
            ("drop", _) => Ok(Self::Drop),
            (other, _) => Err(EtlError::config(format!(
                "invalid missing-data policy '{other}', use 'fill' or 'drop'"
            ))),
        }
    }
}

/// Transformer that fills or drops nulls in a set of columns
///
/// # Example
/// ```
/// use parquet_etl::etl::Transformer;
/// use parquet_etl::transform::{MissingHandler, MissingPolicy};
/// use polars::prelude::*;
///
/// let table = df!("min_order" => [Some(10.0f64), None]).unwrap();
/// let filled = MissingHandler::new(["min_order"], MissingPolicy::fill(0.0))
///     .transform(table)
///     .unwrap();
/// assert_eq!(filled.column("min_order").unwrap().null_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MissingHandler {
    columns: Vec<String>,
    policy: MissingPolicy,
}

impl MissingHandler {
    pub fn new<I, S>(columns: I, policy: MissingPolicy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            policy,
        }
    }
}

impl Transformer for MissingHandler {
    type Input = DataFrame;
    type Output = DataFrame;

    fn transform(&self, table: Self::Input) -> Result<Self::Output> {
        if self.columns.is_empty() {
            return Ok(table);
        }
        for column in &self.columns {
            require_column(&table, column, "handle_missing")?;
        }

        log::info!("Handling missing data in {:?}", self.columns);

        let output = match &self.policy {
            MissingPolicy::Fill { value } => {
                let fills: Vec<Expr> = self
                    .columns
                    .iter()
                    .map(|name| col(name.as_str()).fill_null(value.to_expr()))
                    .collect();
                table.lazy().with_columns(fills).collect()?
            }
            MissingPolicy::Drop => {
                let before = table.height();
                let complete = self
                    .columns
                    .iter()
                    .map(|name| col(name.as_str()).is_not_null())
                    .reduce(|acc, next| acc.and(next))
                    .unwrap_or_else(|| lit(true));
                let kept = table.lazy().filter(complete).collect()?;
                log::info!(
                    "Dropped {} row(s) with missing {:?}",
                    before - kept.height(),
                    self.columns
                );
                kept
            }
        };

        log::info!("Missing data handling completed");
        Ok(output)
    }
}
