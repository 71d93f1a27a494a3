//! Declarative per-dataset cleaning recipes
//!
//! A recipe is an ordered list of [`Step`]s. It is plain data, so a dataset can
//! be given cleaning rules in the manifest YAML without new code:
//!
//! ```yaml
//! - op: handle_missing
//!   columns: [customer_id]
//!   policy: drop
//! - op: coerce_types
//!   columns:
//!     - [order_created_at, datetime]
//! - op: deduplicate
//!   key: order_id
//!   tie_break: order_created_at
//! ```

use super::{Deduplicator, MissingHandler, MissingPolicy, TargetType, TypeCoercer};
use crate::etl::Transformer;

use eyre::{Context, Result};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// One cleaning operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    HandleMissing {
        columns: Vec<String>,
        #[serde(flatten)]
        policy: MissingPolicy,
    },
    CoerceTypes {
        columns: Vec<(String, TargetType)>,
    },
    Deduplicate {
        key: String,
        tie_break: String,
    },
}

impl Step {
    /// Operation name as written in a recipe
    pub fn name(&self) -> &'static str {
        match self {
            Self::HandleMissing { .. } => "handle_missing",
            Self::CoerceTypes { .. } => "coerce_types",
            Self::Deduplicate { .. } => "deduplicate",
        }
    }
}

impl Transformer for Step {
    type Input = DataFrame;
    type Output = DataFrame;

    fn transform(&self, table: DataFrame) -> Result<DataFrame> {
        match self {
            Self::HandleMissing { columns, policy } => {
                MissingHandler::new(columns.iter().cloned(), policy.clone()).transform(table)
            }
            Self::CoerceTypes { columns } => {
                TypeCoercer::new(columns.iter().cloned()).transform(table)
            }
            Self::Deduplicate { key, tie_break } => {
                Deduplicator::new(key.as_str(), tie_break.as_str()).transform(table)
            }
        }
    }
}

/// Ordered list of steps applied to one dataset
///
/// # Example
/// ```
/// use parquet_etl::etl::Transformer;
/// use parquet_etl::transform::{Recipe, TargetType};
/// use polars::prelude::*;
///
/// let recipe = Recipe::new()
///     .coerce_types([("amount", TargetType::Float)])
///     .deduplicate("id", "created_at");
///
/// let table = df!(
///     "id" => [1i64, 1],
///     "created_at" => ["2024-01-01", "2024-01-02"],
///     "amount" => ["1.5", "2.5"],
/// )
/// .unwrap();
/// let cleaned = recipe.transform(table).unwrap();
/// assert_eq!(cleaned.height(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipe {
    steps: Vec<Step>,
}

impl Recipe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn push(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Append a `handle_missing` step
    pub fn handle_missing<I, S>(self, columns: I, policy: MissingPolicy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Step::HandleMissing {
            columns: columns.into_iter().map(Into::into).collect(),
            policy,
        })
    }

    /// Append a `coerce_types` step
    pub fn coerce_types<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = (S, TargetType)>,
        S: Into<String>,
    {
        self.push(Step::CoerceTypes {
            columns: columns
                .into_iter()
                .map(|(name, target)| (name.into(), target))
                .collect(),
        })
    }

    /// Append a `deduplicate` step
    pub fn deduplicate(self, key: impl Into<String>, tie_break: impl Into<String>) -> Self {
        self.push(Step::Deduplicate {
            key: key.into(),
            tie_break: tie_break.into(),
        })
    }
}

impl FromIterator<Step> for Recipe {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl Transformer for Recipe {
    type Input = DataFrame;
    type Output = DataFrame;

    fn transform(&self, table: DataFrame) -> Result<DataFrame> {
        self.steps
            .iter()
            .enumerate()
            .try_fold(table, |table, (index, step)| {
                log::debug!("Recipe step {}: {}", index + 1, step.name());
                step.transform(table)
                    .with_context(|| format!("Recipe step {} ({}) failed", index + 1, step.name()))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use crate::transform::FillValue;
    use polars::prelude::*;

    #[test]
    fn test_recipe_yaml() {
        let yaml = r#"
- op: handle_missing
  columns: [customer_id]
  policy: drop
- op: handle_missing
  columns: [customer_name]
  policy: fill
  value: n/d
- op: handle_missing
  columns: [minimum_order_value]
  policy: fill
  value: 0
- op: coerce_types
  columns:
    - [order_created_at, datetime]
    - [price_range, int]
- op: deduplicate
  key: order_id
  tie_break: order_created_at
"#;
        let recipe: Recipe = serde_yaml::from_str(yaml).unwrap();

        let expected = Recipe::new()
            .handle_missing(["customer_id"], MissingPolicy::Drop)
            .handle_missing(["customer_name"], MissingPolicy::fill("n/d"))
            .handle_missing(["minimum_order_value"], MissingPolicy::fill(0i64))
            .coerce_types([
                ("order_created_at", TargetType::Datetime),
                ("price_range", TargetType::Integer),
            ])
            .deduplicate("order_id", "order_created_at");
        assert_eq!(recipe, expected);

        // Written back, it reads the same
        let written = serde_yaml::to_string(&recipe).unwrap();
        let reread: Recipe = serde_yaml::from_str(&written).unwrap();
        assert_eq!(reread, recipe);
    }

    #[test]
    fn test_fill_value_kinds_from_yaml() {
        let steps: Vec<Step> = serde_yaml::from_str(
            "- {op: handle_missing, columns: [a], policy: fill, value: 1.5}\n",
        )
        .unwrap();
        assert_eq!(
            steps[0],
            Step::HandleMissing {
                columns: vec!["a".to_string()],
                policy: MissingPolicy::Fill {
                    value: FillValue::Float(1.5)
                },
            }
        );
    }

    #[test]
    fn test_bad_recipe_yaml_is_rejected() {
        let unknown_op = serde_yaml::from_str::<Recipe>("- op: pivot\n  columns: [a]\n");
        assert!(unknown_op.is_err());

        let unknown_type =
            serde_yaml::from_str::<Recipe>("- op: coerce_types\n  columns: [[a, decimal]]\n");
        assert!(unknown_type.is_err());

        let fill_without_value =
            serde_yaml::from_str::<Recipe>("- op: handle_missing\n  columns: [a]\n  policy: fill\n");
        assert!(fill_without_value.is_err());
    }

    #[test]
    fn test_coerce_then_deduplicate() {
        let table = df!(
            "id" => [1i64, 1, 2],
            "created_at" => ["2024-01-01", "2024-01-02", "2024-01-01"],
            "amount" => ["10.5", "bad", "5"],
        )
        .unwrap();

        let output = Recipe::new()
            .coerce_types([("amount", TargetType::Float)])
            .deduplicate("id", "created_at")
            .transform(table)
            .unwrap();

        assert_eq!(output.height(), 2);
        let ids: Vec<Option<i64>> = output
            .column("id")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        let amounts: Vec<Option<f64>> = output
            .column("amount")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);
        assert_eq!(amounts, vec![None, Some(5.0)]);
    }

    #[test]
    fn test_empty_recipe_passes_through() {
        let table = df!("a" => [1i64, 2]).unwrap();
        let output = Recipe::new().transform(table.clone()).unwrap();
        assert!(output.equals_missing(&table));
    }

    #[test]
    fn test_failing_step_is_named() {
        let table = df!("a" => [1i64]).unwrap();
        let err = Recipe::new()
            .coerce_types([("a", TargetType::Float)])
            .deduplicate("missing", "a")
            .transform(table)
            .unwrap_err();

        assert!(format!("{err:#}").contains("Recipe step 2 (deduplicate)"));
        assert!(matches!(
            err.downcast_ref::<EtlError>(),
            Some(EtlError::MissingColumn { .. })
        ));
    }
}
