//! Column type coercion
//!
//! Coercion is best effort: a value that can't be converted becomes null and
//! the rest of the column converts normally. Text is trimmed before numbers
//! are parsed, and an integer must have no fractional part.

use crate::error::EtlError;
use crate::etl::Transformer;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use eyre::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Text layouts tried, in order, after RFC 3339
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const SECONDS_PER_DAY: i64 = 86_400;

/// Type a column is converted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    /// Microsecond timestamp, UTC
    Datetime,
    /// Calendar date
    Date,
    /// 64-bit signed integer
    #[serde(alias = "int")]
    Integer,
    /// 64-bit float
    Float,
    /// UTF-8 text
    #[serde(alias = "str")]
    String,
}

impl TargetType {
    fn dtype(self) -> DataType {
        match self {
            Self::Datetime => DataType::Datetime(TimeUnit::Microseconds, None),
            Self::Date => DataType::Date,
            Self::Integer => DataType::Int64,
            Self::Float => DataType::Float64,
            Self::String => DataType::String,
        }
    }
}

impl FromStr for TargetType {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "datetime" => Ok(Self::Datetime),
            "date" => Ok(Self::Date),
            "int" | "integer" => Ok(Self::Integer),
            "float" => Ok(Self::Float),
            "str" | "string" => Ok(Self::String),
            other => Err(EtlError::config(format!("unsupported target type '{other}'"))),
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Datetime => "datetime",
            Self::Date => "date",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
        };
        f.write_str(name)
    }
}

/// Transformer that converts columns to declared types, in order
///
/// Columns the table doesn't have are skipped with a warning.
#[derive(Debug, Clone)]
pub struct TypeCoercer {
    columns: Vec<(String, TargetType)>,
}

impl TypeCoercer {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, TargetType)>,
        S: Into<String>,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|(name, target)| (name.into(), target))
                .collect(),
        }
    }
}

impl Transformer for TypeCoercer {
    type Input = DataFrame;
    type Output = DataFrame;

    fn transform(&self, mut table: Self::Input) -> Result<Self::Output> {
        log::info!("Converting {} column(s)", self.columns.len());

        for (name, target) in &self.columns {
            let (converted, failed) = {
                let Ok(column) = table.column(name) else {
                    log::warn!("Column '{}' not found in table. Skipping.", name);
                    continue;
                };
                let converted = coerce_column(column, *target)
                    .with_context(|| format!("Failed to convert column '{name}' to {target}"))?;
                let failed = converted
                    .null_count()
                    .saturating_sub(column.null_count());
                (converted, failed)
            };

            if failed > 0 {
                log::warn!(
                    "{} value(s) in '{}' could not be converted to {} and were set to null",
                    failed,
                    name,
                    target
                );
            }

            table.with_column(converted)?;
            log::debug!("Column '{}' converted to {}", name, target);
        }

        Ok(table)
    }
}

/// Convert one column, turning unconvertible values into nulls
pub fn coerce_column(column: &Column, target: TargetType) -> Result<Column> {
    let converted = match (target, column.dtype()) {
        (TargetType::Datetime, DataType::String) => {
            let micros: Vec<Option<i64>> = column
                .str()?
                .into_iter()
                .map(|value| value.and_then(parse_datetime))
                .map(|value| value.map(|dt| dt.and_utc().timestamp_micros()))
                .collect();
            Column::new(column.name().clone(), micros).cast(&target.dtype())?
        }
        (TargetType::Date, DataType::String) => {
            let days: Vec<Option<i32>> = column
                .str()?
                .into_iter()
                .map(|value| value.and_then(parse_datetime))
                .map(|value| {
                    value.map(|dt| dt.and_utc().timestamp().div_euclid(SECONDS_PER_DAY) as i32)
                })
                .collect();
            Column::new(column.name().clone(), days).cast(&target.dtype())?
        }
        (TargetType::Integer, DataType::String) => {
            let values: Vec<Option<i64>> = column
                .str()?
                .into_iter()
                .map(|value| value.and_then(parse_integer))
                .collect();
            Column::new(column.name().clone(), values)
        }
        (TargetType::Integer, DataType::Float32 | DataType::Float64) => {
            let values: Vec<Option<i64>> = column
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|value| value.and_then(whole_number))
                .collect();
            Column::new(column.name().clone(), values)
        }
        (TargetType::Float, DataType::String) => {
            let values: Vec<Option<f64>> = column
                .str()?
                .into_iter()
                .map(|value| value.and_then(parse_float))
                .collect();
            Column::new(column.name().clone(), values)
        }
        (TargetType::String, DataType::List(_) | DataType::Struct(_)) => nested_to_json(column)?,
        _ => column.cast(&target.dtype())?,
    };

    Ok(converted)
}

fn parse_float(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| !number.is_nan())
}

fn parse_integer(value: &str) -> Option<i64> {
    let value = value.trim();
    value
        .parse::<i64>()
        .ok()
        .or_else(|| parse_float(value).and_then(whole_number))
}

/// `10.0` converts, `10.5` and out-of-range values don't
fn whole_number(value: f64) -> Option<i64> {
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as i64)
}

/// Render list and struct values as JSON text
fn nested_to_json(column: &Column) -> Result<Column> {
    let mut frame = DataFrame::new(vec![column.clone()])?;
    let mut buffer = Vec::new();
    JsonWriter::new(&mut buffer)
        .with_json_format(JsonFormat::JsonLines)
        .finish(&mut frame)?;

    let key = column.name().as_str();
    let values = buffer
        .split(|byte| *byte == b'\n')
        .filter(|line| !line.is_empty())
        .map(|line| -> Result<Option<String>> {
            let mut record: Map<String, Value> = serde_json::from_slice(line)?;
            Ok(match record.remove(key) {
                None | Some(Value::Null) => None,
                Some(value) => Some(value.to_string()),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Column::new(column.name().clone(), values))
}

/// Parse a text timestamp, normalising offsets to UTC
///
/// A bare date parses as midnight.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
