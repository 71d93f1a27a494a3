//! Error taxonomy for the pipeline
//!
//! Components return `eyre::Result` like everything else in the crate. When a
//! failure belongs to one of the classes below it is raised as an [`EtlError`]
//! so callers can tell a configuration mistake from bad source data with
//! `report.downcast_ref::<EtlError>()`.

/// Classified pipeline failures
#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    /// A programming or configuration mistake: bad policy name, unsupported
    /// target type, missing fill value, a table with no columns.
    #[error("configuration error: {0}")]
    Config(String),

    /// Source data that cannot be decoded: corrupt archive, no matching tar
    /// member, CSV parse failure, JSON-lines file without a single record.
    #[error("malformed source {source_name}: {reason}")]
    MalformedSource { source_name: String, reason: String },

    /// An operation referenced a column the table does not have.
    #[error("column '{column}' not found (required by {operation})")]
    MissingColumn {
        column: String,
        operation: &'static str,
    },
}

impl EtlError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn malformed(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSource {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// True for the configuration class
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Check whether an `eyre` report carries a configuration error
pub fn is_config_error(report: &eyre::Report) -> bool {
    report
        .downcast_ref::<EtlError>()
        .is_some_and(EtlError::is_config)
}
