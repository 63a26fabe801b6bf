//! Error types for cleaning requests.

use thiserror::Error;

use crate::filter::FilterError;

/// Errors that stop a cleaning request before any change is applied.
#[derive(Debug, Error)]
pub enum CleanError {
    /// The loaded table has no rows or no columns.
    #[error("The uploaded file is empty")]
    EmptyTable,

    /// A column name is blank once surrounding whitespace is trimmed.
    #[error("Column {index} has an empty name after normalization")]
    EmptyColumnName { index: usize },

    /// An operation names a column the table does not have.
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    /// An operation label that does not match any known operation.
    #[error("Unknown operation '{0}'")]
    UnknownOperation(String),

    /// A regex clean pattern that does not compile.
    #[error("Invalid regex pattern for '{column}': {source}")]
    InvalidPattern {
        column: String,
        #[source]
        source: regex::Error,
    },

    /// A conditional filter expression that failed to parse or evaluate.
    #[error("Error in filter expression: {0}")]
    Filter(#[from] FilterError),
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, CleanError>;
