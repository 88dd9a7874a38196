//! Error types for table models, filters and statement compilation.

use thiserror::Error;

use crate::schema::ColumnType;

/// Errors raised while validating models, filters and orderings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A column name that the table does not have.
    #[error("No column '{0}' exists in the table")]
    UnknownColumn(String),

    /// The same column was declared twice.
    #[error("Column '{0}' is declared more than once")]
    DuplicateColumn(String),

    /// A per-column filter expression could not be parsed.
    #[error("Invalid filter on column '{column}': {message}")]
    InvalidFilter {
        /// Column the filter was set on.
        column: String,
        /// What went wrong.
        message: String,
    },

    /// A complex filter expression could not be canonicalized.
    #[error("Invalid filter expression: {0}")]
    InvalidExpression(String),

    /// An ORDER BY specification could not be parsed.
    #[error("Invalid ordering '{0}'")]
    InvalidOrder(String),

    /// A value of the wrong type was assigned to a column.
    #[error("Column '{column}' expects a value of type {expected}")]
    TypeMismatch {
        /// Column being assigned.
        column: String,
        /// The column's declared type.
        expected: ColumnType,
    },
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
