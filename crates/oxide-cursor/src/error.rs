//! Error types for cursors, sessions and schema reflection.

use oxide_cursor_core::CoreError;

/// Errors that can occur while working with a cursor.
#[derive(Debug, thiserror::Error)]
pub enum CursorError {
    /// A navigation command contained a character outside `=<>+-`.
    #[error("Invalid navigation command: '{0}'")]
    InvalidNavigationCommand(char),

    /// A column name that the table does not have.
    #[error("No column '{0}' exists in the table")]
    UnknownColumn(String),

    /// The operation needs a current record with a complete key.
    #[error("No current record")]
    NoCurrentRecord,

    /// No record matched.
    #[error("Record not found")]
    RecordNotFound,

    /// The cursor (or shadow record) has been closed.
    #[error("Cursor is closed")]
    CursorClosed,

    /// Database error.
    #[error("Database error: {0}")]
    DataAccess(#[from] sqlx::Error),

    /// Model, filter or ordering error.
    #[error(transparent)]
    Core(CoreError),

    /// A cursor was opened on a table without a primary key.
    #[error("Table '{0}' has no primary key")]
    MissingPrimaryKey(String),

    /// Two cursors over different tables were combined.
    #[error("Cursor is over table '{found}', expected '{expected}'")]
    TableMismatch {
        /// Table of the receiving cursor.
        expected: String,
        /// Table of the other cursor.
        found: String,
    },

    /// A key with the wrong number of values was supplied.
    #[error("Primary key has {expected} columns, got {found} values")]
    KeyArity {
        /// Number of key columns.
        expected: usize,
        /// Number of values supplied.
        found: usize,
    },

    /// A statement handle the session does not know.
    #[error("Unknown statement handle {0}")]
    UnknownStatement(u64),

    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// IO error (starting the session runtime).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for CursorError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownColumn(name) => Self::UnknownColumn(name),
            other => Self::Core(other),
        }
    }
}

/// Result type for cursor operations.
pub type Result<T> = std::result::Result<T, CursorError>;
