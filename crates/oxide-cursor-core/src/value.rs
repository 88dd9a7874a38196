//! Field values and parameter handling.
//!
//! Every value that reaches the database travels as a bound parameter; the
//! cursor never splices values into SQL text.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::schema::ColumnType;

/// A field value held by a cursor or bound to a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns true for [`SqlValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Converts a value read from storage into the representation of
    /// `column_type`.
    ///
    /// SQLite stores booleans as integers and may hand back integral reals
    /// as integers; both are mapped back here. Other values pass unchanged.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn normalize_for(self, column_type: ColumnType) -> Self {
        match (column_type, self) {
            (ColumnType::Boolean, Self::Int(i)) => Self::Bool(i != 0),
            (ColumnType::Real, Self::Int(i)) => Self::Float(i as f64),
            (_, value) => value,
        }
    }

    /// Checks that the value may be assigned to a column of `column_type`,
    /// widening integers for real columns.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TypeMismatch`] when the value's type cannot be
    /// stored in the column, or when a real is NaN or infinite.
    #[allow(clippy::cast_precision_loss)]
    pub fn coerce_to(self, column: &str, column_type: ColumnType) -> Result<Self> {
        match (column_type, self) {
            (_, Self::Null) => Ok(Self::Null),
            (ColumnType::Real, Self::Float(x)) if !x.is_finite() => {
                Err(CoreError::TypeMismatch {
                    column: column.to_string(),
                    expected: ColumnType::Real,
                })
            }
            (ColumnType::Integer, v @ Self::Int(_))
            | (ColumnType::Real, v @ Self::Float(_))
            | (ColumnType::Text, v @ Self::Text(_))
            | (ColumnType::Boolean, v @ Self::Bool(_))
            | (ColumnType::Blob, v @ Self::Blob(_)) => Ok(v),
            (ColumnType::Real, Self::Int(i)) => Ok(Self::Float(i as f64)),
            (ColumnType::Boolean, Self::Int(i @ (0 | 1))) => Ok(Self::Bool(i == 1)),
            (expected, _) => Err(CoreError::TypeMismatch {
                column: column.to_string(),
                expected,
            }),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Blob(b) => {
                f.write_str("X'")?;
                for byte in b {
                    write!(f, "{byte:02X}")?;
                }
                f.write_str("'")
            }
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for &SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self.clone()
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}
