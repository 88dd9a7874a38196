//! Sort specifications.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::schema::{quote_identifier, TableMeta};

/// Order direction for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Ascending order (ASC)
    Asc,
    /// Descending order (DESC)
    Desc,
}

impl OrderDirection {
    /// Returns the opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// SQL keyword for the direction.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// An ordering specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderBy {
    /// Column to order by
    pub column: String,
    /// Order direction
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Creates a new ascending order specification.
    #[must_use]
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: OrderDirection::Asc,
        }
    }

    /// Creates a new descending order specification.
    #[must_use]
    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: OrderDirection::Desc,
        }
    }

    /// Parses an order specification.
    ///
    /// Accepts `col`, `col ASC`, `col DESC` (keywords in any case) and the
    /// `-col` shorthand for descending order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOrder`] for empty or malformed input.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = || CoreError::InvalidOrder(spec.to_string());
        let mut words = spec.split_whitespace();
        let head = words.next().ok_or_else(invalid)?;
        let direction = words.next();
        if words.next().is_some() {
            return Err(invalid());
        }

        if let Some(column) = head.strip_prefix('-') {
            if column.is_empty() || direction.is_some() {
                return Err(invalid());
            }
            return Ok(Self::desc(column));
        }

        match direction.map(str::to_ascii_uppercase).as_deref() {
            None | Some("ASC") => Ok(Self::asc(head)),
            Some("DESC") => Ok(Self::desc(head)),
            Some(_) => Err(invalid()),
        }
    }

    /// Parses `spec` and checks the column exists in `meta`.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::InvalidOrder`] or [`CoreError::UnknownColumn`].
    pub fn parse_for(spec: &str, meta: &TableMeta) -> Result<Self> {
        let order = Self::parse(spec)?;
        meta.column_index(&order.column)?;
        Ok(order)
    }

    /// Returns the same column sorted the other way.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            column: self.column.clone(),
            direction: self.direction.reversed(),
        }
    }

    /// Returns the SQL representation.
    #[must_use]
    pub fn to_sql(&self) -> String {
        format!("{} {}", quote_identifier(&self.column), self.direction.as_sql())
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.direction.as_sql())
    }
}
