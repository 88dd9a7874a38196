//! Table model types.
//!
//! A [`TableMeta`] describes what the code expects a table to look like:
//! its ordered columns, their types, and the declared primary key. Cursors
//! resolve field names against it once, and schema reflection compares the
//! live catalog against it.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Column types understood by the cursor engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// 64-bit integer.
    Integer,
    /// Double precision float.
    Real,
    /// Text.
    Text,
    /// Boolean, stored as 0/1.
    Boolean,
    /// Binary large object.
    Blob,
}

impl ColumnType {
    /// Returns the SQLite type name.
    #[must_use]
    pub const fn sqlite_name(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
            Self::Blob => "BLOB",
        }
    }

    /// Maps a declared SQLite column type to a column type.
    ///
    /// Follows SQLite's affinity rules, except that `BOOL*` declarations map
    /// to [`ColumnType::Boolean`].
    #[must_use]
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.to_ascii_uppercase();
        if upper.starts_with("BOOL") {
            Self::Boolean
        } else if upper.contains("INT") {
            Self::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            Self::Text
        } else if upper.is_empty() || upper.contains("BLOB") {
            Self::Blob
        } else {
            Self::Real
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sqlite_name())
    }
}

/// Declaration of a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    /// Column name.
    pub name: String,
    /// Column type.
    pub column_type: ColumnType,
    /// Whether the column allows NULL values.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Whether the database generates the value (integer rowid keys).
    #[serde(default)]
    pub auto_increment: bool,
}

const fn default_nullable() -> bool {
    true
}

impl ColumnMeta {
    /// Creates a nullable column.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            auto_increment: false,
        }
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column as database-generated.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }
}

/// Unvalidated table declaration, as written by hand or deserialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBuilder {
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    #[serde(default)]
    pub columns: Vec<ColumnMeta>,
    /// Primary key columns, in key order.
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Primary key constraint name; `pk_<table>` when absent.
    #[serde(default)]
    pub pk_constraint_name: Option<String>,
}

impl TableBuilder {
    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: ColumnMeta) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets the primary key columns, in key order.
    #[must_use]
    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Sets the primary key constraint name.
    #[must_use]
    pub fn pk_constraint(mut self, name: impl Into<String>) -> Self {
        self.pk_constraint_name = Some(name.into());
        self
    }

    /// Validates the declaration and compiles the name index.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::DuplicateColumn`] when a column is declared
    /// twice and with [`CoreError::UnknownColumn`] when the primary key names
    /// an undeclared column.
    pub fn build(self) -> Result<TableMeta> {
        let mut index = HashMap::with_capacity(self.columns.len());
        for (i, column) in self.columns.iter().enumerate() {
            if index.insert(column.name.clone(), i).is_some() {
                return Err(CoreError::DuplicateColumn(column.name.clone()));
            }
        }

        let pk_indices = self
            .primary_key
            .iter()
            .map(|name| {
                index
                    .get(name)
                    .copied()
                    .ok_or_else(|| CoreError::UnknownColumn(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let pk_constraint_name = self
            .pk_constraint_name
            .unwrap_or_else(|| format!("pk_{}", self.name));

        Ok(TableMeta {
            name: self.name,
            columns: self.columns,
            primary_key: self.primary_key,
            pk_constraint_name,
            index,
            pk_indices,
        })
    }
}

/// A validated table model with a compiled name → column index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "TableBuilder")]
pub struct TableMeta {
    name: String,
    columns: Vec<ColumnMeta>,
    primary_key: Vec<String>,
    pk_constraint_name: String,
    index: HashMap<String, usize>,
    pk_indices: Vec<usize>,
}

impl TryFrom<TableBuilder> for TableMeta {
    type Error = CoreError;

    fn try_from(builder: TableBuilder) -> Result<Self> {
        builder.build()
    }
}

impl TableMeta {
    /// Starts declaring a table.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> TableBuilder {
        TableBuilder {
            name: name.into(),
            ..TableBuilder::default()
        }
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    /// Declared primary key columns, in key order.
    #[must_use]
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Column indices of the primary key, in key order.
    #[must_use]
    pub fn pk_indices(&self) -> &[usize] {
        &self.pk_indices
    }

    /// Declared primary key constraint name.
    #[must_use]
    pub fn pk_constraint_name(&self) -> &str {
        &self.pk_constraint_name
    }

    /// Whether `index` is part of the primary key.
    #[must_use]
    pub fn is_key_column(&self, index: usize) -> bool {
        self.pk_indices.contains(&index)
    }

    /// Resolves a column name to its index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownColumn`] for names the table lacks.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| CoreError::UnknownColumn(name.to_string()))
    }

    /// Looks up a column by name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownColumn`] for names the table lacks.
    pub fn column(&self, name: &str) -> Result<&ColumnMeta> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    /// Returns true if the table has a column called `name`.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// The single database-generated integer key column, if the key is one.
    #[must_use]
    pub fn rowid_key(&self) -> Option<usize> {
        match self.pk_indices.as_slice() {
            [only] if self.columns[*only].column_type == ColumnType::Integer => Some(*only),
            _ => None,
        }
    }
}

/// Quotes an identifier for SQLite, doubling embedded quotes.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
