//! Data access.
//!
//! A [`Session`] is the only way a cursor touches the database. It prepares
//! SQL text into handles, runs them with bound values and answers the two
//! catalog questions schema reflection asks.

mod sqlite;

pub use sqlite::SqliteSession;

use oxide_cursor_core::SqlValue;

use crate::error::Result;

/// One result row, one value per selected column.
pub type Row = Vec<SqlValue>;

/// Opaque handle to a prepared statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementHandle(pub u64);

/// Outcome of a data-modifying statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOutcome {
    /// Rows inserted, updated or deleted.
    pub rows_affected: u64,
    /// Rowid generated by an INSERT.
    pub last_insert_id: Option<i64>,
}

/// A column as reported by the live catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogColumn {
    /// Column name.
    pub name: String,
    /// Declared type text, possibly empty.
    pub declared_type: String,
    /// Whether the column is declared NOT NULL.
    pub not_null: bool,
    /// Default value as SQL text.
    pub default: Option<String>,
    /// 1-based position in the primary key, 0 when not part of it.
    pub pk_ordinal: u32,
}

/// Data-access collaborator of a cursor.
///
/// Calls block until the database answers.
pub trait Session {
    /// Compiles `sql` and returns a handle for it.
    fn prepare(&mut self, sql: &str) -> Result<StatementHandle>;

    /// Runs a prepared query and returns every row.
    fn query(&mut self, handle: StatementHandle, params: &[SqlValue]) -> Result<Vec<Row>>;

    /// Runs a prepared data-modifying statement.
    fn execute(&mut self, handle: StatementHandle, params: &[SqlValue]) -> Result<ExecOutcome>;

    /// Forgets a prepared statement.
    fn release(&mut self, handle: StatementHandle) -> Result<()>;

    /// Columns of `table` in catalog order; empty when the table is missing.
    fn table_info(&mut self, table: &str) -> Result<Vec<CatalogColumn>>;

    /// Stored `CREATE TABLE` text of `table`, if the table exists.
    fn table_definition(&mut self, table: &str) -> Result<Option<String>>;

    /// Runs a query and returns the first row, if any.
    fn query_one(&mut self, handle: StatementHandle, params: &[SqlValue]) -> Result<Option<Row>> {
        Ok(self.query(handle, params)?.into_iter().next())
    }
}
