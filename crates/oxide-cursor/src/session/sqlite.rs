//! SQLite session over sqlx.

use std::collections::HashMap;
use std::str::FromStr;

use oxide_cursor_core::SqlValue;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{ConnectOptions, Executor, Row as _, Sqlite, TypeInfo, ValueRef};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use super::{CatalogColumn, ExecOutcome, Row, Session, StatementHandle};
use crate::config::SessionConfig;
use crate::error::{CursorError, Result};

const TABLE_INFO_SQL: &str =
    r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?) ORDER BY cid"#;

const TABLE_DEFINITION_SQL: &str =
    "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?";

/// A single SQLite connection driven on a private current-thread runtime.
///
/// sqlx keeps compiled statements in a per-connection cache, so a handle
/// maps to SQL text that was compiled once by [`Session::prepare`].
pub struct SqliteSession {
    runtime: Runtime,
    conn: SqliteConnection,
    statements: HashMap<u64, String>,
    next_handle: u64,
    log_statements: bool,
}

impl std::fmt::Debug for SqliteSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSession")
            .field("statements", &self.statements.len())
            .field("log_statements", &self.log_statements)
            .finish_non_exhaustive()
    }
}

impl SqliteSession {
    /// Opens a connection as described by `config`.
    ///
    /// # Errors
    ///
    /// Fails when the runtime cannot start or the database cannot be opened.
    pub fn open(config: &SessionConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;

        let mut options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(config.create_if_missing)
            .busy_timeout(config.busy_timeout_duration());
        if !config.log_statements {
            options = options.disable_statement_logging();
        }
        let conn = runtime.block_on(options.connect())?;

        info!(url = %config.database_url, "Opened SQLite session");

        Ok(Self {
            runtime,
            conn,
            statements: HashMap::new(),
            next_handle: 1,
            log_statements: config.log_statements,
        })
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Fails when the runtime cannot start.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&SessionConfig::default())
    }

    /// Runs one or more `;`-separated statements without parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::DataAccess`] when any statement fails.
    pub fn execute_script(&mut self, sql: &str) -> Result<()> {
        if self.log_statements {
            debug!(sql = %sql, "Executing script");
        }
        let conn = &mut self.conn;
        self.runtime
            .block_on(async { sqlx::raw_sql(sql).execute(conn).await })?;
        Ok(())
    }

    /// Number of prepared statements not yet released.
    #[must_use]
    pub fn open_statements(&self) -> usize {
        self.statements.len()
    }

    fn sql_for(&self, handle: StatementHandle) -> Result<String> {
        self.statements
            .get(&handle.0)
            .cloned()
            .ok_or(CursorError::UnknownStatement(handle.0))
    }

    fn fetch(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        if self.log_statements {
            debug!(sql = %sql, params = params.len(), "Executing query");
        }
        let query = bind_all(sqlx::query(sql), params);
        let conn = &mut self.conn;
        let rows = self
            .runtime
            .block_on(async { query.fetch_all(conn).await })?;
        rows.iter().map(decode_row).collect()
    }
}

impl Session for SqliteSession {
    fn prepare(&mut self, sql: &str) -> Result<StatementHandle> {
        let conn = &mut self.conn;
        self.runtime
            .block_on(async { conn.prepare(sql).await.map(|_| ()) })?;

        let id = self.next_handle;
        self.next_handle += 1;
        self.statements.insert(id, sql.to_string());
        debug!(handle = id, sql = %sql, "Prepared statement");
        Ok(StatementHandle(id))
    }

    fn query(&mut self, handle: StatementHandle, params: &[SqlValue]) -> Result<Vec<Row>> {
        let sql = self.sql_for(handle)?;
        self.fetch(&sql, params)
    }

    fn execute(&mut self, handle: StatementHandle, params: &[SqlValue]) -> Result<ExecOutcome> {
        let sql = self.sql_for(handle)?;
        if self.log_statements {
            debug!(sql = %sql, params = params.len(), "Executing statement");
        }
        let query = bind_all(sqlx::query(&sql), params);
        let conn = &mut self.conn;
        let result = self
            .runtime
            .block_on(async { query.execute(conn).await })?;

        let is_insert = sql.trim_start().to_ascii_uppercase().starts_with("INSERT");
        Ok(ExecOutcome {
            rows_affected: result.rows_affected(),
            last_insert_id: is_insert.then_some(result.last_insert_rowid()),
        })
    }

    fn release(&mut self, handle: StatementHandle) -> Result<()> {
        self.statements
            .remove(&handle.0)
            .map(|_| ())
            .ok_or(CursorError::UnknownStatement(handle.0))
    }

    fn table_info(&mut self, table: &str) -> Result<Vec<CatalogColumn>> {
        let rows = self.fetch(TABLE_INFO_SQL, &[SqlValue::Text(table.to_string())])?;
        Ok(rows.into_iter().map(catalog_column).collect())
    }

    fn table_definition(&mut self, table: &str) -> Result<Option<String>> {
        let rows = self.fetch(TABLE_DEFINITION_SQL, &[SqlValue::Text(table.to_string())])?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .and_then(|value| match value {
                SqlValue::Text(sql) => Some(sql),
                _ => None,
            }))
    }
}

fn catalog_column(row: Row) -> CatalogColumn {
    let mut values = row.into_iter();
    let mut next = || values.next().unwrap_or(SqlValue::Null);
    let name = text_of(next()).unwrap_or_default();
    let declared_type = text_of(next()).unwrap_or_default();
    let not_null = matches!(next(), SqlValue::Int(n) if n != 0);
    let default = text_of(next());
    let pk_ordinal = match next() {
        SqlValue::Int(n) => u32::try_from(n).unwrap_or(0),
        _ => 0,
    };
    CatalogColumn {
        name,
        declared_type,
        not_null,
        default,
        pk_ordinal,
    }
}

fn text_of(value: SqlValue) -> Option<String> {
    match value {
        SqlValue::Null => None,
        SqlValue::Text(s) => Some(s),
        other => Some(other.to_string()),
    }
}

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

fn bind_all<'q>(mut query: SqliteQuery<'q>, params: &[SqlValue]) -> SqliteQuery<'q> {
    for value in params {
        query = bind_param(query, value.clone());
    }
    query
}

/// Binds a SqlValue parameter to a query.
fn bind_param(query: SqliteQuery<'_>, value: SqlValue) -> SqliteQuery<'_> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

#[derive(Clone, Copy)]
enum Storage {
    Null,
    Integer,
    Real,
    Text,
    Blob,
}

fn decode_row(row: &SqliteRow) -> Result<Row> {
    (0..row.len()).map(|i| decode_value(row, i)).collect()
}

/// Decodes by the value's storage class rather than the declared type.
fn decode_value(row: &SqliteRow, index: usize) -> Result<SqlValue> {
    let storage = {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            Storage::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" | "INT" | "BIGINT" => Storage::Integer,
                "REAL" | "FLOAT" | "DOUBLE" => Storage::Real,
                "BLOB" => Storage::Blob,
                _ => Storage::Text,
            }
        }
    };

    Ok(match storage {
        Storage::Null => SqlValue::Null,
        Storage::Integer => SqlValue::Int(row.try_get_unchecked::<i64, _>(index)?),
        Storage::Real => SqlValue::Float(row.try_get_unchecked::<f64, _>(index)?),
        Storage::Text => SqlValue::Text(row.try_get_unchecked::<String, _>(index)?),
        Storage::Blob => SqlValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(index)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SqliteSession {
        let mut session = SqliteSession::open_in_memory().unwrap();
        session
            .execute_script(
                "CREATE TABLE log (
                    entryno INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
                    userid VARCHAR(250) DEFAULT 'nobody',
                    weight REAL,
                    payload BLOB
                );",
            )
            .unwrap();
        session
    }

    #[test]
    fn test_prepare_execute_query() {
        let mut s = session();
        let insert = s
            .prepare("INSERT INTO log (userid, weight, payload) VALUES (?, ?, ?)")
            .unwrap();
        let outcome = s
            .execute(
                insert,
                &[
                    SqlValue::Text("adm".into()),
                    SqlValue::Float(1.5),
                    SqlValue::Blob(vec![1, 2]),
                ],
            )
            .unwrap();
        assert_eq!(outcome.rows_affected, 1);
        assert_eq!(outcome.last_insert_id, Some(1));

        let select = s
            .prepare("SELECT entryno, userid, weight, payload FROM log WHERE entryno = ?")
            .unwrap();
        let row = s.query_one(select, &[SqlValue::Int(1)]).unwrap().unwrap();
        assert_eq!(
            row,
            vec![
                SqlValue::Int(1),
                SqlValue::Text("adm".into()),
                SqlValue::Float(1.5),
                SqlValue::Blob(vec![1, 2]),
            ]
        );
        assert!(s.query_one(select, &[SqlValue::Int(9)]).unwrap().is_none());
    }

    #[test]
    fn test_prepare_rejects_bad_sql() {
        let mut s = session();
        assert!(matches!(
            s.prepare("SELECT nope FROM log"),
            Err(CursorError::DataAccess(_))
        ));
        assert_eq!(s.open_statements(), 0);
    }

    #[test]
    fn test_release_forgets_handle() {
        let mut s = session();
        let handle = s.prepare("SELECT COUNT(*) FROM log").unwrap();
        s.release(handle).unwrap();
        assert!(matches!(
            s.release(handle),
            Err(CursorError::UnknownStatement(_))
        ));
        assert!(matches!(
            s.query(handle, &[]),
            Err(CursorError::UnknownStatement(_))
        ));
    }

    #[test]
    fn test_catalog_queries() {
        let mut s = session();
        let columns = s.table_info("log").unwrap();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[0].name, "entryno");
        assert_eq!(columns[0].pk_ordinal, 1);
        assert!(columns[0].not_null);
        assert_eq!(columns[1].declared_type, "VARCHAR(250)");
        assert_eq!(columns[1].default.as_deref(), Some("'nobody'"));
        assert!(s.table_info("missing").unwrap().is_empty());

        let ddl = s.table_definition("log").unwrap().unwrap();
        assert!(ddl.starts_with("CREATE TABLE log"));
        assert_eq!(s.table_definition("missing").unwrap(), None);
    }
}
