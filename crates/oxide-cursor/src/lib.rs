//! Filterable, navigable record cursors over SQLite tables.
//!
//! `oxide-cursor` gives a stateful pointer over the rows of one table:
//! - Per-column filters, a complex filter, ordering and limit
//! - Lazily compiled statements, cached per operation and invalidated when
//!   the filters change
//! - A navigation language over `=<>+-` and 1-based record positions
//! - Insert, update and delete of the current record with dirty tracking
//! - Schema reflection that tells whether a table needs a migration
//!
//! # Architecture
//!
//! - **Session** - Data access: prepared statements and catalog reads
//! - **StatementCache** - One compiled statement per operation kind
//! - **Cursor** - Filters, current and shadow records, navigation
//! - **SchemaReflector** - Compares a model with the live catalog
//!
//! # Example
//!
//! ```rust
//! use oxide_cursor::{ColumnMeta, ColumnType, Cursor, SessionConfig, SqliteSession, TableMeta};
//!
//! let mut session = SqliteSession::open(&SessionConfig::default()).unwrap();
//! session
//!     .execute_script("CREATE TABLE log (entryno INTEGER PRIMARY KEY, userid TEXT);")
//!     .unwrap();
//! let meta = TableMeta::builder("log")
//!     .column(ColumnMeta::new("entryno", ColumnType::Integer).not_null())
//!     .column(ColumnMeta::new("userid", ColumnType::Text))
//!     .primary_key(&["entryno"])
//!     .build()
//!     .unwrap();
//!
//! let mut log = Cursor::new(session, meta).unwrap();
//! for user in ["adm", "guest", "admin"] {
//!     log.clear().unwrap();
//!     log.set_value("userid", user).unwrap();
//!     log.insert().unwrap();
//! }
//!
//! log.set_filter("userid", "adm%").unwrap();
//! assert_eq!(log.count().unwrap(), 2);
//! log.last().unwrap();
//! assert_eq!(log.position().unwrap(), 2);
//! ```

pub mod cache;
pub mod config;
pub mod cursor;
pub mod error;
pub mod navigation;
pub mod reflect;
pub mod session;
pub mod xrec;

pub use cache::{BoundStatement, StatementCache};
pub use config::SessionConfig;
pub use cursor::Cursor;
pub use error::{CursorError, Result};
pub use navigation::{CursorState, NavCommand, NavProgram};
pub use reflect::{DbColumnInfo, DbPkInfo, SchemaDrift, SchemaReflector};
pub use session::{CatalogColumn, ExecOutcome, Row, Session, SqliteSession, StatementHandle};
pub use xrec::XRec;

pub use oxide_cursor_core::{
    ColumnMeta, ColumnType, CoreError, FilterSet, OrderBy, SqlValue, StatementKind, TableMeta,
    ToSqlValue,
};
