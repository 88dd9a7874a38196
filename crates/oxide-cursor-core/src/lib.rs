//! # oxide-cursor-core
//!
//! I/O-free building blocks of the oxide-cursor record cursor engine.
//!
//! This crate provides:
//! - A table model ([`TableMeta`]) with a compiled name to column index
//! - Filter state ([`FilterSet`]) with a per-column filter language and
//!   canonicalized complex filters
//! - Statement compilation for every cursor operation ([`StatementKind`])
//!
//! ## Compiling a statement
//!
//! ```rust
//! use oxide_cursor_core::{
//!     compile, ColumnMeta, ColumnType, FilterSet, StatementKind, TableMeta, WriteShape,
//! };
//!
//! let meta = TableMeta::builder("log")
//!     .column(ColumnMeta::new("entryno", ColumnType::Integer).not_null())
//!     .column(ColumnMeta::new("userid", ColumnType::Text))
//!     .primary_key(&["entryno"])
//!     .build()
//!     .unwrap();
//!
//! let mut filters = FilterSet::new();
//! filters.set_filter(&meta, "userid", "adm%").unwrap();
//!
//! let count = compile(StatementKind::Count, &meta, &filters, &WriteShape::default()).unwrap();
//! assert_eq!(count.sql, "SELECT COUNT(*) FROM \"log\" WHERE \"userid\" LIKE ?");
//! ```
//!
//! Values never appear in SQL text; every literal travels as a bound
//! parameter.

pub mod error;
pub mod filter;
pub mod lexer;
pub mod schema;
pub mod sql;
pub mod value;

pub use error::{CoreError, Result};
pub use filter::{FilterExpr, FilterSet, FilterSpec, Limit, OrderBy, OrderDirection};
pub use lexer::{Keyword, Lexer, Token, TokenKind};
pub use schema::{quote_identifier, ColumnMeta, ColumnType, TableBuilder, TableMeta};
pub use sql::{compile, CompiledSql, ParamSource, StatementKind, WriteShape};
pub use value::{SqlValue, ToSqlValue};
