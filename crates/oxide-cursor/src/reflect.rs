//! Schema reflection.
//!
//! Reads primary-key and column metadata back from the live catalog and
//! compares it with a declared [`TableMeta`] to decide whether the table
//! needs a migration.

use oxide_cursor_core::{ColumnMeta, ColumnType, Keyword, Lexer, TableMeta, Token};
use tracing::info;

use crate::error::Result;
use crate::session::Session;

/// Primary key as found in the database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbPkInfo {
    name: String,
    column_names: Vec<String>,
}

impl DbPkInfo {
    /// Creates an empty key.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the constraint name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Appends a key column.
    pub fn add_column_name(&mut self, name: impl Into<String>) {
        self.column_names.push(name.into());
    }

    /// Constraint name; empty when unnamed or absent.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key columns in key order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Whether the table has no key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.column_names.is_empty()
    }

    /// Whether the live key matches the model's key exactly.
    ///
    /// An empty key matches only a model without a key. Otherwise the
    /// constraint name, the number of columns and every column position must
    /// agree.
    #[must_use]
    pub fn reflects(&self, model: &TableMeta) -> bool {
        if self.is_empty() {
            return model.primary_key().is_empty();
        }
        self.name == model.pk_constraint_name() && self.column_names == model.primary_key()
    }
}

/// A column as found in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbColumnInfo {
    /// Column name.
    pub name: String,
    /// Type mapped from the declared SQLite type.
    pub column_type: ColumnType,
    /// Whether NULL is accepted.
    pub nullable: bool,
    /// Default value as SQL text.
    pub default: Option<String>,
}

impl DbColumnInfo {
    /// Whether type and nullability agree with `column`.
    #[must_use]
    pub fn reflects(&self, column: &ColumnMeta) -> bool {
        self.column_type == column.column_type && self.nullable == column.nullable
    }
}

/// Differences between a model and its live table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDrift {
    /// Table checked.
    pub table: String,
    /// Whether the live primary key reflects the model's.
    pub pk_in_sync: bool,
    /// Model columns absent from the live table.
    pub missing_columns: Vec<String>,
    /// Columns whose live type or nullability differs.
    pub mismatched_columns: Vec<String>,
    /// Whether the shared columns appear in model order.
    pub columns_in_order: bool,
}

impl SchemaDrift {
    /// Whether the table must be migrated before use.
    #[must_use]
    pub fn requires_migration(&self) -> bool {
        !self.pk_in_sync
            || !self.columns_in_order
            || !self.missing_columns.is_empty()
            || !self.mismatched_columns.is_empty()
    }
}

/// Reads table structure through a [`Session`].
pub struct SchemaReflector<'a, S: Session> {
    session: &'a mut S,
}

impl<'a, S: Session> SchemaReflector<'a, S> {
    /// Creates a reflector over `session`.
    #[must_use]
    pub fn new(session: &'a mut S) -> Self {
        Self { session }
    }

    /// Reads the primary key of `table`; a missing table has an empty key.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CursorError::DataAccess`] when the catalog query fails.
    pub fn read_primary_key(&mut self, table: &str) -> Result<DbPkInfo> {
        let mut key_columns: Vec<_> = self
            .session
            .table_info(table)?
            .into_iter()
            .filter(|c| c.pk_ordinal > 0)
            .collect();
        key_columns.sort_by_key(|c| c.pk_ordinal);

        let mut pk = DbPkInfo::new();
        if key_columns.is_empty() {
            return Ok(pk);
        }
        for column in key_columns {
            pk.add_column_name(column.name);
        }
        if let Some(ddl) = self.session.table_definition(table)? {
            if let Some(name) = pk_constraint_name(&ddl) {
                pk.set_name(name);
            }
        }
        Ok(pk)
    }

    /// Reads the columns of `table` in catalog order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CursorError::DataAccess`] when the catalog query fails.
    pub fn read_columns(&mut self, table: &str) -> Result<Vec<DbColumnInfo>> {
        Ok(self
            .session
            .table_info(table)?
            .into_iter()
            .map(|c| DbColumnInfo {
                column_type: ColumnType::from_declared(&c.declared_type),
                nullable: !c.not_null,
                default: c.default,
                name: c.name,
            })
            .collect())
    }

    /// Compares `model` with its live table.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CursorError::DataAccess`] when the catalog query fails.
    pub fn check(&mut self, model: &TableMeta) -> Result<SchemaDrift> {
        let pk = self.read_primary_key(model.name())?;
        let live = self.read_columns(model.name())?;

        let mut drift = SchemaDrift {
            table: model.name().to_string(),
            pk_in_sync: pk.reflects(model),
            ..SchemaDrift::default()
        };
        let mut live_positions = Vec::new();
        for column in model.columns() {
            match live.iter().position(|c| c.name == column.name) {
                None => drift.missing_columns.push(column.name.clone()),
                Some(at) => {
                    if !live[at].reflects(column) {
                        drift.mismatched_columns.push(column.name.clone());
                    }
                    live_positions.push(at);
                }
            }
        }
        drift.columns_in_order = live_positions.windows(2).all(|w| w[0] < w[1]);

        if drift.requires_migration() {
            info!(
                table = %drift.table,
                pk_in_sync = drift.pk_in_sync,
                missing = ?drift.missing_columns,
                mismatched = ?drift.mismatched_columns,
                "Schema drift detected"
            );
        }
        Ok(drift)
    }
}

/// Finds `CONSTRAINT <name> PRIMARY KEY` in table definition text.
fn pk_constraint_name(ddl: &str) -> Option<String> {
    let tokens: Vec<Token> = Lexer::new(ddl)
        .tokenize()
        .into_iter()
        .filter(|t| !t.is_eof())
        .collect();
    tokens.windows(4).find_map(|w| {
        let shape = (w[0].keyword(), w[2].keyword(), w[3].keyword());
        match shape {
            (Some(Keyword::Constraint), Some(Keyword::Primary), Some(Keyword::Key)) => {
                w[1].identifier().map(str::to_string)
            }
            _ => None,
        }
    })
}
