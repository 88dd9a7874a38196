//! Per-operation statement cache.
//!
//! Statements are compiled on first use and kept until the filter set they
//! were compiled against changes or the cache is closed. Write statements are
//! keyed on the table model and write shape only, so filter changes never
//! invalidate them.

use std::collections::HashMap;

use oxide_cursor_core::{
    compile, CompiledSql, FilterSet, SqlValue, StatementKind, TableMeta, WriteShape,
};
use tracing::{debug, warn};

use crate::error::{CursorError, Result};
use crate::session::{Session, StatementHandle};

#[derive(Debug)]
struct Entry {
    compiled: CompiledSql,
    handle: StatementHandle,
    filter_version: u64,
    shape: WriteShape,
    valid: bool,
}

/// A prepared statement with its parameters resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    /// Session handle of the prepared statement.
    pub handle: StatementHandle,
    /// Values for the placeholders, in order.
    pub params: Vec<SqlValue>,
}

/// Compiled statements of one cursor, one entry per [`StatementKind`].
#[derive(Debug)]
pub struct StatementCache {
    entries: HashMap<StatementKind, Entry>,
    open: bool,
}

impl Default for StatementCache {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementCache {
    /// Creates an empty, open cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            open: true,
        }
    }

    /// Whether `kind` has a usable compiled statement for `filters`.
    #[must_use]
    pub fn is_valid(&self, kind: StatementKind, filters: &FilterSet) -> bool {
        self.open
            && self.entries.get(&kind).is_some_and(|entry| {
                entry.valid
                    && (!kind.depends_on_filters() || entry.filter_version == filters.version())
            })
    }

    fn is_current(&self, kind: StatementKind, filters: &FilterSet, shape: &WriteShape) -> bool {
        self.is_valid(kind, filters)
            && (!kind.depends_on_shape()
                || self.entries.get(&kind).is_some_and(|entry| &entry.shape == shape))
    }

    /// Compiles and prepares `kind` unless a current entry exists.
    ///
    /// # Errors
    ///
    /// Fails with [`CursorError::CursorClosed`] after [`Self::release_all`],
    /// with [`CursorError::Core`] when the ordering names a column the model
    /// lacks, or with the session's error when preparing fails.
    pub fn prepare<S: Session>(
        &mut self,
        session: &mut S,
        kind: StatementKind,
        meta: &TableMeta,
        filters: &FilterSet,
        shape: &WriteShape,
    ) -> Result<()> {
        if !self.open {
            return Err(CursorError::CursorClosed);
        }
        if self.is_current(kind, filters, shape) {
            return Ok(());
        }

        let compiled = compile(kind, meta, filters, shape)?;
        if let Some(stale) = self.entries.remove(&kind) {
            debug!(kind = %kind, "Releasing stale statement");
            session.release(stale.handle)?;
        }

        debug!(kind = %kind, sql = %compiled.sql, "Compiled statement");
        let handle = session.prepare(&compiled.sql)?;
        self.entries.insert(
            kind,
            Entry {
                compiled,
                handle,
                filter_version: filters.version(),
                shape: shape.clone(),
                valid: true,
            },
        );
        Ok(())
    }

    /// Returns the statement for `kind` bound against `record`, compiling it
    /// first when needed.
    ///
    /// # Errors
    ///
    /// See [`Self::prepare`].
    pub fn statement<S: Session>(
        &mut self,
        session: &mut S,
        kind: StatementKind,
        meta: &TableMeta,
        filters: &FilterSet,
        shape: &WriteShape,
        record: &[SqlValue],
    ) -> Result<BoundStatement> {
        self.prepare(session, kind, meta, filters, shape)?;
        let entry = self
            .entries
            .get(&kind)
            .ok_or(CursorError::CursorClosed)?;
        Ok(BoundStatement {
            handle: entry.handle,
            params: entry.compiled.bind(record),
        })
    }

    /// SQL text of the compiled statement for `kind`, if any.
    #[must_use]
    pub fn sql(&self, kind: StatementKind) -> Option<&str> {
        self.entries.get(&kind).map(|entry| entry.compiled.sql.as_str())
    }

    /// Marks every entry invalid; handles are released on recompilation.
    pub fn invalidate_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.valid = false;
        }
    }

    /// Closes the cache and releases every handle.
    ///
    /// Every release is attempted; the first failure is returned. Calling it
    /// again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the first release failure.
    pub fn release_all<S: Session>(&mut self, session: &mut S) -> Result<()> {
        self.open = false;
        let mut first_error = None;
        for (kind, entry) in self.entries.drain() {
            if let Err(err) = session.release(entry.handle) {
                warn!(kind = %kind, error = %err, "Failed to release statement");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CatalogColumn, ExecOutcome, Row, SqliteSession};
    use oxide_cursor_core::{ColumnMeta, ColumnType};

    /// Refuses to release one handle and delegates everything else.
    struct StickySession {
        inner: SqliteSession,
        sticky: Option<StatementHandle>,
    }

    impl Session for StickySession {
        fn prepare(&mut self, sql: &str) -> Result<StatementHandle> {
            self.inner.prepare(sql)
        }

        fn query(&mut self, handle: StatementHandle, params: &[SqlValue]) -> Result<Vec<Row>> {
            self.inner.query(handle, params)
        }

        fn execute(&mut self, handle: StatementHandle, params: &[SqlValue]) -> Result<ExecOutcome> {
            self.inner.execute(handle, params)
        }

        fn release(&mut self, handle: StatementHandle) -> Result<()> {
            if self.sticky == Some(handle) {
                return Err(CursorError::UnknownStatement(handle.0));
            }
            self.inner.release(handle)
        }

        fn table_info(&mut self, table: &str) -> Result<Vec<CatalogColumn>> {
            self.inner.table_info(table)
        }

        fn table_definition(&mut self, table: &str) -> Result<Option<String>> {
            self.inner.table_definition(table)
        }
    }

    fn setup() -> (SqliteSession, TableMeta) {
        let mut session = SqliteSession::open_in_memory().unwrap();
        session
            .execute_script("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT);")
            .unwrap();
        let meta = TableMeta::builder("t")
            .column(ColumnMeta::new("id", ColumnType::Integer).not_null())
            .column(ColumnMeta::new("name", ColumnType::Text))
            .primary_key(&["id"])
            .build()
            .unwrap();
        (session, meta)
    }

    #[test]
    fn test_compiles_lazily_and_reuses() {
        let (mut session, meta) = setup();
        let filters = FilterSet::new();
        let shape = WriteShape::default();
        let mut cache = StatementCache::new();

        assert!(!cache.is_valid(StatementKind::First, &filters));
        let a = cache
            .statement(&mut session, StatementKind::First, &meta, &filters, &shape, &[])
            .unwrap();
        assert!(cache.is_valid(StatementKind::First, &filters));
        let b = cache
            .statement(&mut session, StatementKind::First, &meta, &filters, &shape, &[])
            .unwrap();
        assert_eq!(a.handle, b.handle);
        assert_eq!(session.open_statements(), 1);
    }

    #[test]
    fn test_filter_change_invalidates_reads_only() {
        let (mut session, meta) = setup();
        let mut filters = FilterSet::new();
        let shape = WriteShape::default();
        let mut cache = StatementCache::new();
        for kind in [StatementKind::Get, StatementKind::Count] {
            cache
                .prepare(&mut session, kind, &meta, &filters, &shape)
                .unwrap();
        }

        filters.set_filter(&meta, "name", "a%").unwrap();
        assert!(cache.is_valid(StatementKind::Get, &filters));
        assert!(!cache.is_valid(StatementKind::Count, &filters));

        let bound = cache
            .statement(&mut session, StatementKind::Count, &meta, &filters, &shape, &[])
            .unwrap();
        assert_eq!(bound.params, vec![SqlValue::Text("a%".to_string())]);
        assert!(cache.sql(StatementKind::Count).unwrap().contains("LIKE ?"));
        // The stale handle was released before recompiling.
        assert_eq!(session.open_statements(), 2);
    }

    #[test]
    fn test_shape_change_recompiles_write() {
        let (mut session, meta) = setup();
        let filters = FilterSet::new();
        let mut cache = StatementCache::new();
        let narrow = WriteShape::new(vec![false, true], vec![false, false]);
        let wide = WriteShape::new(vec![true, true], vec![false, false]);

        cache
            .prepare(&mut session, StatementKind::Insert, &meta, &filters, &narrow)
            .unwrap();
        assert_eq!(
            cache.sql(StatementKind::Insert),
            Some("INSERT INTO \"t\" (\"name\") VALUES (?)")
        );
        cache
            .prepare(&mut session, StatementKind::Insert, &meta, &filters, &wide)
            .unwrap();
        assert_eq!(
            cache.sql(StatementKind::Insert),
            Some("INSERT INTO \"t\" (\"id\", \"name\") VALUES (?, ?)")
        );
        assert_eq!(session.open_statements(), 1);
    }

    #[test]
    fn test_release_all_closes() {
        let (mut session, meta) = setup();
        let filters = FilterSet::new();
        let shape = WriteShape::default();
        let mut cache = StatementCache::new();
        for kind in StatementKind::ALL {
            cache
                .prepare(&mut session, kind, &meta, &filters, &shape)
                .unwrap();
        }
        assert_eq!(session.open_statements(), StatementKind::ALL.len());

        cache.release_all(&mut session).unwrap();
        assert_eq!(session.open_statements(), 0);
        assert!(!cache.is_valid(StatementKind::Get, &filters));
        assert!(matches!(
            cache.prepare(&mut session, StatementKind::Get, &meta, &filters, &shape),
            Err(CursorError::CursorClosed)
        ));
        cache.release_all(&mut session).unwrap();
    }

    #[test]
    fn test_release_all_continues_past_failure() {
        let (inner, meta) = setup();
        let mut session = StickySession {
            inner,
            sticky: None,
        };
        let filters = FilterSet::new();
        let shape = WriteShape::default();
        let mut cache = StatementCache::new();
        for kind in StatementKind::ALL {
            cache
                .prepare(&mut session, kind, &meta, &filters, &shape)
                .unwrap();
        }
        let stuck = cache
            .statement(&mut session, StatementKind::Count, &meta, &filters, &shape, &[])
            .unwrap()
            .handle;
        session.sticky = Some(stuck);

        let err = cache.release_all(&mut session).unwrap_err();
        assert!(matches!(err, CursorError::UnknownStatement(h) if h == stuck.0));
        // Every other handle was still released.
        assert_eq!(session.inner.open_statements(), 1);
        assert!(!cache.is_valid(StatementKind::Get, &filters));

        cache.release_all(&mut session).unwrap();
    }

    #[test]
    fn test_ordering_from_another_model_keeps_entry() {
        let (mut session, meta) = setup();
        let other = TableMeta::builder("u")
            .column(ColumnMeta::new("id", ColumnType::Integer))
            .column(ColumnMeta::new("label", ColumnType::Text))
            .primary_key(&["id"])
            .build()
            .unwrap();
        let mut filters = FilterSet::new();
        let shape = WriteShape::default();
        let mut cache = StatementCache::new();
        cache
            .prepare(&mut session, StatementKind::Forwards, &meta, &filters, &shape)
            .unwrap();

        filters.order_by(&other, &["label"]).unwrap();
        assert!(matches!(
            cache.prepare(&mut session, StatementKind::Forwards, &meta, &filters, &shape),
            Err(CursorError::UnknownColumn(ref c)) if c == "label"
        ));
        assert_eq!(session.open_statements(), 1);
        assert!(cache.sql(StatementKind::Forwards).is_some());
    }

    #[test]
    fn test_invalidate_all() {
        let (mut session, meta) = setup();
        let filters = FilterSet::new();
        let shape = WriteShape::default();
        let mut cache = StatementCache::new();
        cache
            .prepare(&mut session, StatementKind::Get, &meta, &filters, &shape)
            .unwrap();
        cache.invalidate_all();
        assert!(!cache.is_valid(StatementKind::Get, &filters));
        cache
            .prepare(&mut session, StatementKind::Get, &meta, &filters, &shape)
            .unwrap();
        assert!(cache.is_valid(StatementKind::Get, &filters));
        assert_eq!(session.open_statements(), 1);
    }
}
