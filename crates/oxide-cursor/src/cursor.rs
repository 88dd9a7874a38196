//! Record cursor.
//!
//! A [`Cursor`] is a stateful pointer over the filtered, ordered rows of one
//! table. It owns its filter set, its statement cache, the current record,
//! the shadow copy of that record as last fetched or written, and the masks
//! of fields assigned since the last write.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use oxide_cursor_core::{FilterSet, SqlValue, StatementKind, TableMeta, ToSqlValue, WriteShape};
use tracing::{debug, warn};

use crate::cache::StatementCache;
use crate::error::{CursorError, Result};
use crate::navigation::{CursorState, NavProgram};
use crate::session::{ExecOutcome, Row, Session};
use crate::xrec::XRec;

/// Rows of an open set iteration.
#[derive(Debug)]
struct SetBuffer {
    rows: VecDeque<Row>,
}

/// A filterable, navigable pointer over the rows of one table.
///
/// # Example
///
/// ```rust
/// use oxide_cursor::{ColumnMeta, ColumnType, Cursor, SqliteSession, TableMeta};
///
/// let mut session = SqliteSession::open_in_memory().unwrap();
/// session
///     .execute_script("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT);")
///     .unwrap();
/// let meta = TableMeta::builder("t")
///     .column(ColumnMeta::new("id", ColumnType::Integer).not_null())
///     .column(ColumnMeta::new("name", ColumnType::Text))
///     .primary_key(&["id"])
///     .build()
///     .unwrap();
///
/// let mut cursor = Cursor::new(session, meta).unwrap();
/// cursor.set_value("name", "first").unwrap();
/// cursor.insert().unwrap();
/// assert_eq!(cursor.position().unwrap(), 1);
/// ```
pub struct Cursor<S: Session> {
    session: S,
    meta: Arc<TableMeta>,
    filters: FilterSet,
    cache: StatementCache,
    record: Vec<SqlValue>,
    shadow: Vec<SqlValue>,
    update_mask: Vec<bool>,
    null_mask: Vec<bool>,
    state: CursorState,
    set: Option<SetBuffer>,
    closed: Arc<AtomicBool>,
}

impl<S: Session> Cursor<S> {
    /// Opens a cursor over `meta` on `session`.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::MissingPrimaryKey`] for tables without a key.
    pub fn new(session: S, meta: impl Into<Arc<TableMeta>>) -> Result<Self> {
        let meta = meta.into();
        if meta.primary_key().is_empty() {
            return Err(CursorError::MissingPrimaryKey(meta.name().to_string()));
        }
        let width = meta.columns().len();
        Ok(Self {
            session,
            meta,
            filters: FilterSet::new(),
            cache: StatementCache::new(),
            record: vec![SqlValue::Null; width],
            shadow: vec![SqlValue::Null; width],
            update_mask: vec![false; width],
            null_mask: vec![false; width],
            state: CursorState::Detached,
            set: None,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Table model of the cursor.
    #[must_use]
    pub fn meta(&self) -> &TableMeta {
        &self.meta
    }

    /// Table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        self.meta.name()
    }

    /// Navigation state.
    #[must_use]
    pub const fn state(&self) -> CursorState {
        self.state
    }

    /// The session the cursor runs on.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Whether [`Self::close`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(CursorError::CursorClosed)
        } else {
            Ok(())
        }
    }

    // Fields

    /// Reads a field of the current record.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`, `UnknownColumn`, or `NoCurrentRecord` when
    /// the cursor stands before the first or after the last record.
    pub fn get_value(&self, column: &str) -> Result<&SqlValue> {
        self.ensure_open()?;
        let index = self.meta.column_index(column)?;
        if matches!(self.state, CursorState::BeforeFirst | CursorState::AfterLast) {
            return Err(CursorError::NoCurrentRecord);
        }
        Ok(&self.record[index])
    }

    /// Assigns a field and marks it for the next write.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`, `UnknownColumn` or a type mismatch.
    pub fn set_value(&mut self, column: &str, value: impl ToSqlValue) -> Result<()> {
        self.ensure_open()?;
        let index = self.meta.column_index(column)?;
        let value = value
            .to_sql_value()
            .coerce_to(column, self.meta.columns()[index].column_type)?;
        self.null_mask[index] = value.is_null();
        self.update_mask[index] = true;
        self.record[index] = value;
        self.leave_boundary();
        Ok(())
    }

    fn leave_boundary(&mut self) {
        if matches!(self.state, CursorState::BeforeFirst | CursorState::AfterLast) {
            self.state = CursorState::Detached;
        }
    }

    /// All fields of the current record in column order.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`.
    pub fn values(&self) -> Result<&[SqlValue]> {
        self.ensure_open()?;
        Ok(&self.record)
    }

    /// Resets every field to NULL and detaches the cursor.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.record.fill(SqlValue::Null);
        self.shadow.fill(SqlValue::Null);
        self.clear_masks();
        self.state = CursorState::Detached;
        self.set = None;
        Ok(())
    }

    /// Copies every field from `other` and marks them all assigned.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed` or `TableMismatch`.
    pub fn copy_fields_from<T: Session>(&mut self, other: &Cursor<T>) -> Result<()> {
        self.check_peer(other)?;
        self.record.clone_from(&other.record);
        self.update_mask.fill(true);
        for (null, value) in self.null_mask.iter_mut().zip(&self.record) {
            *null = value.is_null();
        }
        self.leave_boundary();
        Ok(())
    }

    /// Columns whose current value differs from the shadow record.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`.
    pub fn changed_columns(&self) -> Result<Vec<&str>> {
        self.ensure_open()?;
        Ok(self
            .meta
            .columns()
            .iter()
            .zip(self.record.iter().zip(&self.shadow))
            .filter(|(_, (current, fetched))| current != fetched)
            .map(|(column, _)| column.name.as_str())
            .collect())
    }

    /// Snapshot of the record as last fetched or written.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`.
    pub fn xrec(&self) -> Result<XRec> {
        self.ensure_open()?;
        Ok(XRec::new(
            Arc::clone(&self.meta),
            self.shadow.clone(),
            Arc::clone(&self.closed),
        ))
    }

    // Filters

    fn filters_changed(&mut self) {
        self.set = None;
    }

    /// Sets a filter-expression filter on `column`, e.g. `>1` or `foo%`.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`, `UnknownColumn` or an invalid filter; the
    /// filter set is unchanged on failure.
    pub fn set_filter(&mut self, column: &str, filter: &str) -> Result<()> {
        self.ensure_open()?;
        self.filters.set_filter(&self.meta, column, filter)?;
        self.filters_changed();
        Ok(())
    }

    /// Filters `column` to a single value.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`, `UnknownColumn` or a type mismatch.
    pub fn set_range(&mut self, column: &str, value: impl ToSqlValue) -> Result<()> {
        self.ensure_open()?;
        self.filters.set_range(&self.meta, column, value)?;
        self.filters_changed();
        Ok(())
    }

    /// Filters `column` to the inclusive range `from..=to`.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`, `UnknownColumn` or a type mismatch.
    pub fn set_range_between(
        &mut self,
        column: &str,
        from: impl ToSqlValue,
        to: impl ToSqlValue,
    ) -> Result<()> {
        self.ensure_open()?;
        self.filters.set_range_between(&self.meta, column, from, to)?;
        self.filters_changed();
        Ok(())
    }

    /// Removes the filter on `column`.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed` or `UnknownColumn`.
    pub fn remove_filter(&mut self, column: &str) -> Result<()> {
        self.ensure_open()?;
        self.filters.remove_filter(&self.meta, column)?;
        self.filters_changed();
        Ok(())
    }

    /// Sets the complex filter; blank input clears it.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`, `UnknownColumn` or an invalid expression.
    pub fn set_complex_filter(&mut self, expr: &str) -> Result<()> {
        self.ensure_open()?;
        self.filters.set_complex_filter(&self.meta, expr)?;
        self.filters_changed();
        Ok(())
    }

    /// Replaces the ordering; accepts `col`, `col ASC`, `col DESC`, `-col`.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`, `UnknownColumn` or an invalid ordering.
    pub fn order_by(&mut self, specs: &[&str]) -> Result<()> {
        self.ensure_open()?;
        self.filters.order_by(&self.meta, specs)?;
        self.filters_changed();
        Ok(())
    }

    /// Limits set iteration to `count` rows after skipping `offset`; a zero
    /// count means no limit.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`.
    pub fn limit(&mut self, offset: u64, count: u64) -> Result<()> {
        self.ensure_open()?;
        self.filters.set_limit(offset, count);
        self.filters_changed();
        Ok(())
    }

    /// Clears filters, ordering and limit.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`.
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.filters.reset();
        self.filters_changed();
        Ok(())
    }

    fn check_peer<T: Session>(&self, other: &Cursor<T>) -> Result<()> {
        self.ensure_open()?;
        other.ensure_open()?;
        if self.meta.name() != other.meta.name() {
            return Err(CursorError::TableMismatch {
                expected: self.meta.name().to_string(),
                found: other.meta.name().to_string(),
            });
        }
        Ok(())
    }

    /// Replaces the filter set with a copy of `other`'s.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed` or `TableMismatch`.
    pub fn copy_filters_from<T: Session>(&mut self, other: &Cursor<T>) -> Result<()> {
        self.check_peer(other)?;
        self.filters.copy_from(&other.filters);
        self.filters_changed();
        Ok(())
    }

    /// Whether both cursors select the same rows in the same order.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed` when either cursor is closed.
    pub fn is_equivalent<T: Session>(&self, other: &Cursor<T>) -> Result<bool> {
        self.ensure_open()?;
        other.ensure_open()?;
        Ok(self.meta.name() == other.meta.name() && self.filters.is_equivalent(&other.filters))
    }

    /// The filter set.
    #[must_use]
    pub const fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Per-column filters rendered as text, ordered by column.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`.
    pub fn get_filters(&self) -> Result<BTreeMap<String, String>> {
        self.ensure_open()?;
        Ok(self
            .filters
            .filters()
            .iter()
            .map(|(column, spec)| (column.clone(), spec.to_string()))
            .collect())
    }

    /// The canonical complex filter.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`.
    pub fn get_complex_filter(&self) -> Result<Option<&str>> {
        self.ensure_open()?;
        Ok(self.filters.complex_filter())
    }

    // Statements

    fn insert_shape(&self) -> WriteShape {
        let assigned = self.record.iter().map(|v| !v.is_null()).collect();
        WriteShape::new(assigned, vec![false; self.record.len()])
    }

    fn shape_for(&self, kind: StatementKind) -> WriteShape {
        match kind {
            StatementKind::Insert => self.insert_shape(),
            StatementKind::Update => {
                WriteShape::new(self.update_mask.clone(), self.null_mask.clone())
            }
            _ => WriteShape::default(),
        }
    }

    /// Compiles and prepares the statement for `kind` without running it.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed` or the session's error.
    pub fn prepare(&mut self, kind: StatementKind) -> Result<()> {
        self.ensure_open()?;
        let shape = self.shape_for(kind);
        self.cache
            .prepare(&mut self.session, kind, &self.meta, &self.filters, &shape)
    }

    /// Whether `kind` has a compiled statement usable under the current
    /// filters. Always false once closed.
    #[must_use]
    pub fn is_statement_valid(&self, kind: StatementKind) -> bool {
        !self.is_closed() && self.cache.is_valid(kind, &self.filters)
    }

    fn fetch_rows(&mut self, kind: StatementKind) -> Result<Vec<Row>> {
        let shape = self.shape_for(kind);
        let bound = self.cache.statement(
            &mut self.session,
            kind,
            &self.meta,
            &self.filters,
            &shape,
            &self.record,
        )?;
        self.session.query(bound.handle, &bound.params)
    }

    fn fetch_one(&mut self, kind: StatementKind) -> Result<Option<Row>> {
        Ok(self.fetch_rows(kind)?.into_iter().next())
    }

    fn fetch_count(&mut self, kind: StatementKind) -> Result<u64> {
        match self.fetch_one(kind)?.and_then(|row| row.into_iter().next()) {
            Some(SqlValue::Int(n)) => Ok(u64::try_from(n).unwrap_or(0)),
            _ => Ok(0),
        }
    }

    fn exec(&mut self, kind: StatementKind) -> Result<ExecOutcome> {
        let shape = self.shape_for(kind);
        let bound = self.cache.statement(
            &mut self.session,
            kind,
            &self.meta,
            &self.filters,
            &shape,
            &self.record,
        )?;
        self.session.execute(bound.handle, &bound.params)
    }

    fn has_key(&self) -> bool {
        self.meta
            .pk_indices()
            .iter()
            .all(|&i| !self.record[i].is_null())
    }

    fn clear_masks(&mut self) {
        self.update_mask.fill(false);
        self.null_mask.fill(false);
    }

    fn load(&mut self, row: Row) {
        for ((slot, value), column) in self.record.iter_mut().zip(row).zip(self.meta.columns()) {
            *slot = value.normalize_for(column.column_type);
        }
        self.shadow.clone_from(&self.record);
        self.clear_masks();
        self.state = CursorState::OnRecord;
    }

    // Navigation

    /// Runs a navigation command over `=<>+-`.
    ///
    /// Primitives run left to right; the first one that lands on a record
    /// wins. `=` re-reads the current key, `>`/`<` step to the next/previous
    /// record, `+`/`-` jump to the first/last record.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidNavigationCommand` before anything runs when the
    /// command has a foreign character. When no primitive lands, fails with
    /// `RecordNotFound`, or `NoCurrentRecord` if the last primitive needed a
    /// current key that was missing.
    pub fn navigate(&mut self, command: &str) -> Result<()> {
        self.ensure_open()?;
        let program = NavProgram::parse(command)?;
        debug!(table = %self.meta.name(), command = %command, "Navigating");

        let mut miss = CursorError::RecordNotFound;
        for step in program.commands() {
            if step.needs_anchor() && !self.has_key() {
                miss = CursorError::NoCurrentRecord;
                continue;
            }
            if let Some(row) = self.fetch_one(step.statement_kind())? {
                self.load(row);
                return Ok(());
            }
            self.state = step.miss_state();
            miss = CursorError::RecordNotFound;
        }
        Err(miss)
    }

    /// Like [`Self::navigate`], reporting a miss as `false`.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`, `InvalidNavigationCommand` or data access
    /// errors.
    pub fn try_navigate(&mut self, command: &str) -> Result<bool> {
        match self.navigate(command) {
            Ok(()) => Ok(true),
            Err(CursorError::RecordNotFound | CursorError::NoCurrentRecord) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Moves to the first matching record.
    ///
    /// # Errors
    ///
    /// Fails with `RecordNotFound` when nothing matches.
    pub fn first(&mut self) -> Result<()> {
        self.navigate("+")
    }

    /// Moves to the last matching record.
    ///
    /// # Errors
    ///
    /// Fails with `RecordNotFound` when nothing matches.
    pub fn last(&mut self) -> Result<()> {
        self.navigate("-")
    }

    /// Moves to the first matching record, if any.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed` or data access errors.
    pub fn try_first(&mut self) -> Result<bool> {
        self.try_navigate("+")
    }

    /// Moves to the last matching record, if any.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed` or data access errors.
    pub fn try_last(&mut self) -> Result<bool> {
        self.try_navigate("-")
    }

    /// Fetches the record with primary key `key`, ignoring filters.
    ///
    /// # Errors
    ///
    /// Fails with `KeyArity`, a type mismatch, or `RecordNotFound`.
    pub fn get(&mut self, key: &[SqlValue]) -> Result<()> {
        if self.try_get(key)? {
            Ok(())
        } else {
            Err(CursorError::RecordNotFound)
        }
    }

    /// Fetches the record with primary key `key`, reporting a miss as `false`.
    ///
    /// On a miss the key fields keep `key`, other fields are cleared and the
    /// state is [`CursorState::Unknown`].
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`, `KeyArity` or a type mismatch.
    pub fn try_get(&mut self, key: &[SqlValue]) -> Result<bool> {
        self.ensure_open()?;
        let pk = self.meta.pk_indices();
        if key.len() != pk.len() {
            return Err(CursorError::KeyArity {
                expected: pk.len(),
                found: key.len(),
            });
        }
        let mut record = vec![SqlValue::Null; self.record.len()];
        for (&index, value) in pk.iter().zip(key) {
            let column = &self.meta.columns()[index];
            record[index] = value.clone().coerce_to(&column.name, column.column_type)?;
        }
        self.record = record;
        self.clear_masks();
        self.try_get_current()
    }

    /// Re-reads the current key, ignoring filters.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`, or `NoCurrentRecord` when a key field is
    /// NULL.
    pub fn try_get_current(&mut self) -> Result<bool> {
        self.ensure_open()?;
        if !self.has_key() {
            return Err(CursorError::NoCurrentRecord);
        }
        match self.fetch_one(StatementKind::Get)? {
            Some(row) => {
                self.load(row);
                Ok(true)
            }
            None => {
                self.state = CursorState::Unknown;
                Ok(false)
            }
        }
    }

    // Set iteration

    /// Opens the ordered, limited result set and moves to its first row.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed` or data access errors.
    pub fn try_find_set(&mut self) -> Result<bool> {
        self.ensure_open()?;
        let rows = self.fetch_rows(StatementKind::Set)?;
        self.set = Some(SetBuffer { rows: rows.into() });
        self.next_in_set()
    }

    /// Moves to the next row of the open result set.
    ///
    /// Returns `false` when the set is exhausted or none is open; any filter
    /// change discards the open set.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed`.
    pub fn next_in_set(&mut self) -> Result<bool> {
        self.ensure_open()?;
        match self.set.as_mut().and_then(|set| set.rows.pop_front()) {
            Some(row) => {
                self.load(row);
                Ok(true)
            }
            None => {
                if self.set.take().is_some() {
                    self.state = CursorState::AfterLast;
                }
                Ok(false)
            }
        }
    }

    // Writes

    /// Inserts the current record and re-reads it.
    ///
    /// Every non-NULL field is written. When the key is a single integer
    /// column left NULL, the generated rowid is adopted.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed` or data access errors.
    pub fn insert(&mut self) -> Result<()> {
        self.ensure_open()?;
        let outcome = self.exec(StatementKind::Insert)?;
        if let (Some(index), Some(rowid)) = (self.meta.rowid_key(), outcome.last_insert_id) {
            if self.record[index].is_null() {
                self.record[index] = SqlValue::Int(rowid);
            }
        }
        debug!(table = %self.meta.name(), "Inserted record");

        if !self.has_key() || !self.try_get_current()? {
            self.shadow.clone_from(&self.record);
            self.clear_masks();
            self.state = CursorState::OnRecord;
        }
        Ok(())
    }

    /// Writes the assigned non-key fields of the current record.
    ///
    /// # Errors
    ///
    /// Fails with `NoCurrentRecord` without a complete key and with
    /// `RecordNotFound` when no row has that key.
    pub fn update(&mut self) -> Result<()> {
        self.ensure_open()?;
        if !self.has_key() {
            return Err(CursorError::NoCurrentRecord);
        }
        let outcome = self.exec(StatementKind::Update)?;
        if outcome.rows_affected == 0 {
            return Err(CursorError::RecordNotFound);
        }
        debug!(table = %self.meta.name(), "Updated record");
        self.shadow.clone_from(&self.record);
        self.clear_masks();
        self.state = CursorState::OnRecord;
        Ok(())
    }

    /// Deletes the current record; its fields stay readable.
    ///
    /// # Errors
    ///
    /// Fails with `NoCurrentRecord` without a complete key and with
    /// `RecordNotFound` when no row has that key.
    pub fn delete(&mut self) -> Result<()> {
        self.ensure_open()?;
        if !self.has_key() {
            return Err(CursorError::NoCurrentRecord);
        }
        let outcome = self.exec(StatementKind::Delete)?;
        if outcome.rows_affected == 0 {
            return Err(CursorError::RecordNotFound);
        }
        debug!(table = %self.meta.name(), "Deleted record");
        self.shadow.clone_from(&self.record);
        self.clear_masks();
        self.state = CursorState::Unknown;
        Ok(())
    }

    /// Deletes every record matching the filters; returns how many.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed` or data access errors.
    pub fn delete_all(&mut self) -> Result<u64> {
        self.ensure_open()?;
        let outcome = self.exec(StatementKind::DeleteAll)?;
        debug!(table = %self.meta.name(), rows = outcome.rows_affected, "Deleted records");
        self.set = None;
        if self.state == CursorState::OnRecord {
            self.state = CursorState::Unknown;
        }
        Ok(outcome.rows_affected)
    }

    // Aggregates

    /// Number of records matching the filters.
    ///
    /// # Errors
    ///
    /// Fails with `CursorClosed` or data access errors.
    pub fn count(&mut self) -> Result<u64> {
        self.ensure_open()?;
        self.fetch_count(StatementKind::Count)
    }

    /// 1-based ordinal of the current record among the matching records.
    ///
    /// # Errors
    ///
    /// Fails with `NoCurrentRecord` unless the cursor is on a record.
    pub fn position(&mut self) -> Result<u64> {
        self.ensure_open()?;
        if self.state != CursorState::OnRecord {
            return Err(CursorError::NoCurrentRecord);
        }
        Ok(self.fetch_count(StatementKind::Position)? + 1)
    }

    // Lifecycle

    /// Closes the cursor, its shadow records and every statement handle.
    ///
    /// Every handle release is attempted; the first failure is returned.
    /// Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the first handle release failure.
    pub fn close(&mut self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.set = None;
        debug!(table = %self.meta.name(), "Closing cursor");
        self.cache.release_all(&mut self.session)
    }
}

impl<S: Session> Drop for Cursor<S> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(table = %self.meta.name(), error = %err, "Failed to close cursor");
        }
    }
}
