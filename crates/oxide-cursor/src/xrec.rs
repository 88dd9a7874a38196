//! Shadow record handed out by a cursor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use oxide_cursor_core::{SqlValue, TableMeta};

use crate::error::{CursorError, Result};

/// A snapshot of a cursor's record as last fetched or written.
///
/// Closing the owning cursor closes every `XRec` it handed out; closing an
/// `XRec` leaves the owner open.
#[derive(Debug, Clone)]
pub struct XRec {
    meta: Arc<TableMeta>,
    values: Vec<SqlValue>,
    owner_closed: Arc<AtomicBool>,
    closed: bool,
}

impl XRec {
    pub(crate) fn new(
        meta: Arc<TableMeta>,
        values: Vec<SqlValue>,
        owner_closed: Arc<AtomicBool>,
    ) -> Self {
        Self {
            meta,
            values,
            owner_closed,
            closed: false,
        }
    }

    /// Whether this record or its owner has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed || self.owner_closed.load(Ordering::Acquire)
    }

    /// Closes this record only.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Table the record belongs to.
    #[must_use]
    pub fn table_name(&self) -> &str {
        self.meta.name()
    }

    /// Reads a field.
    ///
    /// # Errors
    ///
    /// Fails with [`CursorError::CursorClosed`] once closed and with
    /// [`CursorError::UnknownColumn`] for names the table lacks.
    pub fn get_value(&self, column: &str) -> Result<&SqlValue> {
        if self.is_closed() {
            return Err(CursorError::CursorClosed);
        }
        let index = self.meta.column_index(column)?;
        Ok(&self.values[index])
    }

    /// All fields in column order.
    ///
    /// # Errors
    ///
    /// Fails with [`CursorError::CursorClosed`] once closed.
    pub fn values(&self) -> Result<&[SqlValue]> {
        if self.is_closed() {
            return Err(CursorError::CursorClosed);
        }
        Ok(&self.values)
    }
}
