//! Filter state of a cursor.
//!
//! A [`FilterSet`] collects per-column filters, one optional complex filter,
//! the user ordering and an optional limit. Every mutation validates against
//! the table model first and bumps [`FilterSet::version`] only on success,
//! so a failed call leaves the set untouched.

mod complex;
mod expr;
mod order;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use complex::canonicalize;
pub use expr::{CompareOp, FilterExpr};
pub use order::{OrderBy, OrderDirection};

use crate::error::Result;
use crate::schema::{quote_identifier, TableMeta};
use crate::value::{SqlValue, ToSqlValue};

/// Filter on a single column.
#[derive(Debug, Clone)]
pub enum FilterSpec {
    /// Single value; NULL means IS NULL.
    Exact(SqlValue),
    /// Inclusive range.
    Range { from: SqlValue, to: SqlValue },
    /// Parsed filter expression and the text it came from.
    Expr { source: String, expr: FilterExpr },
}

impl PartialEq for FilterSpec {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Exact(a), Self::Exact(b)) => a == b,
            (Self::Range { from: f1, to: t1 }, Self::Range { from: f2, to: t2 }) => {
                f1 == f2 && t1 == t2
            }
            (Self::Expr { expr: a, .. }, Self::Expr { expr: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl FilterSpec {
    /// Builds the SQL predicate for `column` and its parameters.
    #[must_use]
    pub fn to_sql(&self, column: &str) -> (String, Vec<SqlValue>) {
        let column_sql = quote_identifier(column);
        match self {
            Self::Exact(SqlValue::Null) => (format!("{column_sql} IS NULL"), vec![]),
            Self::Exact(value) => (format!("{column_sql} = ?"), vec![value.clone()]),
            Self::Range { from, to } => (
                format!("{column_sql} BETWEEN ? AND ?"),
                vec![from.clone(), to.clone()],
            ),
            Self::Expr { expr, .. } => expr.to_sql(&column_sql),
        }
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(value) => write!(f, "{value}"),
            Self::Range { from, to } => write!(f, "{from}..{to}"),
            Self::Expr { source, .. } => f.write_str(source),
        }
    }
}

/// Row window applied to set iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    /// Rows to skip.
    pub offset: u64,
    /// Rows to return; zero means no limit.
    pub count: u64,
}

/// Filters, complex filter, ordering and limit of a cursor.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: BTreeMap<String, FilterSpec>,
    complex_filter: Option<String>,
    order_by: Vec<OrderBy>,
    limit: Option<Limit>,
    version: u64,
}

impl FilterSet {
    /// Creates an empty filter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-column filters, ordered by column name.
    #[must_use]
    pub const fn filters(&self) -> &BTreeMap<String, FilterSpec> {
        &self.filters
    }

    /// Canonical complex filter, if any.
    #[must_use]
    pub fn complex_filter(&self) -> Option<&str> {
        self.complex_filter.as_deref()
    }

    /// User ordering.
    #[must_use]
    pub fn order(&self) -> &[OrderBy] {
        &self.order_by
    }

    /// Row window for set iteration.
    #[must_use]
    pub const fn limit(&self) -> Option<Limit> {
        self.limit
    }

    /// Mutation counter; compiled statements remember the version they saw.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Whether nothing restricts or orders the set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
            && self.complex_filter.is_none()
            && self.order_by.is_empty()
            && self.limit.is_none()
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Sets a filter-expression filter on `column`.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownColumn` or `InvalidFilter`; the set is unchanged.
    pub fn set_filter(&mut self, meta: &TableMeta, column: &str, source: &str) -> Result<()> {
        let column_meta = meta.column(column)?;
        let expr = FilterExpr::parse(column, column_meta.column_type, source)?;
        self.filters.insert(
            column.to_string(),
            FilterSpec::Expr {
                source: source.trim().to_string(),
                expr,
            },
        );
        self.touch();
        Ok(())
    }

    /// Filters `column` to a single value; NULL selects rows where it is NULL.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownColumn` or `TypeMismatch`; the set is unchanged.
    pub fn set_range(
        &mut self,
        meta: &TableMeta,
        column: &str,
        value: impl ToSqlValue,
    ) -> Result<()> {
        let column_meta = meta.column(column)?;
        let value = value
            .to_sql_value()
            .coerce_to(column, column_meta.column_type)?;
        self.filters
            .insert(column.to_string(), FilterSpec::Exact(value));
        self.touch();
        Ok(())
    }

    /// Filters `column` to the inclusive range `from..=to`.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownColumn` or `TypeMismatch`; the set is unchanged.
    pub fn set_range_between(
        &mut self,
        meta: &TableMeta,
        column: &str,
        from: impl ToSqlValue,
        to: impl ToSqlValue,
    ) -> Result<()> {
        let column_type = meta.column(column)?.column_type;
        let from = from.to_sql_value().coerce_to(column, column_type)?;
        let to = to.to_sql_value().coerce_to(column, column_type)?;
        self.filters
            .insert(column.to_string(), FilterSpec::Range { from, to });
        self.touch();
        Ok(())
    }

    /// Removes the filter on `column`, if any.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownColumn` for columns the table lacks.
    pub fn remove_filter(&mut self, meta: &TableMeta, column: &str) -> Result<()> {
        meta.column_index(column)?;
        if self.filters.remove(column).is_some() {
            self.touch();
        }
        Ok(())
    }

    /// Sets the complex filter; blank input clears it.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownColumn` or `InvalidExpression`; the set is unchanged.
    pub fn set_complex_filter(&mut self, meta: &TableMeta, source: &str) -> Result<()> {
        self.complex_filter = canonicalize(source, meta)?;
        self.touch();
        Ok(())
    }

    /// Replaces the user ordering.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidOrder` or `UnknownColumn`; the set is unchanged.
    pub fn order_by(&mut self, meta: &TableMeta, specs: &[&str]) -> Result<()> {
        let order = specs
            .iter()
            .map(|spec| OrderBy::parse_for(spec, meta))
            .collect::<Result<Vec<_>>>()?;
        self.order_by = order;
        self.touch();
        Ok(())
    }

    /// Sets the row window for set iteration; a zero count means no limit.
    pub fn set_limit(&mut self, offset: u64, count: u64) {
        self.limit = if offset == 0 && count == 0 {
            None
        } else {
            Some(Limit { offset, count })
        };
        self.touch();
    }

    /// Replaces this set with a structural copy of `other`.
    pub fn copy_from(&mut self, other: &Self) {
        self.filters.clone_from(&other.filters);
        self.complex_filter.clone_from(&other.complex_filter);
        self.order_by.clone_from(&other.order_by);
        self.limit = other.limit;
        self.touch();
    }

    /// Clears filters, ordering and limit.
    pub fn reset(&mut self) {
        self.filters.clear();
        self.complex_filter = None;
        self.order_by.clear();
        self.limit = None;
        self.touch();
    }

    /// Structural equality ignoring the version counter.
    #[must_use]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.filters == other.filters
            && self.complex_filter == other.complex_filter
            && self.order_by == other.order_by
            && self.limit == other.limit
    }

    /// User ordering followed by the missing key columns, ascending.
    #[must_use]
    pub fn effective_order(&self, meta: &TableMeta) -> Vec<OrderBy> {
        let mut order = self.order_by.clone();
        for key in meta.primary_key() {
            if !order.iter().any(|o| &o.column == key) {
                order.push(OrderBy::asc(key));
            }
        }
        order
    }

    /// WHERE conditions of the filter set and their parameters, in order.
    #[must_use]
    pub fn predicates(&self) -> (Vec<String>, Vec<SqlValue>) {
        let mut conditions = Vec::with_capacity(self.filters.len() + 1);
        let mut params = Vec::new();
        for (column, spec) in &self.filters {
            let (sql, values) = spec.to_sql(column);
            conditions.push(sql);
            params.extend(values);
        }
        if let Some(complex) = &self.complex_filter {
            conditions.push(format!("({complex})"));
        }
        (conditions, params)
    }
}
