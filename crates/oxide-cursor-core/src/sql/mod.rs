//! Statement compilation.
//!
//! Each [`StatementKind`] compiles to one SQL text plus a parameter plan.
//! Read kinds depend on the [`FilterSet`]; write kinds depend on the table
//! model and the [`WriteShape`] only. Filter values are captured at compile
//! time, while record fields are read when the statement is bound.

use std::fmt;

use crate::error::Result;
use crate::filter::{FilterSet, OrderBy, OrderDirection};
use crate::schema::{quote_identifier, TableMeta};
use crate::value::SqlValue;

/// The operations a cursor compiles statements for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatementKind {
    /// Fetch by primary key, ignoring filters.
    Get,
    /// Insert the current record.
    Insert,
    /// Update the current record by key.
    Update,
    /// Delete the current record by key.
    Delete,
    /// Delete every matching record.
    DeleteAll,
    /// Ordered, limited result set for iteration.
    Set,
    /// Next matching record after the current one.
    Forwards,
    /// Previous matching record before the current one.
    Backwards,
    /// Current key under the filters.
    Here,
    /// First matching record.
    First,
    /// Last matching record.
    Last,
    /// Number of matching records.
    Count,
    /// Number of matching records ordered before the current one.
    Position,
}

impl StatementKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 13] = [
        Self::Get,
        Self::Insert,
        Self::Update,
        Self::Delete,
        Self::DeleteAll,
        Self::Set,
        Self::Forwards,
        Self::Backwards,
        Self::Here,
        Self::First,
        Self::Last,
        Self::Count,
        Self::Position,
    ];

    /// Whether the compiled SQL depends on the filter set.
    #[must_use]
    pub const fn depends_on_filters(self) -> bool {
        !matches!(self, Self::Get | Self::Insert | Self::Update | Self::Delete)
    }

    /// Whether the compiled SQL depends on the write shape.
    #[must_use]
    pub const fn depends_on_shape(self) -> bool {
        matches!(self, Self::Insert | Self::Update)
    }

    /// Lower-case name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::DeleteAll => "delete_all",
            Self::Set => "set",
            Self::Forwards => "forwards",
            Self::Backwards => "backwards",
            Self::Here => "here",
            Self::First => "first",
            Self::Last => "last",
            Self::Count => "count",
            Self::Position => "position",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a `?` placeholder takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    /// A filter value captured at compile time.
    Filter(usize),
    /// A field of the record the statement is bound against.
    Field(usize),
}

/// Which columns a write statement touches.
///
/// `assigned[i]` selects column `i`; `nulls[i]` marks it as written NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WriteShape {
    /// Columns the statement writes.
    pub assigned: Vec<bool>,
    /// Columns written as NULL.
    pub nulls: Vec<bool>,
}

impl WriteShape {
    /// Creates a shape from the two masks.
    #[must_use]
    pub const fn new(assigned: Vec<bool>, nulls: Vec<bool>) -> Self {
        Self { assigned, nulls }
    }

    fn writes(&self, index: usize) -> bool {
        self.assigned.get(index).copied().unwrap_or(false)
    }

    fn writes_null(&self, index: usize) -> bool {
        self.nulls.get(index).copied().unwrap_or(false)
    }
}

/// Compiled SQL text with its parameter plan.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSql {
    /// Operation the statement serves.
    pub kind: StatementKind,
    /// SQL text with `?` placeholders.
    pub sql: String,
    /// Source of each placeholder, in order.
    pub params: Vec<ParamSource>,
    filter_values: Vec<SqlValue>,
}

impl CompiledSql {
    /// Resolves the parameter plan against `record`.
    ///
    /// Fields missing from `record` bind as NULL.
    #[must_use]
    pub fn bind(&self, record: &[SqlValue]) -> Vec<SqlValue> {
        self.params
            .iter()
            .map(|source| {
                let value = match *source {
                    ParamSource::Filter(i) => self.filter_values.get(i),
                    ParamSource::Field(i) => record.get(i),
                };
                value.cloned().unwrap_or(SqlValue::Null)
            })
            .collect()
    }
}

/// Accumulates SQL fragments and their parameter plan.
#[derive(Default)]
struct Builder {
    params: Vec<ParamSource>,
    filter_values: Vec<SqlValue>,
}

impl Builder {
    fn field(&mut self, index: usize) {
        self.params.push(ParamSource::Field(index));
    }

    /// Filter conditions, with their values captured.
    fn filter_conditions(&mut self, filters: &FilterSet) -> Vec<String> {
        let (conditions, values) = filters.predicates();
        for value in values {
            self.params.push(ParamSource::Filter(self.filter_values.len()));
            self.filter_values.push(value);
        }
        conditions
    }

    fn key_conditions(&mut self, meta: &TableMeta) -> Vec<String> {
        meta.pk_indices()
            .iter()
            .map(|&i| {
                self.field(i);
                format!("{} = ?", quote_identifier(&meta.columns()[i].name))
            })
            .collect()
    }

    /// Lexicographic predicate "sorts strictly after the current record"
    /// (or before, when `after` is false) under `order`.
    fn order_predicate(
        &mut self,
        meta: &TableMeta,
        order: &[(usize, OrderDirection)],
        after: bool,
    ) -> String {
        let mut alternatives = Vec::with_capacity(order.len());
        for (pos, &(index, direction)) in order.iter().enumerate() {
            let mut conjuncts = Vec::with_capacity(pos + 1);
            for &(prior, _) in &order[..pos] {
                conjuncts.push(self.compare(meta, prior, Comparison::Equal));
            }
            let greater = (direction == OrderDirection::Asc) == after;
            let comparison = if greater {
                Comparison::Greater
            } else {
                Comparison::Less
            };
            conjuncts.push(self.compare(meta, index, comparison));
            alternatives.push(format!("({})", conjuncts.join(" AND ")));
        }
        format!("({})", alternatives.join(" OR "))
    }

    /// NULL-aware value comparison against the bound field; NULL sorts
    /// before every other value.
    fn compare(&mut self, meta: &TableMeta, index: usize, comparison: Comparison) -> String {
        let column = &meta.columns()[index];
        let nullable = column.nullable && !meta.is_key_column(index);
        let c = quote_identifier(&column.name);
        match (comparison, nullable) {
            (Comparison::Equal, false) => {
                self.field(index);
                format!("{c} = ?")
            }
            (Comparison::Equal, true) => {
                self.field(index);
                format!("{c} IS ?")
            }
            (Comparison::Greater, false) => {
                self.field(index);
                format!("{c} > ?")
            }
            (Comparison::Greater, true) => {
                self.field(index);
                self.field(index);
                format!("({c} > ? OR (? IS NULL AND {c} IS NOT NULL))")
            }
            (Comparison::Less, false) => {
                self.field(index);
                format!("{c} < ?")
            }
            (Comparison::Less, true) => {
                self.field(index);
                self.field(index);
                format!("(? IS NOT NULL AND ({c} < ? OR {c} IS NULL))")
            }
        }
    }

    fn finish(self, kind: StatementKind, sql: String) -> CompiledSql {
        CompiledSql {
            kind,
            sql,
            params: self.params,
            filter_values: self.filter_values,
        }
    }
}

#[derive(Clone, Copy)]
enum Comparison {
    Equal,
    Greater,
    Less,
}

fn where_clause(conditions: &[String]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

fn order_clause(order: &[OrderBy]) -> String {
    let items: Vec<String> = order.iter().map(OrderBy::to_sql).collect();
    format!(" ORDER BY {}", items.join(", "))
}

/// Resolves `order` to column positions of `meta`.
fn resolve_order(meta: &TableMeta, order: &[OrderBy]) -> Result<Vec<(usize, OrderDirection)>> {
    order
        .iter()
        .map(|item| Ok((meta.column_index(&item.column)?, item.direction)))
        .collect()
}

fn select_list(meta: &TableMeta) -> String {
    meta.columns()
        .iter()
        .map(|c| quote_identifier(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Compiles the statement for `kind`.
///
/// `shape` is only consulted for [`StatementKind::Insert`] and
/// [`StatementKind::Update`]; `filters` only for filter-dependent kinds.
///
/// # Errors
///
/// Returns [`crate::CoreError::UnknownColumn`] when the filter set orders by
/// a column `meta` lacks, which happens only for a set validated against
/// another model.
pub fn compile(
    kind: StatementKind,
    meta: &TableMeta,
    filters: &FilterSet,
    shape: &WriteShape,
) -> Result<CompiledSql> {
    let table = quote_identifier(meta.name());
    let columns = select_list(meta);
    let mut b = Builder::default();

    let sql = match kind {
        StatementKind::Get => {
            let keys = b.key_conditions(meta);
            format!("SELECT {columns} FROM {table}{}", where_clause(&keys))
        }
        StatementKind::Delete => {
            let keys = b.key_conditions(meta);
            format!("DELETE FROM {table}{}", where_clause(&keys))
        }
        StatementKind::Insert => compile_insert(&mut b, meta, shape),
        StatementKind::Update => compile_update(&mut b, meta, shape),
        StatementKind::DeleteAll => {
            let conditions = b.filter_conditions(filters);
            format!("DELETE FROM {table}{}", where_clause(&conditions))
        }
        StatementKind::Count => {
            let conditions = b.filter_conditions(filters);
            format!("SELECT COUNT(*) FROM {table}{}", where_clause(&conditions))
        }
        StatementKind::Position => {
            let mut conditions = b.filter_conditions(filters);
            let order = resolve_order(meta, &filters.effective_order(meta))?;
            conditions.push(b.order_predicate(meta, &order, false));
            format!("SELECT COUNT(*) FROM {table}{}", where_clause(&conditions))
        }
        StatementKind::Here => {
            let mut conditions = b.filter_conditions(filters);
            conditions.extend(b.key_conditions(meta));
            format!("SELECT {columns} FROM {table}{}", where_clause(&conditions))
        }
        StatementKind::First | StatementKind::Last => {
            let conditions = b.filter_conditions(filters);
            let mut order = filters.effective_order(meta);
            if kind == StatementKind::Last {
                order = order.iter().map(OrderBy::reversed).collect();
            }
            format!(
                "SELECT {columns} FROM {table}{}{} LIMIT 1",
                where_clause(&conditions),
                order_clause(&order)
            )
        }
        StatementKind::Forwards | StatementKind::Backwards => {
            let forwards = kind == StatementKind::Forwards;
            let mut conditions = b.filter_conditions(filters);
            let order = filters.effective_order(meta);
            conditions.push(b.order_predicate(meta, &resolve_order(meta, &order)?, forwards));
            let order: Vec<OrderBy> = if forwards {
                order
            } else {
                order.iter().map(OrderBy::reversed).collect()
            };
            format!(
                "SELECT {columns} FROM {table}{}{} LIMIT 1",
                where_clause(&conditions),
                order_clause(&order)
            )
        }
        StatementKind::Set => {
            let conditions = b.filter_conditions(filters);
            let order = filters.effective_order(meta);
            let mut sql = format!(
                "SELECT {columns} FROM {table}{}{}",
                where_clause(&conditions),
                order_clause(&order)
            );
            if let Some(limit) = filters.limit() {
                if limit.count == 0 {
                    sql.push_str(&format!(" LIMIT -1 OFFSET {}", limit.offset));
                } else {
                    sql.push_str(&format!(" LIMIT {} OFFSET {}", limit.count, limit.offset));
                }
            }
            sql
        }
    };

    Ok(b.finish(kind, sql))
}

fn compile_insert(b: &mut Builder, meta: &TableMeta, shape: &WriteShape) -> String {
    let table = quote_identifier(meta.name());
    let mut names = Vec::new();
    for (i, column) in meta.columns().iter().enumerate() {
        if shape.writes(i) && !shape.writes_null(i) {
            names.push(quote_identifier(&column.name));
            b.field(i);
        }
    }
    if names.is_empty() {
        return format!("INSERT INTO {table} DEFAULT VALUES");
    }
    let placeholders = vec!["?"; names.len()].join(", ");
    format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        names.join(", ")
    )
}

fn compile_update(b: &mut Builder, meta: &TableMeta, shape: &WriteShape) -> String {
    let table = quote_identifier(meta.name());
    let mut assignments = Vec::new();
    for (i, column) in meta.columns().iter().enumerate() {
        if !shape.writes(i) || meta.is_key_column(i) {
            continue;
        }
        let name = quote_identifier(&column.name);
        if shape.writes_null(i) {
            assignments.push(format!("{name} = NULL"));
        } else {
            assignments.push(format!("{name} = ?"));
            b.field(i);
        }
    }
    if assignments.is_empty() {
        // Touches nothing but still reports whether the key exists.
        let first_key = meta
            .primary_key()
            .first()
            .map(|k| quote_identifier(k))
            .unwrap_or_default();
        assignments.push(format!("{first_key} = {first_key}"));
    }
    let keys = b.key_conditions(meta);
    format!(
        "UPDATE {table} SET {}{}",
        assignments.join(", "),
        where_clause(&keys)
    )
}
