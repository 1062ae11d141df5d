//! Fluent query builder shared by every backend.
//!
//! A [`Query`] names a [`Table`], an optional column projection, a list of
//! [`Filter`]s joined by AND, optional embeds (denormalized lookups into a
//! related table), ordering and a row limit. Backends either evaluate it in
//! memory ([`Query::matches`]) or compile it to SQL.

use std::cmp::Ordering;

use serde_json::Value;

use super::Table;

/// A single row predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq(String, Value),
    /// `column <> value`
    Neq(String, Value),
    /// `column >= value`
    Gte(String, Value),
    /// `column < value`
    Lt(String, Value),
    /// `column IN (values)`
    In(String, Vec<Value>),
    /// Any of the nested filters holds.
    Or(Vec<Filter>),
}

impl Filter {
    /// Evaluates the predicate against a JSON row.
    ///
    /// Missing columns and `null` never satisfy a comparison, mirroring SQL
    /// three-valued logic.
    #[must_use]
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Self::Eq(col, v) => field(row, col).is_some_and(|f| json_eq(f, v)),
            Self::Neq(col, v) => field(row, col).is_some_and(|f| !json_eq(f, v)),
            Self::Gte(col, v) => field(row, col)
                .and_then(|f| json_cmp(f, v))
                .is_some_and(Ordering::is_ge),
            Self::Lt(col, v) => field(row, col)
                .and_then(|f| json_cmp(f, v))
                .is_some_and(Ordering::is_lt),
            Self::In(col, vs) => field(row, col).is_some_and(|f| vs.iter().any(|v| json_eq(f, v))),
            Self::Or(filters) => filters.iter().any(|f| f.matches(row)),
        }
    }

    /// Columns referenced by this filter, including nested ones.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Self::Eq(c, _) | Self::Neq(c, _) | Self::Gte(c, _) | Self::Lt(c, _) | Self::In(c, _) => {
                vec![c.as_str()]
            }
            Self::Or(filters) => filters.iter().flat_map(Filter::columns).collect(),
        }
    }
}

/// Denormalized lookup of a related row, attached under `alias`.
///
/// `local_column` on the queried row is matched against `id` in `table`;
/// only `columns` of the related row are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    /// Key the related object is stored under.
    pub alias: String,
    /// Related table.
    pub table: Table,
    /// Foreign-key column on the queried row.
    pub local_column: String,
    /// Columns of the related row to keep.
    pub columns: Vec<String>,
}

/// Read/update query against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Target table.
    pub table: Table,
    /// Projected columns; empty means all.
    pub columns: Vec<String>,
    /// Predicates, all of which must hold.
    pub filters: Vec<Filter>,
    /// Related rows to attach.
    pub embeds: Vec<Embed>,
    /// Sort column and direction (`true` = ascending).
    pub order: Option<(String, bool)>,
    /// Maximum number of rows.
    pub limit: Option<usize>,
}

impl Query {
    /// Starts a query selecting every column of `table`.
    #[must_use]
    pub fn table(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            filters: Vec::new(),
            embeds: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Restricts the projection to the given columns.
    #[must_use]
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Adds `column = value`.
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    /// Adds `column <> value`.
    #[must_use]
    pub fn neq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters
            .push(Filter::Neq(column.to_string(), value.into()));
        self
    }

    /// Adds `column >= value`.
    #[must_use]
    pub fn gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters
            .push(Filter::Gte(column.to_string(), value.into()));
        self
    }

    /// Adds `column < value`.
    #[must_use]
    pub fn lt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Lt(column.to_string(), value.into()));
        self
    }

    /// Adds `column IN (values)`.
    #[must_use]
    pub fn in_list(mut self, column: &str, values: Vec<Value>) -> Self {
        self.filters.push(Filter::In(column.to_string(), values));
        self
    }

    /// Adds a disjunction of filters.
    #[must_use]
    pub fn or(mut self, filters: Vec<Filter>) -> Self {
        self.filters.push(Filter::Or(filters));
        self
    }

    /// Attaches `columns` of the `table` row whose id equals `local_column`.
    #[must_use]
    pub fn embed(mut self, alias: &str, table: Table, local_column: &str, columns: &[&str]) -> Self {
        self.embeds.push(Embed {
            alias: alias.to_string(),
            table,
            local_column: local_column.to_string(),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        });
        self
    }

    /// Orders the result by `column`.
    #[must_use]
    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some((column.to_string(), ascending));
        self
    }

    /// Caps the number of returned rows.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether every filter holds for `row`.
    #[must_use]
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Every identifier the query would splice into SQL.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .map(String::as_str)
            .chain(self.filters.iter().flat_map(Filter::columns))
            .chain(self.embeds.iter().flat_map(|e| {
                std::iter::once(e.alias.as_str())
                    .chain(std::iter::once(e.local_column.as_str()))
                    .chain(e.columns.iter().map(String::as_str))
            }))
            .chain(self.order.iter().map(|(c, _)| c.as_str()))
    }
}

/// Keeps only `columns` of a JSON object row. Empty `columns` keeps all.
#[must_use]
pub fn project(row: Value, columns: &[String]) -> Value {
    if columns.is_empty() {
        return row;
    }
    match row {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(k, _)| columns.iter().any(|c| c == k))
                .collect(),
        ),
        other => other,
    }
}

/// Orders two JSON values: numbers numerically, strings lexically, booleans
/// false < true. Mixed or null operands are incomparable.
#[must_use]
pub fn json_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Equality that treats `1` and `"1"` as the same key.
#[must_use]
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            *s == n.to_string()
        }
        _ => json_cmp(a, b).is_some_and(Ordering::is_eq),
    }
}

fn field<'a>(row: &'a Value, column: &str) -> Option<&'a Value> {
    row.get(column).filter(|v| !v.is_null())
}
