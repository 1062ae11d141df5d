//! PostgreSQL implementation of the backend query interface.
//!
//! Queries are compiled into parameterized SQL with `sqlx::QueryBuilder`.
//! Rows come back as `jsonb` (`to_jsonb(t)`), so decoding goes through the
//! same serde models as the in-memory backend. Identifiers are validated
//! before they are spliced into SQL; every value is bound.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::query::{Filter, project};
use super::{Backend, Query, Table};
use crate::config::GatewayConfig;
use crate::domain::timestamp::{parse_timestamp, to_iso_millis};
use crate::domain::{ChangeFeed, ChangeKind, RowChange};
use crate::error::GatewayError;

/// PostgreSQL-backed query interface using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: PgPool,
    feed: ChangeFeed,
}

impl PostgresBackend {
    /// Creates a backend over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool, feed: ChangeFeed) -> Self {
        Self { pool, feed }
    }

    /// Opens a connection pool using the database settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::QueryFailed`] if the database is unreachable.
    pub async fn connect(config: &GatewayConfig, feed: ChangeFeed) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(|e| GatewayError::QueryFailed(e.to_string()))?;
        tracing::info!(
            max_connections = config.database_max_connections,
            "connected to postgres"
        );
        Ok(Self::new(pool, feed))
    }
}

#[async_trait]
impl Backend for PostgresBackend {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, GatewayError> {
        let mut qb = build_select(query)?;
        let rows = qb
            .build_query_scalar::<Value>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| GatewayError::QueryFailed(e.to_string()))?;

        let mut keep = query.columns.clone();
        if !keep.is_empty() {
            keep.extend(query.embeds.iter().map(|e| e.alias.clone()));
        }
        Ok(rows
            .into_iter()
            .map(|row| project(normalize_timestamps(row), &keep))
            .collect())
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, GatewayError> {
        let mut qb = build_insert(table, row)?;
        let stored = qb
            .build_query_scalar::<Value>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| GatewayError::QueryFailed(e.to_string()))?;
        let stored = normalize_timestamps(stored);

        self.feed
            .publish(RowChange::new(table, ChangeKind::Insert, stored.clone()));
        tracing::debug!(%table, "row inserted");
        Ok(stored)
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, GatewayError> {
        let mut qb = build_update(query, patch)?;
        let rows = qb
            .build_query_scalar::<Value>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| GatewayError::QueryFailed(e.to_string()))?;
        let rows: Vec<Value> = rows.into_iter().map(normalize_timestamps).collect();

        for row in &rows {
            self.feed
                .publish(RowChange::new(query.table, ChangeKind::Update, row.clone()));
        }
        tracing::debug!(table = %query.table, rows = rows.len(), "rows updated");
        Ok(rows)
    }
}

/// Compiles a read query.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] if an identifier is not a plain
/// lowercase SQL name.
pub fn build_select(query: &Query) -> Result<QueryBuilder<'static, Postgres>, GatewayError> {
    for ident in query.identifiers() {
        quote_ident(ident)?;
    }

    let mut qb = QueryBuilder::new("SELECT to_jsonb(t)");
    for embed in &query.embeds {
        let related = if embed.columns.is_empty() {
            "to_jsonb(e)".to_string()
        } else {
            let pairs = embed
                .columns
                .iter()
                .map(|c| Ok(format!("'{c}', e.{}", quote_ident(c)?)))
                .collect::<Result<Vec<_>, GatewayError>>()?;
            format!("jsonb_build_object({})", pairs.join(", "))
        };
        qb.push(format!(
            " || jsonb_build_object('{alias}', (SELECT {related} FROM {table} AS e \
             WHERE (e.id)::text = (t.{local})::text LIMIT 1))",
            alias = embed.alias,
            table = quote_ident(embed.table.as_str())?,
            local = quote_ident(&embed.local_column)?,
        ));
    }
    qb.push(format!(" FROM {} AS t", quote_ident(query.table.as_str())?));
    push_where(&mut qb, &query.filters)?;

    if let Some((column, ascending)) = &query.order {
        qb.push(format!(
            " ORDER BY t.{} {} NULLS LAST",
            quote_ident(column)?,
            if *ascending { "ASC" } else { "DESC" }
        ));
    }
    if let Some(limit) = query.limit {
        qb.push(" LIMIT ");
        qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    Ok(qb)
}

/// Compiles a single-row insert through `jsonb_populate_record`.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] if `row` is not a non-empty
/// object or has invalid column names.
pub fn build_insert(table: Table, row: Value) -> Result<QueryBuilder<'static, Postgres>, GatewayError> {
    let columns = object_columns(&row, table, "insert")?;
    let table_ident = quote_ident(table.as_str())?;

    let mut qb = QueryBuilder::new(format!(
        "INSERT INTO {table_ident} AS t ({cols}) SELECT {cols} FROM jsonb_populate_record(NULL::{table_ident}, ",
        cols = columns.join(", "),
    ));
    qb.push_bind(row);
    qb.push(") RETURNING to_jsonb(t)");
    Ok(qb)
}

/// Compiles an update that copies `patch` columns onto every matching row.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] if `patch` is not a non-empty
/// object or an identifier is invalid.
pub fn build_update(query: &Query, patch: Value) -> Result<QueryBuilder<'static, Postgres>, GatewayError> {
    let columns = object_columns(&patch, query.table, "update")?;
    for ident in query.identifiers() {
        quote_ident(ident)?;
    }
    let table_ident = quote_ident(query.table.as_str())?;

    let assignments = columns
        .iter()
        .map(|c| format!("{c} = r.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut qb = QueryBuilder::new(format!(
        "UPDATE {table_ident} AS t SET {assignments} FROM jsonb_populate_record(NULL::{table_ident}, "
    ));
    qb.push_bind(patch);
    qb.push(") AS r");
    push_where(&mut qb, &query.filters)?;
    qb.push(" RETURNING to_jsonb(t)");
    Ok(qb)
}

fn object_columns(value: &Value, table: Table, op: &str) -> Result<Vec<String>, GatewayError> {
    let Value::Object(map) = value else {
        return Err(GatewayError::InvalidRequest(format!(
            "{op} of {table} expects a JSON object"
        )));
    };
    if map.is_empty() {
        return Err(GatewayError::InvalidRequest(format!(
            "{op} of {table} has no columns"
        )));
    }
    map.keys().map(|k| quote_ident(k)).collect()
}

fn push_where(qb: &mut QueryBuilder<'static, Postgres>, filters: &[Filter]) -> Result<(), GatewayError> {
    for (i, filter) in filters.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        push_filter(qb, filter)?;
    }
    Ok(())
}

fn push_filter(qb: &mut QueryBuilder<'static, Postgres>, filter: &Filter) -> Result<(), GatewayError> {
    match filter {
        Filter::Eq(col, v) => push_comparison(qb, col, "=", v),
        Filter::Neq(col, v) => push_comparison(qb, col, "<>", v),
        Filter::Gte(col, v) => push_comparison(qb, col, ">=", v),
        Filter::Lt(col, v) => push_comparison(qb, col, "<", v),
        Filter::In(col, values) => push_any(qb, values, |qb, v| push_comparison(qb, col, "=", v)),
        Filter::Or(filters) => push_any(qb, filters, push_filter),
    }
}

fn push_any<T>(
    qb: &mut QueryBuilder<'static, Postgres>,
    items: &[T],
    mut push_one: impl FnMut(&mut QueryBuilder<'static, Postgres>, &T) -> Result<(), GatewayError>,
) -> Result<(), GatewayError> {
    if items.is_empty() {
        qb.push("FALSE");
        return Ok(());
    }
    qb.push("(");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        push_one(qb, item)?;
    }
    qb.push(")");
    Ok(())
}

fn push_comparison(
    qb: &mut QueryBuilder<'static, Postgres>,
    column: &str,
    op: &str,
    value: &Value,
) -> Result<(), GatewayError> {
    let col = format!("t.{}", quote_ident(column)?);
    match value {
        Value::Null => {
            qb.push(match op {
                "=" => format!("{col} IS NULL"),
                "<>" => format!("{col} IS NOT NULL"),
                _ => "FALSE".to_string(),
            });
        }
        Value::String(s) => {
            if let Some(ts) = parse_timestamp(s).filter(|_| s.contains('T')) {
                qb.push(format!("({col})::timestamptz {op} "));
                qb.push_bind(ts.with_timezone(&Utc));
            } else {
                qb.push(format!("({col})::text {op} "));
                qb.push_bind(s.clone());
            }
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) => {
                qb.push(format!("({col})::float8 {op} "));
                qb.push_bind(f);
            }
            None => {
                qb.push(format!("({col})::text {op} "));
                qb.push_bind(n.to_string());
            }
        },
        Value::Bool(b) => {
            qb.push(format!("({col})::boolean {op} "));
            qb.push_bind(*b);
        }
        Value::Array(_) | Value::Object(_) => {
            qb.push(format!("to_jsonb({col}) {op} "));
            qb.push_bind(value.clone());
        }
    }
    Ok(())
}

/// Quotes a column or table name after checking it is `[a-z_][a-z0-9_]*`.
fn quote_ident(name: &str) -> Result<String, GatewayError> {
    let mut chars = name.chars();
    let valid_head = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    let valid_tail = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid_head && valid_tail && name.len() <= 63 {
        Ok(format!("\"{name}\""))
    } else {
        Err(GatewayError::InvalidRequest(format!(
            "invalid identifier: {name}"
        )))
    }
}

/// Rewrites `*_at` timestamp columns into the canonical
/// `YYYY-MM-DDTHH:MM:SS.sssZ` form so string comparisons stay consistent
/// with the bounds the analytics pipeline generates.
fn normalize_timestamps(row: Value) -> Value {
    match row {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) if k.ends_with("_at") => Value::String(
                            parse_timestamp(&s).map_or(s, |ts| to_iso_millis(&ts)),
                        ),
                        obj @ Value::Object(_) => normalize_timestamps(obj),
                        other => other,
                    };
                    (k, v)
                })
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn select_sql_binds_values() {
        let query = Query::table(Table::Bookings)
            .eq("status", "confirmed")
            .gte("created_at", "2024-03-01T00:00:00.000Z")
            .order_by("created_at", false)
            .limit(10);
        let Ok(qb) = build_select(&query) else {
            panic!("query should compile");
        };
        let sql = qb.sql();
        assert!(sql.starts_with("SELECT to_jsonb(t) FROM \"bookings\" AS t WHERE "));
        assert!(sql.contains("(t.\"status\")::text = $1"));
        assert!(sql.contains("(t.\"created_at\")::timestamptz >= $2"));
        assert!(sql.contains("ORDER BY t.\"created_at\" DESC NULLS LAST LIMIT $3"));
        assert!(!sql.contains("confirmed"));
    }

    #[test]
    fn embeds_build_objects() {
        let query =
            Query::table(Table::Bookings).embed("venue", Table::Venues, "venue_id", &["name"]);
        let Ok(qb) = build_select(&query) else {
            panic!("query should compile");
        };
        assert!(qb.sql().contains(
            "jsonb_build_object('venue', (SELECT jsonb_build_object('name', e.\"name\")"
        ));
    }

    #[test]
    fn or_and_in_group_with_parentheses() {
        let query = Query::table(Table::Disputes)
            .or(vec![
                Filter::Eq("complainant_id".into(), json!("u-1")),
                Filter::Eq("defendant_id".into(), json!("u-1")),
            ])
            .in_list("status", vec![]);
        let Ok(qb) = build_select(&query) else {
            panic!("query should compile");
        };
        let sql = qb.sql();
        assert!(sql.contains(
            "WHERE ((t.\"complainant_id\")::text = $1 OR (t.\"defendant_id\")::text = $2) AND FALSE"
        ));
    }

    #[test]
    fn injection_in_identifiers_is_rejected() {
        let query = Query::table(Table::Users).eq("id; DROP TABLE users", "x");
        assert!(matches!(
            build_select(&query),
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[test]
    fn update_sql_assigns_patch_columns() {
        let query = Query::table(Table::Disputes).eq("id", "d-1");
        let Ok(qb) = build_update(&query, json!({"status": "resolved"})) else {
            panic!("update should compile");
        };
        assert_eq!(
            qb.sql(),
            "UPDATE \"disputes\" AS t SET \"status\" = r.\"status\" FROM jsonb_populate_record(NULL::\"disputes\", $1) AS r WHERE (t.\"id\")::text = $2 RETURNING to_jsonb(t)"
        );
    }

    #[test]
    fn insert_requires_columns() {
        assert!(build_insert(Table::Notifications, json!({})).is_err());
        assert!(build_insert(Table::Notifications, json!("row")).is_err());
    }

    #[test]
    fn timestamps_are_normalized() {
        let row = normalize_timestamps(json!({
            "created_at": "2024-03-01T00:00:00+00:00",
            "booking_date": "2024-03-02",
            "venue": {"updated_at": "2024-03-01 12:00:00+00"}
        }));
        assert_eq!(row["created_at"], json!("2024-03-01T00:00:00.000Z"));
        assert_eq!(row["booking_date"], json!("2024-03-02"));
        assert_eq!(row["venue"]["updated_at"], json!("2024-03-01T12:00:00.000Z"));
    }
}
