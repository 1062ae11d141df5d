//! In-memory backend for local runs and tests.
//!
//! [`InMemoryBackend`] keeps every table as a `Vec` of JSON rows behind a
//! [`tokio::sync::RwLock`] and evaluates [`Query`] filters directly on the
//! rows. It can be seeded from a JSON document keyed by table name.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use super::query::{Filter, json_cmp, project};
use super::{Backend, Query, Table};
use crate::domain::timestamp::to_iso_millis;
use crate::domain::{ChangeFeed, ChangeKind, RecordId, RowChange};
use crate::error::GatewayError;

/// JSON-row store implementing [`Backend`].
#[derive(Debug)]
pub struct InMemoryBackend {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
    feed: ChangeFeed,
}

impl InMemoryBackend {
    /// Creates an empty store publishing writes to `feed`.
    #[must_use]
    pub fn new(feed: ChangeFeed) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            feed,
        }
    }

    /// Creates a store pre-filled from `{"users": [...], "bookings": [...]}`.
    ///
    /// Seeding does not publish change events.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if the document is not an
    /// object of arrays or names an unknown table.
    pub fn from_seed(seed: Value, feed: ChangeFeed) -> Result<Self, GatewayError> {
        let Value::Object(map) = seed else {
            return Err(GatewayError::InvalidRequest(
                "seed must be a JSON object keyed by table".to_string(),
            ));
        };
        let mut tables = HashMap::new();
        for (name, rows) in map {
            let table: Table = name.parse()?;
            let Value::Array(rows) = rows else {
                return Err(GatewayError::InvalidRequest(format!(
                    "seed for {table} must be an array"
                )));
            };
            tables.insert(table, rows);
        }
        Ok(Self {
            tables: RwLock::new(tables),
            feed,
        })
    }

    /// Returns the number of rows stored in `table`.
    pub async fn len(&self, table: Table) -> usize {
        self.tables.read().await.get(&table).map_or(0, Vec::len)
    }

    /// Returns `true` if `table` holds no rows.
    pub async fn is_empty(&self, table: Table) -> bool {
        self.len(table).await == 0
    }

    fn attach_embeds(query: &Query, tables: &HashMap<Table, Vec<Value>>, row: &mut Value) {
        for embed in &query.embeds {
            let related = row
                .get(&embed.local_column)
                .filter(|v| !v.is_null())
                .and_then(|key| {
                    let by_id = Filter::Eq("id".to_string(), key.clone());
                    tables
                        .get(&embed.table)
                        .and_then(|rows| rows.iter().find(|r| by_id.matches(r)))
                })
                .map(|r| project(r.clone(), &embed.columns))
                .unwrap_or(Value::Null);
            if let Value::Object(map) = row {
                map.insert(embed.alias.clone(), related);
            }
        }
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, GatewayError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Value> = tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();

        if let Some((column, ascending)) = &query.order {
            rows.sort_by(|a, b| {
                let ord = match (a.get(column), b.get(column)) {
                    (Some(x), Some(y)) => json_cmp(x, y).unwrap_or(std::cmp::Ordering::Equal),
                    _ => std::cmp::Ordering::Equal,
                };
                if *ascending { ord } else { ord.reverse() }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        let mut keep = query.columns.clone();
        if !keep.is_empty() {
            keep.extend(query.embeds.iter().map(|e| e.alias.clone()));
        }
        Ok(rows
            .into_iter()
            .map(|mut row| {
                Self::attach_embeds(query, &tables, &mut row);
                project(row, &keep)
            })
            .collect())
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, GatewayError> {
        let Value::Object(mut map) = row else {
            return Err(GatewayError::InvalidRequest(format!(
                "insert into {table} expects a JSON object"
            )));
        };
        map.entry("id")
            .or_insert_with(|| RecordId::new().to_json());
        map.entry("created_at")
            .or_insert_with(|| Value::String(to_iso_millis(&Utc::now())));
        let row = Value::Object(map);

        self.tables
            .write()
            .await
            .entry(table)
            .or_default()
            .push(row.clone());

        self.feed
            .publish(RowChange::new(table, ChangeKind::Insert, row.clone()));
        tracing::debug!(%table, "row inserted");
        Ok(row)
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, GatewayError> {
        let Value::Object(patch) = patch else {
            return Err(GatewayError::InvalidRequest(format!(
                "update of {} expects a JSON object",
                query.table
            )));
        };

        let mut updated = Vec::new();
        {
            let mut tables = self.tables.write().await;
            if let Some(rows) = tables.get_mut(&query.table) {
                for row in rows.iter_mut().filter(|r| query.matches(r)) {
                    if let Value::Object(map) = row {
                        for (k, v) in &patch {
                            map.insert(k.clone(), v.clone());
                        }
                    }
                    updated.push(row.clone());
                }
            }
        }

        for row in &updated {
            self.feed
                .publish(RowChange::new(query.table, ChangeKind::Update, row.clone()));
        }
        tracing::debug!(table = %query.table, rows = updated.len(), "rows updated");
        Ok(updated)
    }
}
