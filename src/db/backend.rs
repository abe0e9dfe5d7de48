//! Database backend trait shared by the direct and RPC implementations.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::query::Statement;
use super::DbError;

/// A single result row keyed by column name.
pub type Record = Map<String, Value>;

/// Rows returned by a backend, in result order.
///
/// Both backends normalize into this shape, so callers never see which
/// transport produced the rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    rows: Vec<Record>,
}

impl RowSet {
    pub fn new(rows: Vec<Record>) -> Self {
        Self { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn first(&self) -> Option<&Record> {
        self.rows.first()
    }

    pub fn into_first(self) -> Option<Record> {
        self.rows.into_iter().next()
    }

    pub fn into_rows(self) -> Vec<Record> {
        self.rows
    }

    /// Deserialize every row into `T`.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<Vec<T>, DbError> {
        self.rows
            .into_iter()
            .map(|row| {
                serde_json::from_value(Value::Object(row)).map_err(|e| DbError::Decode {
                    message: e.to_string(),
                })
            })
            .collect()
    }
}

impl From<Vec<Record>> for RowSet {
    fn from(rows: Vec<Record>) -> Self {
        Self::new(rows)
    }
}

/// Trait for backends that can execute statements.
///
/// One implementation is chosen at process start (see `DatabaseConfig::connect`)
/// and shared by every request.
#[async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Execute a statement, returning all rows.
    async fn execute(&self, statement: &Statement) -> Result<RowSet, DbError>;

    /// Execute a statement, returning the first row if there is one.
    async fn execute_one(&self, statement: &Statement) -> Result<Option<Record>, DbError> {
        Ok(self.execute(statement).await?.into_first())
    }

    /// Get the backend name for logging/debugging.
    fn backend_name(&self) -> &'static str;

    /// Release pooled resources. Called once on shutdown.
    async fn close(&self) {}
}
