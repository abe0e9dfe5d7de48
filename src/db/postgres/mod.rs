//! Direct PostgreSQL backend.
//!
//! Statements run over a `deadpool-postgres` pool of `tokio-postgres` clients.
//! Parameters are bound as-is (no literal interpolation) and each column is
//! decoded into the shared `RowSet` shape.

mod conversion;

use std::error::Error;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts};
use tokio_postgres::types::ToSql;
use tokio_postgres::NoTls;

use super::backend::{DatabaseBackend, RowSet};
use super::config::PostgresConfig;
use super::escape::EncodeError;
use super::query::Statement;
use super::DbError;

pub use conversion::{row_to_record, JsonCell};

/// PostgreSQL backend over a bounded connection pool.
///
/// The pool size is fixed at construction. Connections are opened lazily, so
/// building the backend never touches the network; use `assert_db_ready` to
/// verify reachability.
pub struct PgPoolBackend {
    pool: Pool,
}

impl PgPoolBackend {
    /// Build a pool from configuration.
    ///
    /// # Errors
    /// Returns `DbError::Pool` if the connection string cannot be parsed or the
    /// pool cannot be created.
    pub fn new(config: &PostgresConfig) -> Result<Self, DbError> {
        let mut cfg = Config::new();
        cfg.url = Some(config.connection_string.clone());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_config = PoolConfig::new(config.pool_size);
        pool_config.timeouts = Timeouts {
            wait: config.acquire_timeout_secs.map(Duration::from_secs),
            ..Timeouts::default()
        };
        cfg.pool = Some(pool_config);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| DbError::Pool {
                message: format!("Failed to create pool: {}", e),
            })?;

        Ok(Self { pool })
    }

    /// Maximum number of pooled connections.
    pub fn max_size(&self) -> usize {
        self.pool.status().max_size
    }
}

#[async_trait]
impl DatabaseBackend for PgPoolBackend {
    async fn execute(&self, statement: &Statement) -> Result<RowSet, DbError> {
        statement.validate()?;

        let client = self.pool.get().await.map_err(|e| DbError::Pool {
            message: e.to_string(),
        })?;

        let params: Vec<&(dyn ToSql + Sync)> = statement
            .params()
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect();

        let rows = client
            .query(statement.text(), &params)
            .await
            .map_err(|e| query_error(&e))?;

        let records = rows
            .iter()
            .map(row_to_record)
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("postgres returned {} row(s)", records.len());
        Ok(RowSet::new(records))
    }

    fn backend_name(&self) -> &'static str {
        "PostgresPool"
    }

    async fn close(&self) {
        self.pool.close();
    }
}

/// Parameters that fail to bind are client input errors, everything else is a
/// query failure.
fn query_error(err: &tokio_postgres::Error) -> DbError {
    match encode_cause(err) {
        Some(encode) => DbError::Encode(encode.clone()),
        None => DbError::QueryFailed {
            message: describe_pg_error(err),
        },
    }
}

/// First `EncodeError` in the error's source chain, the error itself included.
fn encode_cause<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a EncodeError> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(encode) = e.downcast_ref::<EncodeError>() {
            return Some(encode);
        }
        current = e.source();
    }
    None
}

/// Prefer the server's own message over the driver's generic "db error".
fn describe_pg_error(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db_err) => {
            let mut message = format!("[{}] {}", db_err.code().code(), db_err.message());
            if let Some(detail) = db_err.detail() {
                message.push_str(" | ");
                message.push_str(detail);
            }
            if let Some(hint) = db_err.hint() {
                message.push_str(" | ");
                message.push_str(hint);
            }
            message
        }
        None => err.to_string(),
    }
}
