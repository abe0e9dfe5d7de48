//! Database access layer.
//!
//! This module provides the data-access abstraction used by every endpoint:
//! - Parameter values (`SqlParam`) and statements with `$n` placeholders
//! - Literal encoding for transports without parameter binding
//! - Two interchangeable backends behind `DatabaseBackend`:
//!   a pooled PostgreSQL connection and an HTTP RPC tunnel (`exec_sql`)
//! - A uniform `RowSet` result shape
//!
//! # Architecture
//!
//! The backend is selected once at process start from configuration and
//! shared as `Arc<dyn DatabaseBackend>`. Callers build a `Statement` and never
//! branch on the transport.
//!
//! The RPC backend cannot bind parameters, so it renders each `$n` as an
//! escaped literal before sending. Placeholder validation happens in both
//! modes before any I/O.

mod backend;
mod config;
mod connection;
mod escape;
mod query;
mod value;

pub mod postgres;
pub mod rpc;

pub use backend::{DatabaseBackend, Record, RowSet};
pub use config::{DatabaseConfig, PostgresConfig, RpcConfig};
pub use connection::open_db;
pub use escape::{escape_string_literal, to_sql_literal, EncodeError};
pub use query::{assert_db_ready, interpolate_sql, run_query, Statement};
pub use value::SqlParam;

use thiserror::Error;

/// Database error types
#[derive(Error, Debug)]
pub enum DbError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("Missing SQL parameter for token {token} ({provided} provided)")]
    MissingParameter { token: String, provided: usize },

    #[error("Query failed: {message}")]
    QueryFailed { message: String },

    #[error("Connection pool error: {message}")]
    Pool { message: String },

    #[error("RPC transport error: {message}")]
    Transport { message: String },

    #[error("RPC error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error(
        "RPC error (404): Missing {signature}. Install the function on the remote database \
         and reload the API schema cache (NOTIFY pgrst, 'reload schema';). \
         Alternatively set DATABASE_URL to use a direct connection."
    )]
    RemoteProcedureMissing { signature: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Unsupported column type '{type_name}' for column '{column}'")]
    UnsupportedColumn { column: String, type_name: String },

    #[error("Failed to decode row: {message}")]
    Decode { message: String },
}
