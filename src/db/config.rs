//! Database configuration for runtime backend selection.
//!
//! The backend is chosen once at process start:
//! 1. `.hotel_ops.json` in the working directory, if present
//! 2. `DATABASE_URL` / `SUPABASE_DB_URL` → direct PostgreSQL pool
//! 3. `SUPABASE_URL` + `SUPABASE_SERVICE_KEY` → HTTP RPC tunnel

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::backend::DatabaseBackend;
use super::postgres::PgPoolBackend;
use super::rpc::RpcBackend;
use super::DbError;
use crate::config::{ConfigError, ConfigFile};

/// Default number of pooled connections.
pub const DEFAULT_POOL_SIZE: usize = 20;

fn default_pool_size() -> usize {
    DEFAULT_POOL_SIZE
}

/// Direct connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub connection_string: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// How long a request waits for a free connection before failing.
    #[serde(default)]
    pub acquire_timeout_secs: Option<u64>,
}

impl PostgresConfig {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            pool_size: DEFAULT_POOL_SIZE,
            acquire_timeout_secs: None,
        }
    }
}

/// RPC tunnel settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcConfig {
    pub url: String,
    pub service_key: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Selected database backend.
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseConfig {
    Postgres(PostgresConfig),
    Rpc(RpcConfig),
}

impl DatabaseConfig {
    /// Create a backend instance from this configuration.
    pub fn connect(&self) -> Result<Arc<dyn DatabaseBackend>, DbError> {
        let backend: Arc<dyn DatabaseBackend> = match self {
            Self::Postgres(pg) => Arc::new(PgPoolBackend::new(pg)?),
            Self::Rpc(rpc) => Arc::new(RpcBackend::new(rpc)?),
        };
        Ok(backend)
    }

    /// Human-readable summary without credentials.
    pub fn describe(&self) -> String {
        match self {
            Self::Postgres(pg) => format!("direct PostgreSQL pool (max {} connections)", pg.pool_size),
            Self::Rpc(rpc) => format!("RPC tunnel via {}", rpc.url),
        }
    }

    /// Select a backend from variable lookups.
    ///
    /// Empty values count as unset. A project URL without a service key is an
    /// error rather than a silent fallback.
    pub fn from_vars<F>(lookup: F) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = var("DATABASE_URL").or_else(|| var("SUPABASE_DB_URL")) {
            return Ok(Some(Self::Postgres(PostgresConfig::new(url))));
        }

        match (var("SUPABASE_URL"), var("SUPABASE_SERVICE_KEY")) {
            (Some(url), Some(service_key)) => Ok(Some(Self::Rpc(RpcConfig {
                url,
                service_key,
                timeout_secs: None,
            }))),
            (Some(_), None) => Err(ConfigError::MissingServiceKey),
            _ => Ok(None),
        }
    }

    /// Load from environment variables.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Resolve configuration from config file and environment.
    ///
    /// Priority: Config file > Environment. Having neither is an error.
    pub fn resolve() -> Result<Self, ConfigError> {
        if let Some(config_file) = ConfigFile::load()? {
            return Ok(config_file.database.to_database_config());
        }

        Self::from_env()?.ok_or(ConfigError::NoDatabase)
    }
}
