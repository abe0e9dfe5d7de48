//! Database connection management.

use std::sync::Arc;

use super::backend::DatabaseBackend;
use super::config::DatabaseConfig;
use super::query::assert_db_ready;
use super::DbError;

/// Build the configured backend and verify it answers `SELECT 1`.
pub async fn open_db(config: &DatabaseConfig) -> Result<Arc<dyn DatabaseBackend>, DbError> {
    log::info!("connecting to database: {}", config.describe());
    let db = config.connect()?;

    if let Err(e) = assert_db_ready(db.as_ref()).await {
        log::error!("database readiness check failed ({}): {}", db.backend_name(), e);
        db.close().await;
        return Err(e);
    }

    log::info!("database ready ({})", db.backend_name());
    Ok(db)
}
