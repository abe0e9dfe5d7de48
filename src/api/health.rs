use actix_web::{web, HttpResponse};
use serde_json::json;

use super::response::{ok, ApiError};
use super::AppState;
use crate::db::assert_db_ready;

/// Liveness plus a `SELECT 1` round trip through the configured backend.
pub async fn health(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    if let Err(e) = assert_db_ready(state.db.as_ref()).await {
        log::warn!("health check failed: {}", e);
        return Err(ApiError::Unavailable);
    }
    Ok(ok(json!({ "ok": true }), None))
}
