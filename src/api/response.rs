//! JSON envelopes and HTTP error mapping.
//!
//! Success: `{"success": true, "data": …, "meta"?: …}`
//! Failure: `{"success": false, "error": {"code", "message", "details"?}}`

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::db::DbError;
use crate::pagination::SortDirection;

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorMeta {
    pub next_cursor: Option<String>,
    pub has_more: bool,
    pub sort_by: String,
    pub sort_dir: SortDirection,
}

#[derive(Debug, Serialize)]
struct ApiSuccess<T: Serialize> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<CursorMeta>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
}

#[derive(Debug, Serialize)]
struct ApiFailure<'a> {
    success: bool,
    error: ErrorBody<'a>,
}

/// 200 with the success envelope.
pub fn ok<T: Serialize>(data: T, meta: Option<CursorMeta>) -> HttpResponse {
    HttpResponse::Ok().json(ApiSuccess {
        success: true,
        data,
        meta,
    })
}

/// Failure envelope with an explicit status.
pub fn fail(status: StatusCode, code: &str, message: &str, details: Option<&Value>) -> HttpResponse {
    HttpResponse::build(status).json(ApiFailure {
        success: false,
        error: ErrorBody {
            code,
            message,
            details,
        },
    })
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing auth context.")]
    Unauthorized,

    #[error("{message}")]
    Validation { message: String, details: Option<Value> },

    #[error("Endpoint not found.")]
    NotFound,

    #[error("Database is not ready.")]
    Unavailable,

    #[error(transparent)]
    Database(#[from] DbError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Validation { .. } | Self::Database(DbError::Encode(_)) => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Unavailable => "SERVICE_UNAVAILABLE",
            Self::Database(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Validation { .. } | Self::Database(DbError::Encode(_)) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::Validation { message, details } => {
                fail(self.status_code(), self.error_code(), message, details.as_ref())
            }
            Self::Database(DbError::Encode(e)) => {
                fail(self.status_code(), self.error_code(), &e.to_string(), None)
            }
            Self::Database(e) => {
                // Backend details stay in the log.
                log::error!("request failed: {}", e);
                fail(
                    self.status_code(),
                    self.error_code(),
                    "An unexpected error occurred.",
                    None,
                )
            }
            _ => fail(self.status_code(), self.error_code(), &self.to_string(), None),
        }
    }
}
