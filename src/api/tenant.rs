//! Tenant context for scoped queries.
//!
//! Authentication happens upstream. Whatever authenticates the request puts a
//! `TenantContext` into the request extensions; handlers take it as an
//! extractor and get 401 when it is absent.

use std::future::{ready, Ready};

use actix_web::dev::{Payload, ServiceRequest};
use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpMessage, HttpRequest};

use super::response::ApiError;

pub const PROPERTY_ID_HEADER: &str = "x-property-id";
pub const ACCOUNT_ID_HEADER: &str = "x-account-id";
pub const USER_ID_HEADER: &str = "x-user-id";

/// Identity the request acts under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub user_id: Option<String>,
    pub account_id: String,
    pub property_id: String,
}

impl TenantContext {
    /// Read the context from gateway headers.
    ///
    /// Both the property and the account header must be present and non-empty.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Some(Self {
            user_id: header(USER_ID_HEADER),
            account_id: header(ACCOUNT_ID_HEADER)?,
            property_id: header(PROPERTY_ID_HEADER)?,
        })
    }
}

/// Populate the tenant context from gateway headers when they are trusted.
///
/// An existing context set by another layer is left alone.
pub fn attach_gateway_tenant(req: &ServiceRequest, trust_gateway_headers: bool) {
    if !trust_gateway_headers || req.extensions().contains::<TenantContext>() {
        return;
    }
    if let Some(ctx) = TenantContext::from_headers(req.headers()) {
        req.extensions_mut().insert(ctx);
    }
}

impl FromRequest for TenantContext {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<TenantContext>()
                .cloned()
                .ok_or(ApiError::Unauthorized),
        )
    }
}
