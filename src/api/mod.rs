//! HTTP surface.
//!
//! Every list endpoint is a `ListResource` from `resources` served by the one
//! generic handler in `listing`. Tenant scoping comes from the
//! `TenantContext` extractor, responses use the envelopes in `response`.

mod health;
pub mod listing;
pub mod resources;
pub mod response;
pub mod tenant;

use std::sync::Arc;

use actix_web::{web, HttpResponse};

use crate::db::DatabaseBackend;

pub use listing::{list_handler, Filter, FilterKind, ListPlan, ListResource, Scope};
pub use response::{fail, ok, ApiError, CursorMeta};
pub use tenant::{attach_gateway_tenant, TenantContext};

/// State shared by every worker.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseBackend>,
}

impl AppState {
    pub fn new(db: Arc<dyn DatabaseBackend>) -> Self {
        Self { db }
    }
}

/// Register `/health`, every list endpoint and the JSON 404 fallback.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default().error_handler(|err, _req| ApiError::validation(err.to_string()).into()),
    );
    cfg.route("/health", web::get().to(health::health));
    for resource in resources::ALL {
        cfg.service(
            web::resource(resource.path)
                .app_data(web::Data::new(*resource))
                .route(web::get().to(list_handler)),
        );
    }
    cfg.default_service(web::to(not_found));
}

async fn not_found() -> Result<HttpResponse, ApiError> {
    Err(ApiError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DbError, EncodeError, SqlParam};
    use crate::pagination::{decode_cursor, CursorToken};
    use crate::test_utils::{app_state, record, tenant, FakeBackend};
    use actix_web::dev::Service;
    use actix_web::http::StatusCode;
    use actix_web::{test, App, HttpMessage};
    use serde_json::{json, Value};

    macro_rules! service {
        ($backend:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(app_state($backend.clone())))
                    .wrap_fn(|req, srv| {
                        attach_gateway_tenant(&req, true);
                        srv.call(req)
                    })
                    .configure(configure),
            )
            .await
        };
    }

    fn get(uri: &str) -> test::TestRequest {
        test::TestRequest::get()
            .uri(uri)
            .insert_header((tenant::PROPERTY_ID_HEADER, "prop-1"))
            .insert_header((tenant::ACCOUNT_ID_HEADER, "acct-1"))
    }

    #[actix_rt::test]
    async fn test_list_reviews_first_page() {
        let backend = FakeBackend::new();
        backend.push_rows(vec![
            record(json!({"id": "rev-3", "rating": 5, "sort_value": "2026-03-03T10:00:00+00:00"})),
            record(json!({"id": "rev-2", "rating": 4, "sort_value": "2026-03-02T10:00:00+00:00"})),
            record(json!({"id": "rev-1", "rating": 2, "sort_value": "2026-03-01T10:00:00+00:00"})),
        ]);
        let app = service!(backend);

        let resp = test::call_service(&app, get("/v1.0/reviews?limit=2").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;

        assert_eq!(body["success"], json!(true));
        assert_eq!(
            body["data"]["items"],
            json!([{"id": "rev-3", "rating": 5}, {"id": "rev-2", "rating": 4}])
        );
        assert_eq!(body["meta"]["has_more"], json!(true));
        assert_eq!(body["meta"]["sort_by"], json!("reviewed_at"));
        assert_eq!(body["meta"]["sort_dir"], json!("desc"));
        let cursor = decode_cursor(body["meta"]["next_cursor"].as_str()).unwrap();
        assert_eq!(cursor, CursorToken::new("2026-03-02T10:00:00+00:00", "rev-2"));

        let statement = backend.last_statement();
        assert_eq!(statement.params()[0], SqlParam::from("prop-1"));
        assert_eq!(statement.params().last(), Some(&SqlParam::Int(3)));
    }

    #[actix_rt::test]
    async fn test_next_page_uses_cursor() {
        let backend = FakeBackend::new();
        let app = service!(backend);
        let cursor = crate::pagination::encode_cursor(&CursorToken::new(4i64, "rev-2"));

        let uri = format!("/v1.0/reviews?sort_by=rating&cursor={}", cursor);
        let resp = test::call_service(&app, get(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["items"], json!([]));
        assert_eq!(body["meta"]["has_more"], json!(false));
        assert_eq!(body["meta"]["next_cursor"], Value::Null);

        let statement = backend.last_statement();
        assert!(statement
            .text()
            .contains("((r.rating < $2::integer) OR (r.rating = $2::integer AND r.id < $3))"));
        assert_eq!(&statement.params()[1..3], &[SqlParam::Int(4), SqlParam::from("rev-2")]);
    }

    #[actix_rt::test]
    async fn test_missing_tenant_is_unauthorized() {
        let backend = FakeBackend::new();
        let app = service!(backend);
        let req = test::TestRequest::get().uri("/v1.0/reviews").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], json!("UNAUTHORIZED"));
        assert!(backend.statements().is_empty());
    }

    #[actix_rt::test]
    async fn test_context_set_upstream_is_honoured() {
        let backend = FakeBackend::new();
        let app = service!(backend);
        let req = test::TestRequest::get().uri("/v1.0/campaign-templates").to_request();
        req.extensions_mut().insert(tenant::TenantContext {
            account_id: "acct-9".to_string(),
            ..tenant()
        });
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(backend.last_statement().params()[0], SqlParam::from("acct-9"));
    }

    #[actix_rt::test]
    async fn test_invalid_filter_is_bad_request() {
        let backend = FakeBackend::new();
        let app = service!(backend);
        let resp = test::call_service(&app, get("/v1.0/reviews?rating_min=high").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
        assert!(backend.statements().is_empty());
    }

    #[actix_rt::test]
    async fn test_backend_failure_is_opaque_500() {
        let backend = FakeBackend::new();
        backend.push_error(DbError::QueryFailed {
            message: "column r.secret does not exist".to_string(),
        });
        let app = service!(backend);
        let resp = test::call_service(&app, get("/v1.0/settings/integrations").to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["message"], json!("An unexpected error occurred."));
    }

    #[actix_rt::test]
    async fn test_conversation_thread_binds_path_segment() {
        let backend = FakeBackend::new();
        backend.push_rows(vec![record(
            json!({"id": "msg-1", "content": "Hi", "sort_value": "2026-03-01T10:00:00.000000Z"}),
        )]);
        let app = service!(backend);

        let uri = "/v1.0/messages/conversations/conv-42/thread";
        let resp = test::call_service(&app, get(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["items"], json!([{"id": "msg-1", "content": "Hi"}]));
        assert_eq!(body["meta"]["sort_by"], json!("created_at"));

        let statement = backend.last_statement();
        assert!(statement.text().contains("cm.conversation_id = $2"));
        assert_eq!(
            statement.params(),
            &[SqlParam::from("prop-1"), SqlParam::from("conv-42"), SqlParam::Int(31)]
        );
    }

    #[actix_rt::test]
    async fn test_agent_history_filters_by_key() {
        let backend = FakeBackend::new();
        let app = service!(backend);
        let resp = test::call_service(&app, get("/v1.0/agents/reviews/history?status=failed").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let statement = backend.last_statement();
        assert!(statement.text().contains("aa.key::text = $2"));
        assert_eq!(
            &statement.params()[..3],
            &[SqlParam::from("prop-1"), SqlParam::from("reviews"), SqlParam::from("failed")]
        );
    }

    #[actix_rt::test]
    async fn test_bind_failure_is_bad_request() {
        let backend = FakeBackend::new();
        backend.push_error(DbError::Encode(EncodeError::InvalidLiteral {
            type_name: "uuid".to_string(),
            value: "nope".to_string(),
        }));
        let app = service!(backend);
        let uri = "/v1.0/messages/conversations/nope/thread";
        let resp = test::call_service(&app, get(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
        assert_eq!(body["error"]["message"], json!("Invalid uuid value: nope"));
    }

    #[actix_rt::test]
    async fn test_health() {
        let backend = FakeBackend::new();
        backend.push_rows(vec![record(json!({"ok": 1}))]);
        let app = service!(backend);
        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"success": true, "data": {"ok": true}}));
    }

    #[actix_rt::test]
    async fn test_health_when_database_is_down() {
        let backend = FakeBackend::new();
        backend.push_error(DbError::Transport {
            message: "connection refused".to_string(),
        });
        let app = service!(backend);
        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_rt::test]
    async fn test_unknown_path_is_json_404() {
        let backend = FakeBackend::new();
        let app = service!(backend);
        let resp = test::call_service(&app, get("/v1.0/nope").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body,
            json!({"success": false, "error": {"code": "NOT_FOUND", "message": "Endpoint not found."}})
        );
    }
}
