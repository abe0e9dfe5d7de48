//! HTTP RPC backend.
//!
//! Used when no direct connection string is configured. Each statement is
//! rendered into literal SQL and posted to the remote `exec_sql` procedure,
//! which returns the result rows as JSON.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::backend::{DatabaseBackend, Record, RowSet};
use super::config::RpcConfig;
use super::query::Statement;
use super::DbError;

/// Name of the remote procedure that executes SQL text.
pub const EXEC_SQL_RPC_NAME: &str = "exec_sql";

/// Signature reported when the procedure is missing.
pub const EXEC_SQL_SIGNATURE: &str = "public.exec_sql(sql text)";

const UNKNOWN_RPC_ERROR: &str = "Unknown RPC error.";

/// Backend that tunnels statements through `POST /rest/v1/rpc/exec_sql`.
pub struct RpcBackend {
    client: reqwest::Client,
    endpoint: String,
    service_key: String,
}

impl RpcBackend {
    /// Build the HTTP client. No request is sent until the first statement.
    pub fn new(config: &RpcConfig) -> Result<Self, DbError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| DbError::Transport {
            message: format!("Failed to build HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            endpoint: rpc_endpoint(&config.url),
            service_key: config.service_key.clone(),
        })
    }
}

/// `<base>/rest/v1/rpc/exec_sql`, tolerating a trailing slash on the base URL.
pub fn rpc_endpoint(base_url: &str) -> String {
    format!(
        "{}/rest/v1/rpc/{}",
        base_url.trim_end_matches('/'),
        EXEC_SQL_RPC_NAME
    )
}

#[async_trait]
impl DatabaseBackend for RpcBackend {
    async fn execute(&self, statement: &Statement) -> Result<RowSet, DbError> {
        let sql = statement.interpolate()?;
        log::debug!("rpc exec_sql: {}", sql);

        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({ "sql": sql }))
            .send()
            .await
            .map_err(|e| DbError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| DbError::Transport {
            message: format!("Failed to read response body: {}", e),
        })?;

        interpret_rpc_response(status, &body)
    }

    fn backend_name(&self) -> &'static str {
        "Rpc"
    }
}

/// Classify an `exec_sql` response into rows or an error.
pub fn interpret_rpc_response(status: u16, body: &str) -> Result<RowSet, DbError> {
    let payload = if body.trim().is_empty() {
        Some(Value::Null)
    } else {
        serde_json::from_str::<Value>(body).ok()
    };

    if !(200..300).contains(&status) {
        let message = match &payload {
            Some(value) => {
                if status == 404 && is_missing_exec_sql(value) {
                    return Err(DbError::RemoteProcedureMissing {
                        signature: EXEC_SQL_SIGNATURE.to_string(),
                    });
                }
                format_rpc_error(value)
            }
            None => body.to_string(),
        };
        return Err(DbError::Remote { status, message });
    }

    let Some(payload) = payload else {
        log::warn!("exec_sql returned a non-JSON body with status {}; treating as no rows", status);
        return Ok(RowSet::empty());
    };

    match payload {
        Value::Null => Ok(RowSet::empty()),
        Value::Object(row) => Ok(RowSet::new(vec![row])),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                other => Err(DbError::InvalidResponse {
                    message: format!("expected an object per row, got {}", json_kind(&other)),
                }),
            })
            .collect::<Result<Vec<Record>, _>>()
            .map(RowSet::new),
        other => Err(DbError::InvalidResponse {
            message: format!("expected rows, got {}", json_kind(&other)),
        }),
    }
}

fn string_field<'a>(err: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    err.get(key).and_then(Value::as_str)
}

fn is_missing_exec_sql(payload: &Value) -> bool {
    let Value::Object(err) = payload else {
        return false;
    };
    let mentions = |key: &str| string_field(err, key).is_some_and(|s| s.contains(EXEC_SQL_RPC_NAME));
    string_field(err, "code") == Some("PGRST202") && (mentions("message") || mentions("details"))
}

/// `[code] | message | details | hint`, keeping only the fields present.
fn format_rpc_error(payload: &Value) -> String {
    let Value::Object(err) = payload else {
        return UNKNOWN_RPC_ERROR.to_string();
    };

    let mut pieces: Vec<String> = Vec::new();
    if let Some(code) = string_field(err, "code") {
        pieces.push(format!("[{}]", code));
    }
    pieces.extend(
        ["message", "details", "hint"]
            .iter()
            .filter_map(|key| string_field(err, key))
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    );

    if pieces.is_empty() {
        UNKNOWN_RPC_ERROR.to_string()
    } else {
        pieces.join(" | ")
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqlParam;
    use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Mutex;

    /// What the stand-in `exec_sql` endpoint saw.
    #[derive(Debug, Clone)]
    struct Received {
        path: String,
        apikey: Option<String>,
        authorization: Option<String>,
        body: Value,
    }

    struct Remote {
        received: Mutex<Vec<Received>>,
        status: u16,
        reply: Value,
    }

    async fn exec_sql(req: HttpRequest, body: web::Json<Value>, remote: web::Data<Remote>) -> HttpResponse {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        remote.received.lock().unwrap().push(Received {
            path: req.path().to_string(),
            apikey: header("apikey"),
            authorization: header("authorization"),
            body: body.into_inner(),
        });
        let status = actix_web::http::StatusCode::from_u16(remote.status).unwrap();
        HttpResponse::build(status).json(&remote.reply)
    }

    /// Run a stand-in PostgREST on an ephemeral port and send it one statement.
    async fn execute_against(status: u16, reply: Value, statement: Statement) -> (Result<RowSet, DbError>, Vec<Received>) {
        let remote = web::Data::new(Remote {
            received: Mutex::new(Vec::new()),
            status,
            reply,
        });
        let data = remote.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .route("/rest/v1/rpc/exec_sql", web::post().to(exec_sql))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_rt::spawn(server);

        let backend = RpcBackend::new(&RpcConfig {
            url: format!("http://{}/", addr),
            service_key: "service-key".to_string(),
            timeout_secs: Some(5),
        })
        .unwrap();
        let result = backend.execute(&statement).await;
        handle.stop(true).await;

        let received = remote.received.lock().unwrap().clone();
        (result, received)
    }

    #[actix_rt::test]
    async fn test_execute_posts_interpolated_sql() {
        let statement = Statement::new(
            "SELECT id FROM reviews WHERE property_id = $1 AND rating >= $2",
            vec![SqlParam::from("o'hara"), SqlParam::Int(4)],
        );
        let (result, received) = execute_against(200, json!([{"id": "rev-1"}, {"id": "rev-2"}]), statement).await;

        let rows = result.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.rows()[1]["id"], json!("rev-2"));

        assert_eq!(received.len(), 1);
        let request = &received[0];
        assert_eq!(request.path, "/rest/v1/rpc/exec_sql");
        assert_eq!(request.apikey.as_deref(), Some("service-key"));
        assert_eq!(request.authorization.as_deref(), Some("Bearer service-key"));
        assert_eq!(
            request.body,
            json!({"sql": "SELECT id FROM reviews WHERE property_id = 'o''hara' AND rating >= 4"})
        );
    }

    #[actix_rt::test]
    async fn test_execute_reports_remote_status() {
        let reply = json!({"code": "PGRST202", "message": "Could not find the function public.exec_sql(sql)"});
        let (result, received) = execute_against(404, reply, Statement::plain("SELECT 1")).await;
        assert!(matches!(result, Err(DbError::RemoteProcedureMissing { .. })));
        assert_eq!(received.len(), 1);

        let reply = json!({"code": "42P01", "message": "relation \"nope\" does not exist"});
        let (result, _) = execute_against(400, reply, Statement::plain("SELECT * FROM nope")).await;
        match result {
            Err(DbError::Remote { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "[42P01] | relation \"nope\" does not exist");
            }
            other => panic!("expected Remote, got {:?}", other.map(|r| r.len())),
        }
    }

    #[actix_rt::test]
    async fn test_missing_parameter_sends_nothing() {
        let (result, received) = execute_against(200, json!([]), Statement::plain("SELECT $1")).await;
        assert!(matches!(result, Err(DbError::MissingParameter { .. })));
        assert!(received.is_empty());
    }

    #[rstest]
    #[case("https://proj.example.co", "https://proj.example.co/rest/v1/rpc/exec_sql")]
    #[case("https://proj.example.co/", "https://proj.example.co/rest/v1/rpc/exec_sql")]
    fn test_rpc_endpoint(#[case] base: &str, #[case] expected: &str) {
        assert_eq!(rpc_endpoint(base), expected);
    }

    #[rstest]
    fn test_success_array_of_rows() {
        let rows = interpret_rpc_response(200, r#"[{"id":"a"},{"id":"b"}]"#).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.rows()[1]["id"], json!("b"));
    }

    #[rstest]
    fn test_success_single_object_is_one_row() {
        let rows = interpret_rpc_response(200, r#"{"ok":1}"#).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.first().unwrap()["ok"], json!(1));
    }

    #[rstest]
    #[case("")]
    #[case("null")]
    #[case("[]")]
    #[case("<html>gateway</html>")]
    fn test_success_without_rows(#[case] body: &str) {
        assert!(interpret_rpc_response(200, body).unwrap().is_empty());
    }

    #[rstest]
    #[case("42")]
    #[case(r#""text""#)]
    #[case("[1, 2]")]
    fn test_success_with_unexpected_shape(#[case] body: &str) {
        let err = interpret_rpc_response(200, body).unwrap_err();
        assert!(matches!(err, DbError::InvalidResponse { .. }));
    }

    #[rstest]
    fn test_missing_procedure_detected() {
        let body = json!({
            "code": "PGRST202",
            "message": "Could not find the function public.exec_sql(sql) in the schema cache",
        })
        .to_string();
        let err = interpret_rpc_response(404, &body).unwrap_err();
        match err {
            DbError::RemoteProcedureMissing { signature } => {
                assert_eq!(signature, "public.exec_sql(sql text)");
            }
            other => panic!("expected RemoteProcedureMissing, got {:?}", other),
        }
    }

    #[rstest]
    fn test_missing_procedure_via_details() {
        let body = json!({
            "code": "PGRST202",
            "message": "Could not find the function",
            "details": "Searched for public.exec_sql with parameter sql",
        })
        .to_string();
        let err = interpret_rpc_response(404, &body).unwrap_err();
        assert!(matches!(err, DbError::RemoteProcedureMissing { .. }));
    }

    #[rstest]
    fn test_other_missing_function_is_plain_remote_error() {
        let body = json!({"code": "PGRST202", "message": "Could not find public.other_fn"}).to_string();
        let err = interpret_rpc_response(404, &body).unwrap_err();
        assert!(matches!(err, DbError::Remote { status: 404, .. }));
    }

    #[rstest]
    fn test_remote_error_message_assembly() {
        let body = json!({
            "code": "42P01",
            "message": "relation \"reviewz\" does not exist",
            "details": null,
            "hint": "Check the table name",
        })
        .to_string();
        match interpret_rpc_response(400, &body).unwrap_err() {
            DbError::Remote { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(
                    message,
                    "[42P01] | relation \"reviewz\" does not exist | Check the table name"
                );
            }
            other => panic!("expected Remote, got {:?}", other),
        }
    }

    #[rstest]
    #[case("", "Unknown RPC error.")]
    #[case("{}", "Unknown RPC error.")]
    #[case("bad gateway", "bad gateway")]
    fn test_remote_error_fallbacks(#[case] body: &str, #[case] expected: &str) {
        match interpret_rpc_response(502, body).unwrap_err() {
            DbError::Remote { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, expected);
            }
            other => panic!("expected Remote, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_encoding_error_before_any_request() {
        // Port 1 is never contacted because encoding fails first.
        let backend = RpcBackend::new(&RpcConfig {
            url: "http://127.0.0.1:1".to_string(),
            service_key: "key".to_string(),
            timeout_secs: Some(1),
        })
        .unwrap();
        let stmt = Statement::new("SELECT $1", vec![f64::NAN.into()]);
        let err = backend.execute(&stmt).await.unwrap_err();
        assert!(matches!(err, DbError::Encode(_)));

        let stmt = Statement::new("SELECT $2", vec![1i64.into()]);
        let err = backend.execute(&stmt).await.unwrap_err();
        assert!(matches!(err, DbError::MissingParameter { .. }));
    }
}
