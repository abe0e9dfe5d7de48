//! Shared test utilities.
//!
//! `FakeBackend` stands in for a database: it records every statement it is
//! asked to run and answers from a queue of canned results.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{AppState, TenantContext};
use crate::db::{DatabaseBackend, DbError, Record, RowSet, Statement};

/// Canned-response backend for handler and executor tests.
#[derive(Default)]
pub struct FakeBackend {
    responses: Mutex<VecDeque<Result<RowSet, DbError>>>,
    statements: Mutex<Vec<Statement>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue rows for the next call.
    pub fn push_rows(&self, rows: Vec<Record>) {
        self.responses.lock().unwrap().push_back(Ok(RowSet::new(rows)));
    }

    /// Queue a failure for the next call.
    pub fn push_error(&self, err: DbError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    /// Statements received so far.
    pub fn statements(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }

    pub fn last_statement(&self) -> Statement {
        self.statements().pop().expect("no statement executed")
    }
}

#[async_trait]
impl DatabaseBackend for FakeBackend {
    async fn execute(&self, statement: &Statement) -> Result<RowSet, DbError> {
        statement.validate()?;
        self.statements.lock().unwrap().push(statement.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RowSet::empty()))
    }

    fn backend_name(&self) -> &'static str {
        "Fake"
    }
}

/// Build a record from a JSON object literal.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

pub fn app_state(backend: Arc<FakeBackend>) -> AppState {
    AppState::new(backend)
}

pub fn tenant() -> TenantContext {
    TenantContext {
        user_id: Some("user-1".to_string()),
        account_id: "acct-1".to_string(),
        property_id: "prop-1".to_string(),
    }
}
