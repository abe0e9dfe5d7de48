//! Statements, placeholder handling and query execution helpers.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::backend::{DatabaseBackend, RowSet};
use super::escape::to_sql_literal;
use super::value::SqlParam;
use super::DbError;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("placeholder pattern is valid"));

/// SQL text with `$n` placeholders and the parameters they refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    text: String,
    params: Vec<SqlParam>,
}

impl Statement {
    pub fn new(text: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            text: text.into(),
            params,
        }
    }

    /// A statement without parameters.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    /// Check that every referenced placeholder has a parameter.
    pub fn validate(&self) -> Result<(), DbError> {
        for caps in PLACEHOLDER.captures_iter(&self.text) {
            resolve_placeholder(&caps[0], &caps[1], &self.params)?;
        }
        Ok(())
    }

    /// Substitute every placeholder with its encoded literal.
    pub fn interpolate(&self) -> Result<String, DbError> {
        interpolate_sql(&self.text, &self.params)
    }
}

fn resolve_placeholder<'a>(
    token: &str,
    index_text: &str,
    params: &'a [SqlParam],
) -> Result<&'a SqlParam, DbError> {
    let missing = || DbError::MissingParameter {
        token: token.to_string(),
        provided: params.len(),
    };
    let index: usize = index_text.parse().map_err(|_| missing())?;
    if index == 0 {
        return Err(missing());
    }
    params.get(index - 1).ok_or_else(missing)
}

/// Replace `$n` tokens in `text` with literals built from `params`.
///
/// Placeholders are matched lexically, so `$n` inside quoted text or dollar
/// quoting is substituted as well.
pub fn interpolate_sql(text: &str, params: &[SqlParam]) -> Result<String, DbError> {
    let mut result = String::with_capacity(text.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let param = resolve_placeholder(whole.as_str(), &caps[1], params)?;
        result.push_str(&text[last..whole.start()]);
        result.push_str(&to_sql_literal(param)?);
        last = whole.end();
    }
    result.push_str(&text[last..]);
    Ok(result)
}

/// Run a statement built from text and parameters.
pub async fn run_query(
    db: &dyn DatabaseBackend,
    text: &str,
    params: Vec<SqlParam>,
) -> Result<RowSet, DbError> {
    db.execute(&Statement::new(text, params)).await
}

#[derive(Deserialize)]
struct ReadyRow {
    ok: i64,
}

/// Round-trip a trivial statement through the backend.
pub async fn assert_db_ready(db: &dyn DatabaseBackend) -> Result<(), DbError> {
    let rows = run_query(db, "SELECT 1 AS ok", Vec::new()).await?.deserialize::<ReadyRow>()?;
    match rows.first() {
        Some(row) if row.ok == 1 => Ok(()),
        Some(row) => Err(DbError::InvalidResponse {
            message: format!("readiness check returned ok = {}", row.ok),
        }),
        None => Err(DbError::InvalidResponse {
            message: "readiness check returned no rows".to_string(),
        }),
    }
}
