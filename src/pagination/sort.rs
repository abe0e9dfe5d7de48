//! Allow-listed sort keys.
//!
//! Sort expressions are spliced into SQL text, so a client-supplied key is
//! only ever used to *select* one of the static expressions below.

use chrono::{DateTime, NaiveDate};

use super::cursor::CursorValue;

/// How one public sort key maps to SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    /// Public key accepted in `sort_by`.
    pub key: &'static str,
    /// SQL expression to order by.
    pub expr: &'static str,
    /// Cast applied to the cursor value placeholder.
    pub cast: &'static str,
}

impl SortSpec {
    pub const fn new(key: &'static str, expr: &'static str, cast: &'static str) -> Self {
        Self { key, expr, cast }
    }

    /// Whether a cursor value can be bound as `$n::<cast>`.
    ///
    /// A cursor that decodes but carries the wrong kind of value (tampered,
    /// or issued for another sort key) is treated as no cursor.
    pub fn accepts_cursor(&self, value: &CursorValue) -> bool {
        match (self.cast, value) {
            (_, CursorValue::Null) => true,
            ("integer" | "bigint" | "smallint", CursorValue::Number(n)) => n.as_i64().is_some(),
            ("numeric" | "real" | "double precision", CursorValue::Number(_)) => true,
            ("numeric" | "real" | "double precision", CursorValue::Text(s)) => s.trim().parse::<f64>().is_ok(),
            ("timestamptz" | "timestamp", CursorValue::Text(s)) => DateTime::parse_from_rfc3339(s.trim()).is_ok(),
            ("date", CursorValue::Text(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").is_ok(),
            ("text", CursorValue::Text(_)) => true,
            (
                "integer" | "bigint" | "smallint" | "numeric" | "real" | "double precision" | "timestamptz"
                | "timestamp" | "date" | "text",
                _,
            ) => false,
            _ => true,
        }
    }
}

/// Sortable columns of one listing.
#[derive(Debug, Clone, Copy)]
pub struct SortTable {
    pub columns: &'static [SortSpec],
    pub default_key: &'static str,
    /// Unique tie-breaker column, e.g. `r.id`.
    pub id_column: &'static str,
}

impl SortTable {
    pub fn keys(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.key).collect()
    }

    /// Spec for `candidate`, or for the default key when it is not allowed.
    pub fn resolve(&self, candidate: Option<&str>) -> &'static SortSpec {
        let key = sanitize_sort_by(candidate, &self.keys(), self.default_key);
        let columns = self.columns;
        columns
            .iter()
            .find(|c| c.key == key)
            .unwrap_or(&columns[0])
    }
}

/// Return `candidate` if it exactly matches an allowed key, else `fallback`.
pub fn sanitize_sort_by<'a>(candidate: Option<&str>, allowed: &[&'a str], fallback: &'a str) -> &'a str {
    candidate
        .and_then(|c| allowed.iter().find(|a| **a == c).copied())
        .unwrap_or(fallback)
}
