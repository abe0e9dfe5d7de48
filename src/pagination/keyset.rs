//! Keyset (seek) pagination.
//!
//! Rows are ordered by `(sort expression, id)` in one direction. A page after
//! cursor `(v, i)` holds the rows strictly past that pair:
//!
//! ```text
//! ((expr OP $v::cast) OR (expr = $v::cast AND id OP $i))
//! ```
//!
//! with `OP` being `>` ascending and `<` descending. One extra row is fetched
//! to learn whether another page exists.
//!
//! Rows whose sort value is NULL never satisfy the predicate, so listings
//! should sort on non-null expressions (wrap nullable columns in `COALESCE`).

use std::cmp::Ordering;

use serde_json::Value;

use super::cursor::{encode_cursor, CursorToken, CursorValue};
use super::request::SortDirection;
use super::sort::SortSpec;
use crate::db::{Record, SqlParam};

/// Column alias every listing selects its sort expression as.
pub const SORT_VALUE_COLUMN: &str = "sort_value";

/// Statement parameters with `$n` numbering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamList {
    params: Vec<SqlParam>,
}

impl ParamList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter and return its placeholder.
    pub fn push(&mut self, param: impl Into<SqlParam>) -> String {
        self.params.push(param.into());
        format!("${}", self.params.len())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn into_vec(self) -> Vec<SqlParam> {
        self.params
    }
}

/// Ordering and resume predicate for one page request.
#[derive(Debug, Clone, Copy)]
pub struct KeysetQuery<'a> {
    pub spec: &'a SortSpec,
    pub id_column: &'a str,
    pub direction: SortDirection,
    pub cursor: Option<&'a CursorToken>,
}

impl<'a> KeysetQuery<'a> {
    /// `ORDER BY` body: sort expression then id, same direction.
    pub fn order_by(&self) -> String {
        let dir = self.direction.as_sql();
        format!("{} {}, {} {}", self.spec.expr, dir, self.id_column, dir)
    }

    /// Push the cursor parameters and return the resume condition, if any.
    pub fn push_predicate(&self, params: &mut ParamList) -> Option<String> {
        let cursor = self.cursor?;
        let value = format!("{}::{}", params.push(cursor.value.to_param()), self.spec.cast);
        let id = params.push(cursor.id.as_str());
        let op = self.direction.comparison();
        let expr = self.spec.expr;
        Some(format!(
            "(({expr} {op} {value}) OR ({expr} = {value} AND {id_col} {op} {id}))",
            id_col = self.id_column
        ))
    }

    /// Rows to request for a page of `page_size`.
    pub fn fetch_limit(page_size: u32) -> i64 {
        i64::from(page_size) + 1
    }

    /// Whether a row with this sort value and id lies past the cursor.
    ///
    /// Mirrors the SQL predicate, including NULL comparisons being unknown.
    pub fn admits(&self, value: &Value, id: &str) -> bool {
        let Some(cursor) = self.cursor else {
            return true;
        };
        let Some(ordering) = compare_to_cursor(value, &cursor.value) else {
            return false;
        };
        let past = match self.direction {
            SortDirection::Asc => Ordering::Greater,
            SortDirection::Desc => Ordering::Less,
        };
        ordering == past || (ordering == Ordering::Equal && id.cmp(cursor.id.as_str()) == past)
    }

    /// Total order of `(value, id)` pairs as produced by `order_by`.
    ///
    /// NULL sorts as the largest value, matching PostgreSQL defaults.
    pub fn compare(&self, a: (&Value, &str), b: (&Value, &str)) -> Ordering {
        let ordering = compare_values(a.0, b.0).then_with(|| a.1.cmp(b.1));
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

fn compare_to_cursor(value: &Value, cursor: &CursorValue) -> Option<Ordering> {
    match (value, cursor) {
        (Value::Number(a), CursorValue::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), CursorValue::Text(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}

fn value_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) | Value::Object(_) => 3,
        Value::Null => 4,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => value_rank(a).cmp(&value_rank(b)),
    }
}

/// One page of results plus the cursor for the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Record>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

impl Page {
    /// Trim a `page_size + 1` fetch into a page.
    ///
    /// The next cursor is taken from the last kept row's `sort_column` and
    /// `id_column`; the sort column is then dropped from the items.
    pub fn from_rows(mut rows: Vec<Record>, page_size: u32, sort_column: &str, id_column: &str) -> Self {
        let page_size = page_size as usize;
        let has_more = rows.len() > page_size;
        rows.truncate(page_size);

        let next_cursor = if has_more {
            rows.last().map(|last| {
                let value = last.get(sort_column).map(CursorValue::from_row_value).unwrap_or(CursorValue::Null);
                let id = match last.get(id_column) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                };
                encode_cursor(&CursorToken { value, id })
            })
        } else {
            None
        };

        for row in &mut rows {
            row.remove(sort_column);
        }

        Self {
            items: rows,
            has_more,
            next_cursor,
        }
    }
}
