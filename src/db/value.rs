//! Parameter values passed into SQL statements.
//!
//! `SqlParam` is the single value type both backends understand. The direct
//! backend binds it through `ToSql` (see `postgres::conversion`), the RPC
//! backend renders it as a literal (see `escape`).

use chrono::{DateTime, Utc};
use serde_json::Value;

/// A typed statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Bytes(Vec<u8>),
    Array(Vec<SqlParam>),
    Json(Value),
}

impl SqlParam {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlParam::Null => "null",
            SqlParam::Bool(_) => "bool",
            SqlParam::Int(_) => "integer",
            SqlParam::Float(_) => "float",
            SqlParam::Text(_) => "text",
            SqlParam::Timestamp(_) => "timestamp",
            SqlParam::Bytes(_) => "bytes",
            SqlParam::Array(_) => "array",
            SqlParam::Json(_) => "json",
        }
    }

    /// Build a text array parameter, the shape used by `= ANY($n::text[])` filters.
    pub fn text_array<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SqlParam::Array(items.into_iter().map(|s| SqlParam::Text(s.into())).collect())
    }
}

impl From<bool> for SqlParam {
    fn from(value: bool) -> Self {
        SqlParam::Bool(value)
    }
}

impl From<i32> for SqlParam {
    fn from(value: i32) -> Self {
        SqlParam::Int(i64::from(value))
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Int(value)
    }
}

impl From<u32> for SqlParam {
    fn from(value: u32) -> Self {
        SqlParam::Int(i64::from(value))
    }
}

impl From<f64> for SqlParam {
    fn from(value: f64) -> Self {
        SqlParam::Float(value)
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<DateTime<Utc>> for SqlParam {
    fn from(value: DateTime<Utc>) -> Self {
        SqlParam::Timestamp(value)
    }
}

impl From<Vec<u8>> for SqlParam {
    fn from(value: Vec<u8>) -> Self {
        SqlParam::Bytes(value)
    }
}

impl From<Vec<SqlParam>> for SqlParam {
    fn from(value: Vec<SqlParam>) -> Self {
        SqlParam::Array(value)
    }
}

/// JSON values map onto the closest scalar; objects stay structured.
impl From<Value> for SqlParam {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => SqlParam::Null,
            Value::Bool(b) => SqlParam::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlParam::Int(i),
                None => SqlParam::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => SqlParam::Text(s),
            Value::Array(items) => SqlParam::Array(items.into_iter().map(SqlParam::from).collect()),
            obj @ Value::Object(_) => SqlParam::Json(obj),
        }
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlParam::Null)
    }
}
