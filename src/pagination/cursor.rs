//! Opaque cursor tokens.
//!
//! A cursor is the base64url encoding (no padding) of `{"value": …, "id": …}`,
//! where `value` is the last row's sort key and `id` its tie-breaker.
//! Decoding never fails loudly: anything malformed reads as "no cursor".

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::db::SqlParam;

/// Sort key carried by a cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CursorValue {
    Number(Number),
    Text(String),
    Null,
}

impl CursorValue {
    /// Take the sort key from a result row.
    ///
    /// Booleans are carried as their text form; arrays and objects have no
    /// usable ordering and become `Null`.
    pub fn from_row_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => Self::Number(n.clone()),
            Value::String(s) => Self::Text(s.clone()),
            Value::Bool(b) => Self::Text(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => Self::Null,
        }
    }

    /// Statement parameter for the keyset predicate.
    pub fn to_param(&self) -> SqlParam {
        match self {
            Self::Number(n) => match n.as_i64() {
                Some(i) => SqlParam::Int(i),
                None => SqlParam::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Self::Text(s) => SqlParam::Text(s.clone()),
            Self::Null => SqlParam::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for CursorValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for CursorValue {
    fn from(i: i64) -> Self {
        Self::Number(Number::from(i))
    }
}

/// Position of the last row on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorToken {
    pub value: CursorValue,
    pub id: String,
}

impl CursorToken {
    pub fn new(value: impl Into<CursorValue>, id: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            id: id.into(),
        }
    }
}

/// Encode a token as an opaque URL-safe string.
pub fn encode_cursor(token: &CursorToken) -> String {
    // Serializing a struct of strings and JSON numbers cannot fail.
    let json = serde_json::to_vec(token).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decode a cursor string, returning `None` for anything malformed.
///
/// Padded input is accepted as well.
pub fn decode_cursor(raw: Option<&str>) -> Option<CursorToken> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD.decode(raw.trim_end_matches('=')).ok()?;
    let text = std::str::from_utf8(&bytes).ok()?;
    serde_json::from_str::<CursorToken>(text).ok()
}
