//! Literal encoding for statements sent to a transport without parameter binding.
//!
//! Every value becomes a self-contained PostgreSQL literal. Strings use
//! standard-conforming single quotes, so the only character that needs
//! escaping is the quote itself.

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use super::value::SqlParam;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    #[error("Cannot serialize non-finite number parameter ({value})")]
    NonFiniteNumber { value: f64 },

    #[error("Unsupported SQL parameter type: {type_name}")]
    UnsupportedType { type_name: String },

    #[error("Invalid {type_name} value: {value}")]
    InvalidLiteral { type_name: String, value: String },
}

/// ISO-8601 UTC text with microseconds, PostgreSQL's own precision, so a
/// value read back from a row compares equal to the stored key.
pub fn timestamp_text(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Quote a string as a SQL literal, doubling embedded single quotes.
pub fn escape_string_literal(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('\'');
    for c in s.chars() {
        if c == '\'' {
            result.push('\'');
        }
        result.push(c);
    }
    result.push('\'');
    result
}

/// Render a parameter as an inline SQL literal.
pub fn to_sql_literal(param: &SqlParam) -> Result<String, EncodeError> {
    let literal = match param {
        SqlParam::Null => "NULL".to_string(),
        SqlParam::Bool(true) => "TRUE".to_string(),
        SqlParam::Bool(false) => "FALSE".to_string(),
        SqlParam::Int(i) => i.to_string(),
        SqlParam::Float(f) => {
            if !f.is_finite() {
                return Err(EncodeError::NonFiniteNumber { value: *f });
            }
            f.to_string()
        }
        SqlParam::Text(s) => escape_string_literal(s),
        SqlParam::Timestamp(ts) => {
            escape_string_literal(&timestamp_text(ts))
        }
        SqlParam::Bytes(bytes) => format!("'\\x{}'::bytea", hex::encode(bytes)),
        SqlParam::Array(items) => {
            if items.is_empty() {
                // ARRAY[] needs the surrounding statement to supply a cast
                "ARRAY[]".to_string()
            } else {
                let encoded = items
                    .iter()
                    .map(to_sql_literal)
                    .collect::<Result<Vec<_>, _>>()?;
                format!("ARRAY[{}]", encoded.join(", "))
            }
        }
        SqlParam::Json(value) => {
            let serialized = serde_json::to_string(value).map_err(|_| EncodeError::UnsupportedType {
                type_name: "json".to_string(),
            })?;
            format!("{}::jsonb", escape_string_literal(&serialized))
        }
    };
    Ok(literal)
}
