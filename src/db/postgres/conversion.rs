//! Type conversion utilities for the PostgreSQL backend.
//!
//! Handles conversion between:
//! - `SqlParam` → PostgreSQL binary parameters (via `ToSql`), adapting to the
//!   parameter type the server inferred for each placeholder
//! - PostgreSQL column values → `serde_json::Value` (via `FromSql`)

use std::error::Error;

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use tokio_postgres::types::{to_sql_checked, FromSql, IsNull, Kind, ToSql, Type};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::db::backend::Record;
use crate::db::escape::{timestamp_text, EncodeError};
use crate::db::value::SqlParam;
use crate::db::DbError;

type BoxError = Box<dyn Error + Sync + Send>;

fn unsupported(param: &SqlParam, ty: &Type) -> BoxError {
    Box::new(EncodeError::UnsupportedType {
        type_name: format!("{} as {}", param.type_name(), ty.name()),
    })
}

fn invalid_literal(value: impl ToString, ty: &Type) -> BoxError {
    Box::new(EncodeError::InvalidLiteral {
        type_name: ty.name().to_string(),
        value: value.to_string(),
    })
}

/// Write `value` after checking that its own `ToSql` accepts `ty`.
fn bind<T: ToSql>(value: &T, ty: &Type, out: &mut BytesMut, param: &SqlParam) -> Result<IsNull, BoxError> {
    if !T::accepts(ty) {
        return Err(unsupported(param, ty));
    }
    value.to_sql(ty, out)
}

impl ToSql for SqlParam {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            SqlParam::Null => Ok(IsNull::Yes),
            SqlParam::Bool(b) => match *ty {
                Type::TEXT | Type::VARCHAR => bind(&b.to_string().as_str(), ty, out, self),
                _ => bind(b, ty, out, self),
            },
            SqlParam::Int(i) => int_to_sql(*i, ty, out, self),
            SqlParam::Float(f) => float_to_sql(*f, ty, out, self),
            SqlParam::Text(s) => text_to_sql(s, ty, out, self),
            SqlParam::Timestamp(ts) => match *ty {
                Type::TIMESTAMP => bind(&ts.naive_utc(), ty, out, self),
                Type::DATE => bind(&ts.date_naive(), ty, out, self),
                Type::TEXT | Type::VARCHAR => bind(&timestamp_text(ts).as_str(), ty, out, self),
                _ => bind(ts, ty, out, self),
            },
            SqlParam::Bytes(bytes) => bind(&bytes.as_slice(), ty, out, self),
            SqlParam::Array(items) => match ty.kind() {
                Kind::Array(_) => items.as_slice().to_sql(ty, out),
                _ => Err(unsupported(self, ty)),
            },
            SqlParam::Json(value) => match *ty {
                Type::TEXT | Type::VARCHAR => bind(&value.to_string().as_str(), ty, out, self),
                _ => bind(value, ty, out, self),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn int_to_sql(i: i64, ty: &Type, out: &mut BytesMut, param: &SqlParam) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => bind(&i16::try_from(i).map_err(|_| invalid_literal(i, ty))?, ty, out, param),
        Type::INT4 => bind(&i32::try_from(i).map_err(|_| invalid_literal(i, ty))?, ty, out, param),
        Type::OID => bind(&u32::try_from(i).map_err(|_| invalid_literal(i, ty))?, ty, out, param),
        Type::FLOAT4 => bind(&(i as f32), ty, out, param),
        Type::FLOAT8 => bind(&(i as f64), ty, out, param),
        Type::NUMERIC => bind(&Decimal::from(i), ty, out, param),
        Type::TEXT | Type::VARCHAR => bind(&i.to_string().as_str(), ty, out, param),
        _ => bind(&i, ty, out, param),
    }
}

fn float_to_sql(f: f64, ty: &Type, out: &mut BytesMut, param: &SqlParam) -> Result<IsNull, BoxError> {
    match *ty {
        Type::FLOAT4 => bind(&(f as f32), ty, out, param),
        Type::INT2 | Type::INT4 | Type::INT8 | Type::OID if f.fract() == 0.0 => {
            int_to_sql(f as i64, ty, out, param)
        }
        Type::NUMERIC => {
            if !f.is_finite() {
                return Err(Box::new(EncodeError::NonFiniteNumber { value: f }));
            }
            let decimal = f.to_string().parse::<Decimal>().map_err(|_| invalid_literal(f, ty))?;
            bind(&decimal, ty, out, param)
        }
        Type::TEXT | Type::VARCHAR => bind(&f.to_string().as_str(), ty, out, param),
        _ => bind(&f, ty, out, param),
    }
}

/// Text parameters follow PostgreSQL's text-input rules for the inferred type,
/// which is how a cursor value like `"2026-02-17T00:00:00.000000Z"` binds to `$n::timestamptz`.
///
/// Text that does not parse as the inferred type is an `EncodeError::InvalidLiteral`.
fn text_to_sql(s: &str, ty: &Type, out: &mut BytesMut, param: &SqlParam) -> Result<IsNull, BoxError> {
    let trimmed = s.trim();
    let invalid = || invalid_literal(s, ty);
    match *ty {
        Type::UUID => bind(&Uuid::parse_str(trimmed).map_err(|_| invalid())?, ty, out, param),
        Type::TIMESTAMPTZ => bind(&parse_timestamp(s).ok_or_else(invalid)?, ty, out, param),
        Type::TIMESTAMP => bind(&parse_timestamp(s).ok_or_else(invalid)?.naive_utc(), ty, out, param),
        Type::DATE => bind(&parse_date(s).ok_or_else(invalid)?, ty, out, param),
        Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => {
            int_to_sql(trimmed.parse::<i64>().map_err(|_| invalid())?, ty, out, param)
        }
        Type::FLOAT4 | Type::FLOAT8 => {
            float_to_sql(trimmed.parse::<f64>().map_err(|_| invalid())?, ty, out, param)
        }
        Type::NUMERIC => bind(&trimmed.parse::<Decimal>().map_err(|_| invalid())?, ty, out, param),
        Type::BOOL => bind(&parse_bool(s).ok_or_else(invalid)?, ty, out, param),
        Type::JSON | Type::JSONB => bind(
            &serde_json::from_str::<Value>(s).map_err(|_| invalid())?,
            ty,
            out,
            param,
        ),
        _ => match ty.kind() {
            Kind::Enum(_) => {
                out.put_slice(s.as_bytes());
                Ok(IsNull::No)
            }
            _ => bind(&s, ty, out, param),
        },
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(s).map(|ts| ts.date_naive()))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "t" | "true" | "yes" | "on" | "1" => Some(true),
        "f" | "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn format_timestamp(ts: DateTime<Utc>) -> Value {
    Value::String(timestamp_text(&ts))
}

/// A column value decoded into JSON.
///
/// Timestamps become ISO-8601 strings, `numeric` keeps its exact decimal text,
/// `bytea` becomes `\x`-prefixed hex.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonCell(pub Value);

impl JsonCell {
    /// Column types this decoder understands.
    pub fn supports(ty: &Type) -> bool {
        match *ty {
            Type::BOOL
            | Type::INT2
            | Type::INT4
            | Type::INT8
            | Type::OID
            | Type::FLOAT4
            | Type::FLOAT8
            | Type::NUMERIC
            | Type::UUID
            | Type::JSON
            | Type::JSONB
            | Type::TIMESTAMPTZ
            | Type::TIMESTAMP
            | Type::DATE
            | Type::BYTEA => true,
            _ => match ty.kind() {
                Kind::Enum(_) => true,
                Kind::Array(member) => Self::supports(member),
                _ => <&str as FromSql>::accepts(ty),
            },
        }
    }
}

impl<'a> FromSql<'a> for JsonCell {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        let value = match *ty {
            Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
            Type::INT2 => Value::from(i16::from_sql(ty, raw)?),
            Type::INT4 => Value::from(i32::from_sql(ty, raw)?),
            Type::INT8 => Value::from(i64::from_sql(ty, raw)?),
            Type::OID => Value::from(u32::from_sql(ty, raw)?),
            Type::FLOAT4 => float_value(f64::from(f32::from_sql(ty, raw)?)),
            Type::FLOAT8 => float_value(f64::from_sql(ty, raw)?),
            Type::NUMERIC => Value::String(Decimal::from_sql(ty, raw)?.to_string()),
            Type::UUID => Value::String(Uuid::from_sql(ty, raw)?.to_string()),
            Type::JSON | Type::JSONB => Value::from_sql(ty, raw)?,
            Type::TIMESTAMPTZ => format_timestamp(DateTime::<Utc>::from_sql(ty, raw)?),
            Type::TIMESTAMP => format_timestamp(NaiveDateTime::from_sql(ty, raw)?.and_utc()),
            Type::DATE => Value::String(NaiveDate::from_sql(ty, raw)?.format("%Y-%m-%d").to_string()),
            Type::BYTEA => Value::String(format!("\\x{}", hex::encode(raw))),
            _ => match ty.kind() {
                Kind::Array(_) => Value::Array(
                    Vec::<JsonCell>::from_sql(ty, raw)?
                        .into_iter()
                        .map(|cell| cell.0)
                        .collect(),
                ),
                Kind::Enum(_) => Value::String(std::str::from_utf8(raw)?.to_string()),
                _ => Value::String(<&str as FromSql>::from_sql(ty, raw)?.to_string()),
            },
        };
        Ok(JsonCell(value))
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(JsonCell(Value::Null))
    }

    fn accepts(ty: &Type) -> bool {
        Self::supports(ty)
    }
}

/// Convert a driver row into a `Record` keyed by column name.
pub fn row_to_record(row: &Row) -> Result<Record, DbError> {
    let mut record = Record::new();
    for (idx, column) in row.columns().iter().enumerate() {
        if !JsonCell::supports(column.type_()) {
            return Err(DbError::UnsupportedColumn {
                column: column.name().to_string(),
                type_name: column.type_().name().to_string(),
            });
        }
        let cell: JsonCell = row.try_get(idx).map_err(|e| DbError::Decode {
            message: format!("column '{}': {}", column.name(), e),
        })?;
        record.insert(column.name().to_string(), cell.0);
    }
    Ok(record)
}
