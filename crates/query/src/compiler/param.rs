//! Bound parameter values.
//!
//! Values supplied in criteria documents are coerced to their declared
//! field type before binding, so the executor receives typed parameters
//! instead of raw JSON.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use crate::error::{QueryError, QueryResult};
use crate::types::{DataTypeId, FieldType};

/// A value bound to a `$N` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// Text parameter.
    Text(String),
    /// Integer parameter.
    Integer(i64),
    /// Floating point parameter.
    Float(f64),
    /// Boolean parameter.
    Bool(bool),
    /// Date parameter.
    Date(NaiveDate),
    /// JSONB document, used by containment tests.
    Json(Value),
    /// Text array, used by the `?|` operator.
    TextArray(Vec<String>),
    /// Null parameter.
    Null,
}

impl SqlParam {
    /// Creates a text parameter.
    pub fn text(s: impl Into<String>) -> Self {
        SqlParam::Text(s.into())
    }

    /// Converts a raw JSON value without type information.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => SqlParam::Null,
            Value::Bool(b) => SqlParam::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlParam::Integer(i),
                None => SqlParam::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => SqlParam::Text(s.clone()),
            other => SqlParam::Json(other.clone()),
        }
    }

    /// Coerces a leaf value to the declared field type.
    pub fn coerce(
        field: &str,
        field_type: FieldType,
        value: &Value,
        case_insensitive: bool,
    ) -> QueryResult<Self> {
        let invalid = || QueryError::InvalidFieldValue {
            field: field.to_string(),
            expected: field_type.as_sql_type(),
            value: value.to_string(),
        };

        match field_type {
            FieldType::Integer => coerce_integer(value).map(SqlParam::Integer).ok_or_else(invalid),
            FieldType::Float => coerce_float(value).map(SqlParam::Float).ok_or_else(invalid),
            FieldType::Boolean => coerce_bool(value).map(SqlParam::Bool).ok_or_else(invalid),
            FieldType::Date => coerce_date(value).map(SqlParam::Date).ok_or_else(invalid),
            FieldType::Text => {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return Err(invalid()),
                };
                Ok(SqlParam::Text(if case_insensitive {
                    text.to_uppercase()
                } else {
                    text
                }))
            }
        }
    }

    /// Converts the parameter to the JSON form stored in a metadata document.
    ///
    /// Dates are stored as `YYYY-MM-DD` strings.
    pub fn to_json(&self) -> Value {
        match self {
            SqlParam::Text(s) => Value::String(s.clone()),
            SqlParam::Integer(i) => Value::from(*i),
            SqlParam::Float(f) => Value::from(*f),
            SqlParam::Bool(b) => Value::Bool(*b),
            SqlParam::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            SqlParam::Json(v) => v.clone(),
            SqlParam::TextArray(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            SqlParam::Null => Value::Null,
        }
    }
}

impl From<&DataTypeId> for SqlParam {
    fn from(id: &DataTypeId) -> Self {
        match id {
            DataTypeId::Id(id) => SqlParam::Integer(*id),
            DataTypeId::Name(name) => SqlParam::Text(name.clone()),
        }
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

fn coerce_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_integer() {
        let p = SqlParam::coerce("score", FieldType::Integer, &json!(5), false).unwrap();
        assert_eq!(p, SqlParam::Integer(5));
        let p = SqlParam::coerce("score", FieldType::Integer, &json!("42"), false).unwrap();
        assert_eq!(p, SqlParam::Integer(42));
        let p = SqlParam::coerce("score", FieldType::Integer, &json!("4.7"), false).unwrap();
        assert_eq!(p, SqlParam::Integer(4));
        let err = SqlParam::coerce("score", FieldType::Integer, &json!("abc"), false).unwrap_err();
        assert!(matches!(err, QueryError::InvalidFieldValue { .. }));
    }

    #[test]
    fn test_coerce_float_rejects_nan() {
        let p = SqlParam::coerce("weight", FieldType::Float, &json!("3.5"), false).unwrap();
        assert_eq!(p, SqlParam::Float(3.5));
        assert!(SqlParam::coerce("weight", FieldType::Float, &json!("NaN"), false).is_err());
    }

    #[test]
    fn test_coerce_boolean() {
        let p = SqlParam::coerce("active", FieldType::Boolean, &json!("TRUE"), false).unwrap();
        assert_eq!(p, SqlParam::Bool(true));
        let p = SqlParam::coerce("active", FieldType::Boolean, &json!(false), false).unwrap();
        assert_eq!(p, SqlParam::Bool(false));
        assert!(SqlParam::coerce("active", FieldType::Boolean, &json!("yes"), false).is_err());
    }

    #[test]
    fn test_coerce_date() {
        let p = SqlParam::coerce("visit", FieldType::Date, &json!("2016-03-01"), false).unwrap();
        assert_eq!(
            p,
            SqlParam::Date(NaiveDate::from_ymd_opt(2016, 3, 1).unwrap())
        );
        let p = SqlParam::coerce(
            "visit",
            FieldType::Date,
            &json!("2016-03-01T10:00:00Z"),
            false,
        )
        .unwrap();
        assert_eq!(p.to_json(), json!("2016-03-01"));
        assert!(SqlParam::coerce("visit", FieldType::Date, &json!("01/03/2016"), false).is_err());
    }

    #[test]
    fn test_coerce_text_case_insensitive() {
        let p = SqlParam::coerce("diagnosis", FieldType::Text, &json!("Neuroblastoma"), true)
            .unwrap();
        assert_eq!(p, SqlParam::text("NEUROBLASTOMA"));
        let p = SqlParam::coerce("code", FieldType::Text, &json!(12), false).unwrap();
        assert_eq!(p, SqlParam::text("12"));
    }

    #[test]
    fn test_from_data_type_id() {
        assert_eq!(SqlParam::from(&DataTypeId::Id(7)), SqlParam::Integer(7));
        assert_eq!(
            SqlParam::from(&DataTypeId::Name("Tissue".into())),
            SqlParam::text("Tissue")
        );
    }
}
