use std::fmt;

use bytes::BytesMut;
use catalog::ColumnType;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use uuid::Uuid;

/// A typed scalar (or array) value, used for filter parameters and
/// materialized row fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    Text(String),
    Uuid(Uuid),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    TextArray(Vec<String>),
    IntArray(Vec<i64>),
    UuidArray(Vec<Uuid>),
}

impl Value {
    /// Coerce this value to a column's declared type, e.g. parsing `"42"`
    /// for an int column. Returns `None` when no sensible coercion exists;
    /// the compiler turns that into an `InvalidValue` error naming the
    /// column.
    pub fn coerce_to(&self, target: ColumnType) -> Option<Value> {
        match (self, target) {
            (Value::Null, _) => Some(Value::Null),

            (Value::Bool(_), ColumnType::Bool) => Some(self.clone()),
            (Value::Text(s), ColumnType::Bool) => s.parse().ok().map(Value::Bool),

            (Value::Int(_), ColumnType::Int) => Some(self.clone()),
            (Value::Text(s), ColumnType::Int) => s.trim().parse().ok().map(Value::Int),

            (Value::Decimal(_), ColumnType::Decimal) => Some(self.clone()),
            (Value::Int(v), ColumnType::Decimal) => Some(Value::Decimal(Decimal::from(*v))),
            (Value::Text(s), ColumnType::Decimal) => s.trim().parse().ok().map(Value::Decimal),

            (Value::Text(_), ColumnType::Text) => Some(self.clone()),
            (Value::Int(v), ColumnType::Text) => Some(Value::Text(v.to_string())),
            (Value::Uuid(v), ColumnType::Text) => Some(Value::Text(v.to_string())),

            (Value::Uuid(_), ColumnType::Uuid) => Some(self.clone()),
            (Value::Text(s), ColumnType::Uuid) => s.parse().ok().map(Value::Uuid),

            (Value::Date(_), ColumnType::Date) => Some(self.clone()),
            (Value::Text(s), ColumnType::Date) => s.parse().ok().map(Value::Date),

            (Value::Timestamp(_), ColumnType::Timestamp) => Some(self.clone()),
            (Value::Text(s), ColumnType::Timestamp) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|t| Value::Timestamp(t.with_timezone(&Utc))),

            // Arrays coerce against the column's element type.
            (Value::TextArray(_), ColumnType::Text) => Some(self.clone()),
            (Value::IntArray(_), ColumnType::Int) => Some(self.clone()),
            (Value::UuidArray(_), ColumnType::Uuid) => Some(self.clone()),

            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(
            self,
            Value::TextArray(_) | Value::IntArray(_) | Value::UuidArray(_)
        )
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "'{v}'"),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{v}"),
            Value::TextArray(v) => write!(f, "{v:?}"),
            Value::IntArray(v) => write!(f, "{v:?}"),
            Value::UuidArray(v) => write!(f, "{v:?}"),
        }
    }
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::Int(v) => v.to_sql(ty, out),
            Value::Decimal(v) => v.to_sql(ty, out),
            Value::Text(v) => v.to_sql(ty, out),
            Value::Uuid(v) => v.to_sql(ty, out),
            Value::Date(v) => v.to_sql(ty, out),
            Value::Timestamp(v) => v.to_sql(ty, out),
            Value::TextArray(v) => v.to_sql(ty, out),
            Value::IntArray(v) => v.to_sql(ty, out),
            Value::UuidArray(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // The variant decides what it writes; type agreement is the
        // compiler's responsibility via coercion.
        true
    }

    to_sql_checked!();
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Value {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Int(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Value {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::Text(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Value {
        Value::Uuid(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Value {
        Value::Date(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Value {
        Value::Timestamp(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Value {
        Value::TextArray(v)
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Value {
        Value::IntArray(v)
    }
}

impl From<Vec<Uuid>> for Value {
    fn from(v: Vec<Uuid>) -> Value {
        Value::UuidArray(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_text_to_int() {
        assert_eq!(
            Value::Text("42".to_string()).coerce_to(ColumnType::Int),
            Some(Value::Int(42))
        );
        assert_eq!(Value::Text("nope".to_string()).coerce_to(ColumnType::Int), None);
    }

    #[test]
    fn coerce_int_widens_to_decimal() {
        assert_eq!(
            Value::Int(7).coerce_to(ColumnType::Decimal),
            Some(Value::Decimal(Decimal::from(7)))
        );
    }

    #[test]
    fn coerce_text_to_uuid() {
        let raw = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        assert_eq!(
            Value::Text(raw.to_string()).coerce_to(ColumnType::Uuid),
            Some(Value::Uuid(raw.parse().unwrap()))
        );
    }

    #[test]
    fn coerce_text_to_date() {
        assert_eq!(
            Value::Text("2024-02-29".to_string()).coerce_to(ColumnType::Date),
            Some(Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
        );
        assert_eq!(
            Value::Text("2023-02-29".to_string()).coerce_to(ColumnType::Date),
            None
        );
    }

    #[test]
    fn null_passes_any_coercion() {
        assert_eq!(Value::Null.coerce_to(ColumnType::Bool), Some(Value::Null));
        assert_eq!(Value::Null.coerce_to(ColumnType::Uuid), Some(Value::Null));
    }

    #[test]
    fn incompatible_coercion_rejected() {
        assert_eq!(Value::Bool(true).coerce_to(ColumnType::Int), None);
        assert_eq!(Value::IntArray(vec![1]).coerce_to(ColumnType::Text), None);
    }
}
