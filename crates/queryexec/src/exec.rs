use catalog::{ColumnType, SchemaCatalog};
use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use tokio_postgres::types::{FromSql, ToSql};
use tokio_postgres::GenericClient;
use tracing::debug;
use uuid::Uuid;

use crate::compile::{compile_for_column, CompiledField, CompiledQuery};
use crate::errors::{QueryError, Result};
use crate::query::Query;
use crate::value::Value;

/// One materialized result row, fields keyed by their full `/`-joined path.
///
/// Keys are exactly the field aliases of the compiled query, so callers can
/// reconstruct nested reference data by splitting keys on `/` without
/// consulting the catalog again.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: IndexMap<String, Value>,
}

impl Row {
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.fields.get(path)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Run a compiled query, decoding every tuple into a [`Row`].
///
/// Takes any client-like handle, so callers can execute on a plain
/// connection or inside a transaction. Engine rejections surface as
/// [`QueryError::Execution`] with the driver's message preserved.
pub async fn execute<C: GenericClient>(client: &C, compiled: &CompiledQuery) -> Result<Vec<Row>> {
    let params: Vec<&(dyn ToSql + Sync)> = compiled
        .params
        .iter()
        .map(|p| p as &(dyn ToSql + Sync))
        .collect();

    let rows = client
        .query(&compiled.sql, &params)
        .await
        .map_err(QueryError::execution)?;
    debug!(rows = rows.len(), "query returned");

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut fields = IndexMap::with_capacity(compiled.fields.len());
        for (idx, field) in compiled.fields.iter().enumerate() {
            fields.insert(field.alias.clone(), decode_field(&row, idx, field)?);
        }
        out.push(Row { fields });
    }
    Ok(out)
}

/// Compile and run `query` reshaped to select exactly `column`, mapping
/// each tuple straight into `T`.
pub async fn retrieve_as<C, T>(
    client: &C,
    catalog: &SchemaCatalog,
    query: &Query,
    column: &str,
) -> Result<Vec<T>>
where
    C: GenericClient,
    T: for<'a> FromSql<'a>,
{
    let compiled = compile_for_column(catalog, query, column)?;
    let params: Vec<&(dyn ToSql + Sync)> = compiled
        .params
        .iter()
        .map(|p| p as &(dyn ToSql + Sync))
        .collect();

    let rows = client
        .query(&compiled.sql, &params)
        .await
        .map_err(QueryError::execution)?;

    rows.iter()
        .map(|row| row.try_get(0).map_err(QueryError::execution))
        .collect()
}

fn decode_field(row: &tokio_postgres::Row, idx: usize, field: &CompiledField) -> Result<Value> {
    let value = if field.array {
        match field.ctype {
            ColumnType::Int => row
                .try_get::<_, Option<Vec<i64>>>(idx)
                .map_err(QueryError::execution)?
                .map(Value::IntArray),
            ColumnType::Text => row
                .try_get::<_, Option<Vec<String>>>(idx)
                .map_err(QueryError::execution)?
                .map(Value::TextArray),
            ColumnType::Uuid => row
                .try_get::<_, Option<Vec<Uuid>>>(idx)
                .map_err(QueryError::execution)?
                .map(Value::UuidArray),
            ColumnType::Bool
            | ColumnType::Decimal
            | ColumnType::Date
            | ColumnType::Timestamp => {
                // No array representation for these; decode fails the same
                // way a type mismatch from the engine would.
                row.try_get::<_, Option<Vec<i64>>>(idx)
                    .map_err(QueryError::execution)?
                    .map(Value::IntArray)
            }
        }
    } else {
        match field.ctype {
            ColumnType::Bool => row
                .try_get::<_, Option<bool>>(idx)
                .map_err(QueryError::execution)?
                .map(Value::Bool),
            ColumnType::Int => row
                .try_get::<_, Option<i64>>(idx)
                .map_err(QueryError::execution)?
                .map(Value::Int),
            ColumnType::Decimal => row
                .try_get::<_, Option<Decimal>>(idx)
                .map_err(QueryError::execution)?
                .map(Value::Decimal),
            ColumnType::Text => row
                .try_get::<_, Option<String>>(idx)
                .map_err(QueryError::execution)?
                .map(Value::Text),
            ColumnType::Uuid => row
                .try_get::<_, Option<Uuid>>(idx)
                .map_err(QueryError::execution)?
                .map(Value::Uuid),
            ColumnType::Date => row
                .try_get::<_, Option<NaiveDate>>(idx)
                .map_err(QueryError::execution)?
                .map(Value::Date),
            ColumnType::Timestamp => row
                .try_get::<_, Option<DateTime<Utc>>>(idx)
                .map_err(QueryError::execution)?
                .map(Value::Timestamp),
        }
    };
    Ok(value.unwrap_or(Value::Null))
}
