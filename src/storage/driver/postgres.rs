//! PostgreSQL strategy

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Row, TypeInfo, ValueRef};

use super::{ColumnTypes, Driver, DriverKind, TransformError, parse_float};
use crate::storage::codec::{ColumnValue, Shape};
use crate::storage::error::{StorageError, StorageResult};

// Identifiers are bound as text parameters, so they are stored as VARCHAR
// rather than UUID to keep `id = $1` comparisons well-typed.
const COLUMN_TYPES: ColumnTypes = ColumnTypes {
    id: "VARCHAR(36)",
    timestamp: "TIMESTAMP WITH TIME ZONE",
    now: "now()",
    float: "DOUBLE PRECISION",
    boolean: "BOOLEAN",
    false_literal: "false",
    graph_check: true,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDriver;

impl Driver for PostgresDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Postgres
    }

    fn bind_placeholder(&self, position: usize) -> String {
        format!("${}", position)
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn schema_statements(&self) -> Vec<String> {
        super::schema_statements(self, &COLUMN_TYPES)
    }

    fn transform_scanned(
        &self,
        shape: Shape,
        raw: &ColumnValue,
    ) -> Result<ColumnValue, TransformError> {
        match shape {
            Shape::Float => parse_float(raw),
            _ => Err(TransformError::NotTransformable),
        }
    }
}

/// Scan a result row by declared column type
pub(crate) fn scan_row(row: &PgRow) -> StorageResult<Vec<ColumnValue>> {
    (0..row.len()).map(|idx| scan_column(row, idx)).collect()
}

fn scan_column(row: &PgRow, idx: usize) -> StorageResult<ColumnValue> {
    let type_name = {
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            return Ok(ColumnValue::Null);
        }
        raw.type_info().name().to_ascii_uppercase()
    };

    let value = match type_name.as_str() {
        "BOOL" => ColumnValue::Bool(row.try_get::<bool, _>(idx)?),
        "INT2" => ColumnValue::Integer(row.try_get::<i16, _>(idx)?.into()),
        "INT4" => ColumnValue::Integer(row.try_get::<i32, _>(idx)?.into()),
        "INT8" => ColumnValue::Integer(row.try_get::<i64, _>(idx)?),
        "FLOAT4" => ColumnValue::Float(row.try_get::<f32, _>(idx)?.into()),
        "FLOAT8" => ColumnValue::Float(row.try_get::<f64, _>(idx)?),
        "TIMESTAMPTZ" => ColumnValue::Timestamp(row.try_get::<DateTime<Utc>, _>(idx)?),
        "TIMESTAMP" => ColumnValue::Timestamp(row.try_get::<NaiveDateTime, _>(idx)?.and_utc()),
        "BYTEA" => ColumnValue::Bytes(row.try_get::<Vec<u8>, _>(idx)?),
        "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" => {
            ColumnValue::Text(row.try_get::<String, _>(idx)?)
        }
        other => {
            return Err(StorageError::DecodeFailed {
                column: idx.to_string(),
                reason: format!("unsupported postgres column type {}", other),
            });
        }
    };

    Ok(value)
}
