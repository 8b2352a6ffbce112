//! SQLite strategy
//!
//! SQLite has no native boolean or timestamp storage: booleans come back as
//! integers and timestamps as text. Values are scanned by storage class and
//! converted here when the target field asks for something else.

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};

use super::{ColumnTypes, Driver, DriverKind, TransformError, parse_bool, parse_float};
use crate::storage::codec::{ColumnValue, Shape};
use crate::storage::error::StorageResult;

const COLUMN_TYPES: ColumnTypes = ColumnTypes {
    id: "VARCHAR(36)",
    timestamp: "DATETIME",
    now: "CURRENT_TIMESTAMP",
    float: "REAL",
    boolean: "BOOLEAN",
    false_literal: "0",
    graph_check: true,
};

/// Naive layouts SQLite itself produces (`CURRENT_TIMESTAMP`, `datetime()`)
const NAIVE_LAYOUTS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl Driver for SqliteDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Sqlite
    }

    fn bind_placeholder(&self, _position: usize) -> String {
        "?".to_string()
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
        match (shape, raw) {
            (Shape::Bool, ColumnValue::Integer(v)) => Ok(ColumnValue::Bool(*v != 0)),
            (Shape::Bool, raw) => {
                let text = raw.as_text().ok_or(TransformError::NotTransformable)?;
                parse_bool(text)
                    .map(ColumnValue::Bool)
                    .ok_or_else(|| TransformError::Invalid(format!("invalid boolean {:?}", text)))
            }
            (Shape::Float, raw) => parse_float(raw),
            (Shape::Timestamp, raw) => {
                let text = raw.as_text().ok_or(TransformError::NotTransformable)?;
                parse_timestamp(text).map(ColumnValue::Timestamp)
            }
            _ => Err(TransformError::NotTransformable),
        }
    }
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, TransformError> {
    let text = text.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(ts.with_timezone(&Utc));
    }

    NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TransformError::Invalid(format!("invalid timestamp {:?}", text)))
}

/// Scan a result row by storage class
pub(crate) fn scan_row(row: &SqliteRow) -> StorageResult<Vec<ColumnValue>> {
    (0..row.len()).map(|idx| scan_column(row, idx)).collect()
}

fn scan_column(row: &SqliteRow, idx: usize) -> StorageResult<ColumnValue> {
    let storage_class = {
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            return Ok(ColumnValue::Null);
        }
        raw.type_info().name().to_ascii_uppercase()
    };

    let value = match storage_class.as_str() {
        "INTEGER" | "BOOLEAN" => ColumnValue::Integer(row.try_get_unchecked::<i64, _>(idx)?),
        "REAL" => ColumnValue::Float(row.try_get_unchecked::<f64, _>(idx)?),
        "BLOB" => ColumnValue::Bytes(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
        _ => ColumnValue::Text(row.try_get_unchecked::<String, _>(idx)?),
    };

    Ok(value)
}
