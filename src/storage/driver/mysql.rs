//! MySQL strategy
//!
//! MySQL stores booleans as `TINYINT(1)` and returns `DECIMAL` values as
//! strings, so both are decoded here rather than in the codec.

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{Row, TypeInfo, ValueRef};

use super::{ColumnTypes, Driver, DriverKind, TransformError, parse_bool, parse_float};
use crate::storage::codec::{ColumnValue, Shape};
use crate::storage::error::StorageResult;

// MySQL rejects CHECK constraints on columns used by a foreign key with a
// referential action; the cascade on `graphs.link` wins.
const COLUMN_TYPES: ColumnTypes = ColumnTypes {
    id: "VARCHAR(36)",
    timestamp: "TIMESTAMP",
    now: "CURRENT_TIMESTAMP",
    float: "DOUBLE",
    boolean: "BOOLEAN",
    false_literal: "false",
    graph_check: false,
};

const TIMESTAMP_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDriver;

impl Driver for MySqlDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::MySql
    }

    fn bind_placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
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
                NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_LAYOUT)
                    .map(|naive| ColumnValue::Timestamp(naive.and_utc()))
                    .map_err(|err| {
                        TransformError::Invalid(format!("invalid timestamp {:?}: {}", text, err))
                    })
            }
            _ => Err(TransformError::NotTransformable),
        }
    }
}

/// Scan a result row by column type name
pub(crate) fn scan_row(row: &MySqlRow) -> StorageResult<Vec<ColumnValue>> {
    (0..row.len()).map(|idx| scan_column(row, idx)).collect()
}

fn scan_column(row: &MySqlRow, idx: usize) -> StorageResult<ColumnValue> {
    let type_name = {
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            return Ok(ColumnValue::Null);
        }
        raw.type_info().name().to_ascii_uppercase()
    };

    let value = match type_name.as_str() {
        // Booleans stay integers; the transform turns them back into bools
        "BOOLEAN" | "TINYINT" => ColumnValue::Integer(row.try_get_unchecked::<i8, _>(idx)?.into()),
        "TINYINT UNSIGNED" => ColumnValue::Integer(row.try_get_unchecked::<u8, _>(idx)?.into()),
        "SMALLINT" => ColumnValue::Integer(row.try_get_unchecked::<i16, _>(idx)?.into()),
        "SMALLINT UNSIGNED" => ColumnValue::Integer(row.try_get_unchecked::<u16, _>(idx)?.into()),
        "MEDIUMINT" | "INT" => ColumnValue::Integer(row.try_get_unchecked::<i32, _>(idx)?.into()),
        "MEDIUMINT UNSIGNED" | "INT UNSIGNED" => {
            ColumnValue::Integer(row.try_get_unchecked::<u32, _>(idx)?.into())
        }
        "BIGINT" | "BIGINT UNSIGNED" => ColumnValue::Integer(row.try_get_unchecked::<i64, _>(idx)?),
        "FLOAT" => ColumnValue::Float(row.try_get_unchecked::<f32, _>(idx)?.into()),
        "DOUBLE" => ColumnValue::Float(row.try_get_unchecked::<f64, _>(idx)?),
        "TIMESTAMP" => ColumnValue::Timestamp(row.try_get_unchecked::<DateTime<Utc>, _>(idx)?),
        "DATETIME" => {
            ColumnValue::Timestamp(row.try_get_unchecked::<NaiveDateTime, _>(idx)?.and_utc())
        }
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            ColumnValue::Bytes(row.try_get_unchecked::<Vec<u8>, _>(idx)?)
        }
        // DECIMAL and the text family travel as strings on the wire
        _ => ColumnValue::Text(row.try_get_unchecked::<String, _>(idx)?),
    };

    Ok(value)
}
