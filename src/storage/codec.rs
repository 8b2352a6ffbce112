//! Value codec between entity fields and column values
//!
//! ## Write path
//!
//! Every mapped field is adapted into a [`ColumnValue`] before it is bound.
//! Scalars pass through as their native variant; sequences, maps and nested
//! records are serialized to a JSON payload ([`ColumnValue::Bytes`]).
//!
//! ## Read path
//!
//! A scanned value is first converted directly into the target field. When
//! the variant does not fit, the active [`Driver`] gets a chance to transform
//! it (engines return booleans, floats and timestamps as integers or text).
//! If the driver declines and the field is structured, the raw value is
//! decoded as a JSON payload. Any remaining mismatch is an error.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::driver::{Driver, TransformError};
use super::error::{StorageError, StorageResult};

/// A column value as bound to or scanned from a statement
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
}

impl ColumnValue {
    /// Short variant name used in decode errors
    pub fn kind(&self) -> &'static str {
        match self {
            ColumnValue::Null => "null",
            ColumnValue::Bool(_) => "boolean",
            ColumnValue::Integer(_) => "integer",
            ColumnValue::Float(_) => "float",
            ColumnValue::Text(_) => "text",
            ColumnValue::Bytes(_) => "bytes",
            ColumnValue::Timestamp(_) => "timestamp",
        }
    }

    /// Raw payload of textual variants
    pub fn as_payload(&self) -> Option<&[u8]> {
        match self {
            ColumnValue::Text(text) => Some(text.as_bytes()),
            ColumnValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Payload interpreted as UTF-8 text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ColumnValue::Text(text) => Some(text),
            ColumnValue::Bytes(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }
}

/// Shape of an entity field, as seen by driver transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Bool,
    Integer,
    Float,
    Text,
    Timestamp,
    /// Sequence, map or nested record stored as JSON
    Structured,
}

/// A type that can be stored in a mapped column
pub trait Field: Sized + Send + Sync + 'static {
    const SHAPE: Shape;

    /// Whether the value equals its type's zero value (skipped on write)
    fn is_zero(&self) -> bool;

    /// Convert the value into its stored representation
    fn adapt(&self) -> StorageResult<ColumnValue>;

    /// Direct conversion from a scanned value; hands the value back on mismatch
    fn convert(value: ColumnValue) -> Result<Self, ColumnValue>;

    /// JSON decoding for structured shapes
    fn decode_payload(_payload: &[u8]) -> Option<serde_json::Result<Self>> {
        None
    }
}

impl Field for bool {
    const SHAPE: Shape = Shape::Bool;

    fn is_zero(&self) -> bool {
        !*self
    }

    fn adapt(&self) -> StorageResult<ColumnValue> {
        Ok(ColumnValue::Bool(*self))
    }

    fn convert(value: ColumnValue) -> Result<Self, ColumnValue> {
        match value {
            ColumnValue::Bool(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl Field for i64 {
    const SHAPE: Shape = Shape::Integer;

    fn is_zero(&self) -> bool {
        *self == 0
    }

    fn adapt(&self) -> StorageResult<ColumnValue> {
        Ok(ColumnValue::Integer(*self))
    }

    fn convert(value: ColumnValue) -> Result<Self, ColumnValue> {
        match value {
            ColumnValue::Integer(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl Field for f64 {
    const SHAPE: Shape = Shape::Float;

    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn adapt(&self) -> StorageResult<ColumnValue> {
        Ok(ColumnValue::Float(*self))
    }

    fn convert(value: ColumnValue) -> Result<Self, ColumnValue> {
        match value {
            ColumnValue::Float(v) => Ok(v),
            ColumnValue::Integer(v) => Ok(v as f64),
            other => Err(other),
        }
    }
}

impl Field for String {
    const SHAPE: Shape = Shape::Text;

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn adapt(&self) -> StorageResult<ColumnValue> {
        Ok(ColumnValue::Text(self.clone()))
    }

    fn convert(value: ColumnValue) -> Result<Self, ColumnValue> {
        match value {
            ColumnValue::Text(v) => Ok(v),
            ColumnValue::Bytes(bytes) => {
                String::from_utf8(bytes).map_err(|err| ColumnValue::Bytes(err.into_bytes()))
            }
            other => Err(other),
        }
    }
}

impl Field for DateTime<Utc> {
    const SHAPE: Shape = Shape::Timestamp;

    fn is_zero(&self) -> bool {
        *self == DateTime::<Utc>::default()
    }

    fn adapt(&self) -> StorageResult<ColumnValue> {
        Ok(ColumnValue::Timestamp(*self))
    }

    fn convert(value: ColumnValue) -> Result<Self, ColumnValue> {
        match value {
            ColumnValue::Timestamp(v) => Ok(v),
            other => Err(other),
        }
    }
}

macro_rules! structured_field {
    ($ty:ty, [$($param:ident),*]) => {
        impl<$($param),*> Field for $ty
        where
            $($param: Serialize + DeserializeOwned + Send + Sync + 'static,)*
        {
            const SHAPE: Shape = Shape::Structured;

            fn is_zero(&self) -> bool {
                self.is_empty()
            }

            fn adapt(&self) -> StorageResult<ColumnValue> {
                Ok(ColumnValue::Bytes(serde_json::to_vec(self)?))
            }

            fn convert(value: ColumnValue) -> Result<Self, ColumnValue> {
                Err(value)
            }

            fn decode_payload(payload: &[u8]) -> Option<serde_json::Result<Self>> {
                Some(serde_json::from_slice(payload))
            }
        }
    };
}

structured_field!(Vec<T>, [T]);
structured_field!(BTreeMap<String, V>, [V]);
structured_field!(serde_json::Map<String, serde_json::Value>, []);

/// Decode a scanned value into a field of type `T`
///
/// `Ok(None)` means the column was NULL and the field keeps its value.
pub fn decode<T: Field>(raw: ColumnValue, driver: &dyn Driver) -> StorageResult<Option<T>> {
    if raw == ColumnValue::Null {
        return Ok(None);
    }

    let raw = match T::convert(raw) {
        Ok(value) => return Ok(Some(value)),
        Err(raw) => raw,
    };

    match driver.transform_scanned(T::SHAPE, &raw) {
        Ok(transformed) => T::convert(transformed).map(Some).map_err(|value| {
            StorageError::DecodeFailed {
                column: String::new(),
                reason: format!(
                    "{} driver produced {} for a {:?} field",
                    driver.kind(),
                    value.kind(),
                    T::SHAPE
                ),
            }
        }),
        Err(TransformError::Invalid(reason)) => Err(StorageError::DecodeFailed {
            column: String::new(),
            reason,
        }),
        Err(TransformError::NotTransformable) => {
            let mismatch = || StorageError::DecodeFailed {
                column: String::new(),
                reason: format!("cannot convert {} into a {:?} field", raw.kind(), T::SHAPE),
            };
            let payload = raw.as_payload().ok_or_else(mismatch)?;
            match T::decode_payload(payload) {
                Some(decoded) => Ok(Some(decoded?)),
                None => Err(mismatch()),
            }
        }
    }
}

/// Object-safe view of a mapped entity field
pub trait FieldSlot: Send + Sync {
    fn shape(&self) -> Shape;

    fn is_zero(&self) -> bool;

    fn adapt(&self) -> StorageResult<ColumnValue>;

    /// Assign a scanned value, leaving the field untouched on NULL
    fn assign(&mut self, raw: ColumnValue, driver: &dyn Driver) -> StorageResult<()>;
}

impl<T: Field> FieldSlot for T {
    fn shape(&self) -> Shape {
        T::SHAPE
    }

    fn is_zero(&self) -> bool {
        Field::is_zero(self)
    }

    fn adapt(&self) -> StorageResult<ColumnValue> {
        Field::adapt(self)
    }

    fn assign(&mut self, raw: ColumnValue, driver: &dyn Driver) -> StorageResult<()> {
        if let Some(value) = decode::<T>(raw, driver)? {
            *self = value;
        }
        Ok(())
    }
}
