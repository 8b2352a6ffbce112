//! Error types for storage operations

use std::fmt;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations
#[derive(Debug)]
pub enum StorageError {
    /// Database connection failed
    ConnectionFailed(String),

    /// Database statement failed (constraint violation, syntax, connectivity)
    QueryFailed(String),

    /// Idempotent schema creation failed
    SchemaFailed(String),

    /// Invalid configuration
    InvalidConfig(String),

    /// Requested database engine is not supported
    UnsupportedDriver(String),

    /// Identifier missing or not matching the canonical format
    InvalidIdentifier(String),

    /// Entity definition cannot be mapped, or an update lacks an identifier
    InvalidStruct(String),

    /// Column absent from a table mapping
    UnknownColumn(String),

    /// No row matched the requested identifier
    NotFound { table: &'static str, id: String },

    /// A scanned column value could not be decoded into its target field
    DecodeFailed { column: String, reason: String },

    /// Structured field serialization/deserialization error
    SerializationError(String),

    /// I/O error (file access, etc.)
    IoError(std::io::Error),
}

impl StorageError {
    /// Annotate a decode failure with the column it happened on.
    pub(crate) fn in_column(self, column: &str) -> Self {
        match self {
            StorageError::DecodeFailed { reason, .. } => StorageError::DecodeFailed {
                column: column.to_string(),
                reason,
            },
            StorageError::SerializationError(reason) => StorageError::DecodeFailed {
                column: column.to_string(),
                reason,
            },
            other => other,
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionFailed(msg) => {
                write!(f, "failed to connect to storage backend: {}", msg)
            }
            StorageError::QueryFailed(msg) => write!(f, "storage query failed: {}", msg),
            StorageError::SchemaFailed(msg) => write!(f, "schema initialization failed: {}", msg),
            StorageError::InvalidConfig(msg) => write!(f, "invalid storage configuration: {}", msg),
            StorageError::UnsupportedDriver(name) => {
                write!(f, "unsupported database driver `{}'", name)
            }
            StorageError::InvalidIdentifier(id) => write!(f, "invalid item identifier: {:?}", id),
            StorageError::InvalidStruct(msg) => write!(f, "invalid table struct: {}", msg),
            StorageError::UnknownColumn(name) => write!(f, "unknown column: {}", name),
            StorageError::NotFound { table, id } => write!(f, "no {} row with id {}", table, id),
            StorageError::DecodeFailed { column, reason } => {
                write!(f, "failed to decode column {}: {}", column, reason)
            }
            StorageError::SerializationError(msg) => {
                write!(f, "field serialization error: {}", msg)
            }
            StorageError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err)
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(io_err) => StorageError::IoError(io_err),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StorageError::ConnectionFailed(err.to_string())
            }
            sqlx::Error::ColumnDecode { index, source } => StorageError::DecodeFailed {
                column: index,
                reason: source.to_string(),
            },
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::SerializationError(err.to_string())
    }
}
