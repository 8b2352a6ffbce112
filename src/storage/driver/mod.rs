//! Per-engine SQL strategies
//!
//! A [`Driver`] encapsulates everything that differs between the supported
//! engines: bind-variable syntax, identifier quoting, schema DDL and the
//! decoding of values the engine hands back in a non-native form. Drivers
//! are stateless; one `'static` instance exists per engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::codec::{ColumnValue, Shape};
use super::error::StorageError;

pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mysql::MySqlDriver;
pub use postgres::PostgresDriver;
pub use sqlite::SqliteDriver;

/// Supported database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    #[serde(alias = "sqlite3")]
    Sqlite,
    #[serde(alias = "postgresql", alias = "pgsql")]
    Postgres,
    #[serde(rename = "mysql")]
    MySql,
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverKind::Sqlite => write!(f, "sqlite"),
            DriverKind::Postgres => write!(f, "postgres"),
            DriverKind::MySql => write!(f, "mysql"),
        }
    }
}

impl FromStr for DriverKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(DriverKind::Sqlite),
            "postgres" | "postgresql" | "pgsql" => Ok(DriverKind::Postgres),
            "mysql" => Ok(DriverKind::MySql),
            _ => Err(StorageError::UnsupportedDriver(s.to_string())),
        }
    }
}

/// Outcome of a driver declining or failing to transform a scanned value
#[derive(Debug, Clone, PartialEq)]
pub enum TransformError {
    /// The engine applies no special-case conversion for this shape
    NotTransformable,
    /// The conversion applies but the raw value is malformed
    Invalid(String),
}

/// Strategy contract implemented once per SQL engine
pub trait Driver: Send + Sync + fmt::Debug {
    fn kind(&self) -> DriverKind;

    /// Positional parameter token for a 1-based ordinal
    fn bind_placeholder(&self, position: usize) -> String;

    /// Quote a table or column name
    fn quote_identifier(&self, name: &str) -> String;

    /// Idempotent DDL covering every entity table and join table
    fn schema_statements(&self) -> Vec<String>;

    /// Engine-specific decoding of a scanned value into the target shape
    fn transform_scanned(&self, shape: Shape, raw: &ColumnValue)
    -> Result<ColumnValue, TransformError>;
}

static SQLITE: SqliteDriver = SqliteDriver;
static POSTGRES: PostgresDriver = PostgresDriver;
static MYSQL: MySqlDriver = MySqlDriver;

/// Resolve the strategy for an engine
pub fn driver_for(kind: DriverKind) -> &'static dyn Driver {
    match kind {
        DriverKind::Sqlite => &SQLITE,
        DriverKind::Postgres => &POSTGRES,
        DriverKind::MySql => &MYSQL,
    }
}

/// Column types that vary between engines in the shared DDL template
pub(crate) struct ColumnTypes {
    pub id: &'static str,
    pub timestamp: &'static str,
    pub now: &'static str,
    pub float: &'static str,
    pub boolean: &'static str,
    pub false_literal: &'static str,
    /// Whether the graphs entry check constraint can be declared
    pub graph_check: bool,
}

/// Render the logical schema for one engine
pub(crate) fn schema_statements(driver: &dyn Driver, types: &ColumnTypes) -> Vec<String> {
    let q = |name: &str| driver.quote_identifier(name);
    let item_columns = format!(
        "id {id} NOT NULL,
            name VARCHAR(255) NOT NULL,
            description TEXT,
            created {ts} NOT NULL DEFAULT {now},
            modified {ts} NOT NULL DEFAULT {now}",
        id = types.id,
        ts = types.timestamp,
        now = types.now,
    );

    let mut statements = vec![
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (
            {item_columns},
            value {float} NOT NULL,
            CONSTRAINT {pk} PRIMARY KEY (id),
            CONSTRAINT {un_name} UNIQUE (name),
            CONSTRAINT {un_value} UNIQUE (value)
        )",
            table = q("scales"),
            float = types.float,
            pk = q("pk_scales"),
            un_name = q("un_scales_name"),
            un_value = q("un_scales_value"),
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (
            {item_columns},
            label VARCHAR(32) NOT NULL,
            CONSTRAINT {pk} PRIMARY KEY (id),
            CONSTRAINT {un_name} UNIQUE (name),
            CONSTRAINT {un_label} UNIQUE (label)
        )",
            table = q("units"),
            pk = q("pk_units"),
            un_name = q("un_units_name"),
            un_label = q("un_units_label"),
        ),
    ];

    for table in ["sourcegroups", "metricgroups"] {
        statements.push(format!(
            "CREATE TABLE IF NOT EXISTS {quoted} (
            {item_columns},
            entries TEXT NOT NULL,
            CONSTRAINT {pk} PRIMARY KEY (id),
            CONSTRAINT {un_name} UNIQUE (name)
        )",
            quoted = q(table),
            pk = q(&format!("pk_{table}")),
            un_name = q(&format!("un_{table}_name")),
        ));
    }

    let graph_check = if types.graph_check {
        format!(
            ",
            CONSTRAINT {ck} CHECK ((series IS NOT NULL AND link IS NULL AND attributes IS NULL) OR
                (series IS NULL AND template = {no} AND link IS NOT NULL AND attributes IS NOT NULL))",
            ck = q("ck_graphs_entry"),
            no = types.false_literal,
        )
    } else {
        String::new()
    };

    statements.push(format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            {item_columns},
            series TEXT,
            link {id},
            attributes TEXT,
            options TEXT,
            template {boolean} NOT NULL DEFAULT {no},
            CONSTRAINT {pk} PRIMARY KEY (id),
            CONSTRAINT {fk_link} FOREIGN KEY (link) REFERENCES {table} (id)
                ON DELETE CASCADE ON UPDATE CASCADE,
            CONSTRAINT {un_name} UNIQUE (name){graph_check}
        )",
        table = q("graphs"),
        id = types.id,
        boolean = types.boolean,
        no = types.false_literal,
        pk = q("pk_graphs"),
        fk_link = q("fk_graphs_link"),
        un_name = q("un_graphs_name"),
    ));

    statements.push(format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            {item_columns},
            CONSTRAINT {pk} PRIMARY KEY (id),
            CONSTRAINT {un_name} UNIQUE (name)
        )",
        table = q("collections"),
        pk = q("pk_collections"),
        un_name = q("un_collections_name"),
    ));

    statements.push(format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            collection_id {id} NOT NULL,
            graph_id {id} NOT NULL,
            options TEXT,
            CONSTRAINT {pk} PRIMARY KEY (collection_id, graph_id),
            CONSTRAINT {fk_collection} FOREIGN KEY (collection_id) REFERENCES {collections} (id)
                ON DELETE CASCADE ON UPDATE CASCADE,
            CONSTRAINT {fk_graph} FOREIGN KEY (graph_id) REFERENCES {graphs} (id)
                ON DELETE CASCADE ON UPDATE CASCADE
        )",
        table = q("collections_graphs"),
        id = types.id,
        pk = q("pk_collections_graphs"),
        fk_collection = q("fk_collections_graphs_collection_id"),
        fk_graph = q("fk_collections_graphs_graph_id"),
        collections = q("collections"),
        graphs = q("graphs"),
    ));

    statements
}

/// Boolean text parsing accepting the usual SQL and Go-style spellings
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Float parsing for engines returning numeric columns as text
pub(crate) fn parse_float(raw: &ColumnValue) -> Result<ColumnValue, TransformError> {
    let text = raw.as_text().ok_or(TransformError::NotTransformable)?;
    text.trim()
        .parse::<f64>()
        .map(ColumnValue::Float)
        .map_err(|err| TransformError::Invalid(format!("invalid float {:?}: {}", text, err)))
}
