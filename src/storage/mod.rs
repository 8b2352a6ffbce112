//! Entity persistence over SQL engines
//!
//! This module maps typed domain entities onto tables of SQLite, PostgreSQL
//! or MySQL databases without runtime introspection.
//!
//! ## Design
//!
//! - **Declared mappings**: entities list their columns through the
//!   [`persisted!`](crate::persisted) macro; mappings are built once per type
//!   and cached in a per-backend [`Registry`]
//! - **Driver strategies**: placeholder syntax, quoting, schema DDL and value
//!   decoding differ per engine and live behind the [`Driver`] trait
//! - **Sparse writes**: fields holding their zero value are left out of
//!   inserts and updates, so storage defaults apply and partial updates keep
//!   stored values
//! - **Explicit transactions**: [`Backend::begin`] hands out a [`Transaction`]
//!   that commits or rolls back as a whole
//!
//! ## Usage
//!
//! ```no_run
//! use facette_backend::storage::{Backend, Item, Unit};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = Backend::open("sqlite", "./facette.db").await?;
//!
//!     let unit = Unit {
//!         item: Item {
//!             id: "00000000-0000-0000-0000-000000000001".to_string(),
//!             name: "bytes".to_string(),
//!             ..Default::default()
//!         },
//!         label: "B".to_string(),
//!     };
//!     backend.insert(&unit).await?;
//!
//!     let mut units: Vec<Unit> = Vec::new();
//!     backend.list(&mut units, "").await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod codec;
mod connection;
mod crud;
pub mod driver;
pub mod entity;
pub mod error;
pub mod identifier;
pub mod registry;
pub mod schema;
pub mod statement;

pub use backend::{Backend, HealthStatus, Transaction};
pub use codec::{ColumnValue, Field, FieldSlot, Shape};
pub use driver::{Driver, DriverKind, driver_for};
pub use entity::{ColumnMapping, Entity, MappingBuilder, Record, TableMapping};
pub use error::{StorageError, StorageResult};
pub use registry::Registry;
pub use schema::{
    Collection, Graph, GroupEntry, Item, MetricGroup, Scale, Series, SeriesGroup, SourceGroup,
    Unit,
};
