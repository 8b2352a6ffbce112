//! Entity declarations and table mappings
//!
//! Entities describe their persisted columns explicitly instead of being
//! introspected at runtime. A [`Record`] declares its columns (in order) and
//! exposes each mapped field through an object-safe [`FieldSlot`]; an
//! [`Entity`] is a record bound to a table. Embedded records are flattened
//! into the parent's column list.
//!
//! The [`persisted!`](crate::persisted) macro generates `Record` for plain
//! structs:
//!
//! ```
//! use facette_backend::persisted;
//! use facette_backend::storage::{Entity, Item};
//!
//! #[derive(Debug, Default)]
//! struct Dashboard {
//!     item: Item,
//!     layout: String,
//!     // not persisted
//!     cached: Option<u32>,
//! }
//!
//! persisted!(Dashboard {
//!     embed item: Item,
//!     "layout" => layout,
//! });
//!
//! impl Entity for Dashboard {
//!     fn table_name() -> &'static str {
//!         "dashboards"
//!     }
//! }
//! ```

use std::collections::HashSet;

use super::codec::FieldSlot;
use super::error::{StorageError, StorageResult};

/// Name of the identity column every entity table carries
pub const ID_COLUMN: &str = "id";

/// A structure whose fields map onto table columns
pub trait Record {
    /// Declare mapped columns in storage order
    fn describe(mapping: &mut MappingBuilder);

    fn field(&self, column: &str) -> Option<&dyn FieldSlot>;

    fn field_mut(&mut self, column: &str) -> Option<&mut dyn FieldSlot>;
}

/// A record persisted in its own table
pub trait Entity: Record + Default + Send + Sync + 'static {
    fn table_name() -> &'static str;
}

/// One mapped column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Storage column name
    pub name: &'static str,
    /// Entity field the column binds to
    pub field: &'static str,
}

/// Collects column declarations while a mapping is built
#[derive(Debug, Default)]
pub struct MappingBuilder {
    columns: Vec<ColumnMapping>,
}

impl MappingBuilder {
    pub fn column(&mut self, name: &'static str, field: &'static str) -> &mut Self {
        self.columns.push(ColumnMapping { name, field });
        self
    }

    /// Flatten an embedded record's columns into this mapping
    pub fn embed<R: Record>(&mut self) -> &mut Self {
        R::describe(self);
        self
    }
}

/// Cached table name and ordered column list for one entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMapping {
    name: &'static str,
    columns: Vec<ColumnMapping>,
}

impl TableMapping {
    /// Build and check the mapping of an entity type
    pub fn build<E: Entity>() -> StorageResult<Self> {
        let name = E::table_name();
        if name.trim().is_empty() {
            return Err(StorageError::InvalidStruct(format!(
                "{} resolves no table name",
                std::any::type_name::<E>()
            )));
        }

        let mut builder = MappingBuilder::default();
        E::describe(&mut builder);

        let mut seen = HashSet::new();
        let probe = E::default();
        for column in &builder.columns {
            if !seen.insert(column.name) {
                return Err(StorageError::InvalidStruct(format!(
                    "column {} declared twice on table {}",
                    column.name, name
                )));
            }
            if probe.field(column.name).is_none() {
                return Err(StorageError::InvalidStruct(format!(
                    "column {} of table {} has no field accessor",
                    column.name, name
                )));
            }
        }

        let mapping = Self {
            name,
            columns: builder.columns,
        };
        mapping.column_by_name(ID_COLUMN)?;

        Ok(mapping)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn columns(&self) -> &[ColumnMapping] {
        &self.columns
    }

    pub fn column_by_name(&self, name: &str) -> StorageResult<&ColumnMapping> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| StorageError::UnknownColumn(format!("{}.{}", self.name, name)))
    }
}

/// Implement [`Record`] for a struct from a column list
///
/// Embedded records come first, followed by `"column" => field` pairs.
/// Fields not listed are not persisted.
#[macro_export]
macro_rules! persisted {
    (
        $ty:ty {
            $( embed $embed:ident : $embed_ty:ty, )*
            $( $column:literal => $field:ident ),* $(,)?
        }
    ) => {
        impl $crate::storage::Record for $ty {
            fn describe(mapping: &mut $crate::storage::MappingBuilder) {
                $( mapping.embed::<$embed_ty>(); )*
                $( mapping.column($column, stringify!($field)); )*
            }

            #[allow(unreachable_code)]
            fn field(&self, column: &str) -> Option<&dyn $crate::storage::FieldSlot> {
                match column {
                    $( $column => return Some(&self.$field as &dyn $crate::storage::FieldSlot), )*
                    _ => {}
                }
                $(
                    if let Some(slot) = $crate::storage::Record::field(&self.$embed, column) {
                        return Some(slot);
                    }
                )*
                None
            }

            #[allow(unreachable_code)]
            fn field_mut(&mut self, column: &str) -> Option<&mut dyn $crate::storage::FieldSlot> {
                match column {
                    $( $column => return Some(&mut self.$field as &mut dyn $crate::storage::FieldSlot), )*
                    _ => {}
                }
                $(
                    if let Some(slot) = $crate::storage::Record::field_mut(&mut self.$embed, column) {
                        return Some(slot);
                    }
                )*
                None
            }
        }
    };
}
