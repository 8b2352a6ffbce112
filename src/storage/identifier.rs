//! Canonical identifier validation

use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::codec::ColumnValue;
use super::entity::{Entity, ID_COLUMN, TableMapping};
use super::error::{StorageError, StorageResult};
use super::registry::Registry;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-(?:[0-9a-fA-F]{4}-){3}[0-9a-fA-F]{12}$")
        .expect("identifier pattern is valid")
});

/// Whether `id` is in 8-4-4-4-12 hexadecimal form
pub fn is_valid(id: &str) -> bool {
    IDENTIFIER.is_match(id)
}

/// Resolve the mapping of `entity`, checking its identifier when asked
///
/// Writes validate; reads take identifiers as query input and don't.
pub fn validate<E: Entity>(
    registry: &Registry,
    entity: &E,
    check_identifier: bool,
) -> StorageResult<Arc<TableMapping>> {
    let mapping = registry.mapping::<E>()?;

    if check_identifier {
        let id = identifier_of(&mapping, entity)?;
        if !is_valid(&id) {
            return Err(StorageError::InvalidIdentifier(id));
        }
    }

    Ok(mapping)
}

/// Current value of the entity's `id` field
pub(crate) fn identifier_of<E: Entity>(mapping: &TableMapping, entity: &E) -> StorageResult<String> {
    let column = mapping.column_by_name(ID_COLUMN)?;
    let slot = entity
        .field(column.name)
        .ok_or_else(|| StorageError::UnknownColumn(format!("{}.{}", mapping.name(), column.name)))?;

    match slot.adapt()? {
        ColumnValue::Text(id) => Ok(id),
        other => Err(StorageError::InvalidIdentifier(format!(
            "{} identifier in {}",
            other.kind(),
            mapping.name()
        ))),
    }
}
