//! Entity-table registry
//!
//! Mappings are built lazily on first use of an entity type and shared for
//! the lifetime of the backend handle. Concurrent first use is serialized on
//! the write lock and re-checked, so each type is mapped exactly once.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::entity::{Entity, TableMapping};
use super::error::StorageResult;

#[derive(Debug, Default)]
pub struct Registry {
    mappings: RwLock<HashMap<TypeId, Arc<TableMapping>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapping of `E`, built on first request
    pub fn mapping<E: Entity>(&self) -> StorageResult<Arc<TableMapping>> {
        let key = TypeId::of::<E>();

        if let Some(mapping) = self.mappings.read().get(&key) {
            return Ok(Arc::clone(mapping));
        }

        let mut mappings = self.mappings.write();
        if let Some(mapping) = mappings.get(&key) {
            return Ok(Arc::clone(mapping));
        }

        let mapping = Arc::new(TableMapping::build::<E>()?);
        debug!(
            "mapped {} onto table {} ({} columns)",
            std::any::type_name::<E>(),
            mapping.name(),
            mapping.columns().len()
        );
        mappings.insert(key, Arc::clone(&mapping));

        Ok(mapping)
    }

    /// Number of entity types mapped so far
    pub fn len(&self) -> usize {
        self.mappings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
