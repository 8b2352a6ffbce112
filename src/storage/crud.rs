//! CRUD engine
//!
//! Shared by [`Backend`](super::Backend) and
//! [`Transaction`](super::Transaction): both resolve a [`Conn`] and hand it
//! here together with the driver and mapping registry.

use tracing::{debug, warn};

use super::codec::ColumnValue;
use super::connection::Conn;
use super::driver::Driver;
use super::entity::{Entity, Record, TableMapping};
use super::error::{StorageError, StorageResult};
use super::identifier::{identifier_of, validate};
use super::registry::Registry;
use super::statement;

#[derive(Clone, Copy)]
pub(crate) struct Crud<'a> {
    pub driver: &'static dyn Driver,
    pub registry: &'a Registry,
}

impl Crud<'_> {
    pub async fn get<E: Entity>(
        &self,
        conn: &mut Conn<'_>,
        id: &str,
        target: &mut E,
    ) -> StorageResult<()> {
        let mapping = self.registry.mapping::<E>()?;
        let stmt = statement::select_by_id(self.driver, &mapping, id);

        let values = conn
            .fetch_optional(&stmt)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                table: mapping.name(),
                id: id.to_string(),
            })?;

        map_row(self.driver, &mapping, target, values)
    }

    pub async fn insert<E: Entity>(&self, conn: &mut Conn<'_>, entity: &E) -> StorageResult<()> {
        let mapping = validate(self.registry, entity, true)?;
        let stmt = statement::insert(self.driver, &mapping, entity)?;

        conn.execute(&stmt).await?;
        debug!("inserted row into {}", mapping.name());
        Ok(())
    }

    pub async fn update<E: Entity>(&self, conn: &mut Conn<'_>, entity: &E) -> StorageResult<()> {
        let mapping = validate(self.registry, entity, true)?;

        let Some(stmt) = statement::update(self.driver, &mapping, entity)? else {
            debug!("nothing to update in {}", mapping.name());
            return Ok(());
        };

        let affected = conn.execute(&stmt).await?;
        debug!("updated {} row(s) in {}", affected, mapping.name());
        Ok(())
    }

    pub async fn delete<E: Entity>(&self, conn: &mut Conn<'_>, entity: &E) -> StorageResult<()> {
        let mapping = validate(self.registry, entity, true)?;
        let id = identifier_of(&mapping, entity)?;
        let stmt = statement::delete(self.driver, &mapping, &id);

        let affected = conn.execute(&stmt).await?;
        debug!("deleted {} row(s) from {}", affected, mapping.name());
        Ok(())
    }

    pub async fn list<E: Entity>(
        &self,
        conn: &mut Conn<'_>,
        target: &mut Vec<E>,
        filter: &str,
    ) -> StorageResult<()> {
        let mapping = self.registry.mapping::<E>()?;
        if !filter.is_empty() {
            warn!("list filter on {} is not supported, ignoring {:?}", mapping.name(), filter);
        }

        let stmt = statement::list(self.driver, &mapping);
        let rows = conn.fetch_all(&stmt).await?;

        target.reserve(rows.len());
        for values in rows {
            let mut entity = E::default();
            map_row(self.driver, &mapping, &mut entity, values)?;
            target.push(entity);
        }

        debug!("listed {} row(s) from {}", target.len(), mapping.name());
        Ok(())
    }
}

/// Assign scanned values onto an entity, in mapping column order
fn map_row<E: Record>(
    driver: &dyn Driver,
    mapping: &TableMapping,
    entity: &mut E,
    values: Vec<ColumnValue>,
) -> StorageResult<()> {
    if values.len() != mapping.columns().len() {
        return Err(StorageError::QueryFailed(format!(
            "{} returned {} columns, expected {}",
            mapping.name(),
            values.len(),
            mapping.columns().len()
        )));
    }

    for (column, raw) in mapping.columns().iter().zip(values) {
        let slot = entity.field_mut(column.name).ok_or_else(|| {
            StorageError::UnknownColumn(format!("{}.{}", mapping.name(), column.name))
        })?;
        slot.assign(raw, driver)
            .map_err(|err| err.in_column(column.name))?;
    }

    Ok(())
}
