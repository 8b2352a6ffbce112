//! Parameterized statement construction
//!
//! Statements are built from a table mapping and the active driver only; no
//! connection is involved, which keeps the generated SQL testable per engine.

use super::codec::ColumnValue;
use super::driver::Driver;
use super::entity::{ID_COLUMN, Record, TableMapping};
use super::error::{StorageError, StorageResult};

/// SQL text with its positional arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<ColumnValue>,
}

fn column_list(driver: &dyn Driver, mapping: &TableMapping) -> String {
    mapping
        .columns()
        .iter()
        .map(|c| driver.quote_identifier(c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Adapted values of the entity's non-zero columns, in mapping order
fn sparse_values<E: Record>(
    mapping: &TableMapping,
    entity: &E,
) -> StorageResult<Vec<(&'static str, ColumnValue)>> {
    let mut values = Vec::with_capacity(mapping.columns().len());

    for column in mapping.columns() {
        let slot = entity.field(column.name).ok_or_else(|| {
            StorageError::UnknownColumn(format!("{}.{}", mapping.name(), column.name))
        })?;
        if slot.is_zero() {
            continue;
        }
        values.push((column.name, slot.adapt()?));
    }

    Ok(values)
}

pub fn select_by_id(driver: &dyn Driver, mapping: &TableMapping, id: &str) -> Statement {
    Statement {
        sql: format!(
            "SELECT {} FROM {} WHERE {} = {}",
            column_list(driver, mapping),
            driver.quote_identifier(mapping.name()),
            driver.quote_identifier(ID_COLUMN),
            driver.bind_placeholder(1),
        ),
        args: vec![ColumnValue::Text(id.to_string())],
    }
}

/// Row listing, ordered by identifier
pub fn list(driver: &dyn Driver, mapping: &TableMapping) -> Statement {
    Statement {
        sql: format!(
            "SELECT {} FROM {} ORDER BY {}",
            column_list(driver, mapping),
            driver.quote_identifier(mapping.name()),
            driver.quote_identifier(ID_COLUMN),
        ),
        args: Vec::new(),
    }
}

/// Insert of the entity's non-zero columns
pub fn insert<E: Record>(
    driver: &dyn Driver,
    mapping: &TableMapping,
    entity: &E,
) -> StorageResult<Statement> {
    let values = sparse_values(mapping, entity)?;

    let mut columns = Vec::with_capacity(values.len());
    let mut binds = Vec::with_capacity(values.len());
    let mut args = Vec::with_capacity(values.len());
    for (position, (name, value)) in values.into_iter().enumerate() {
        columns.push(driver.quote_identifier(name));
        binds.push(driver.bind_placeholder(position + 1));
        args.push(value);
    }

    Ok(Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            driver.quote_identifier(mapping.name()),
            columns.join(", "),
            binds.join(", "),
        ),
        args,
    })
}

/// Update of the entity's non-zero columns, keyed by its identifier
///
/// Returns `None` when nothing besides the identifier is set.
pub fn update<E: Record>(
    driver: &dyn Driver,
    mapping: &TableMapping,
    entity: &E,
) -> StorageResult<Option<Statement>> {
    let mut id = None;
    let mut sets = Vec::new();
    let mut args = Vec::new();

    for (name, value) in sparse_values(mapping, entity)? {
        if name == ID_COLUMN {
            id = Some(value);
            continue;
        }
        sets.push(format!(
            "{} = {}",
            driver.quote_identifier(name),
            driver.bind_placeholder(sets.len() + 1)
        ));
        args.push(value);
    }

    let id = id.ok_or_else(|| {
        StorageError::InvalidStruct(format!("{} update without identifier", mapping.name()))
    })?;
    if sets.is_empty() {
        return Ok(None);
    }

    let position = sets.len() + 1;
    args.push(id);

    Ok(Some(Statement {
        sql: format!(
            "UPDATE {} SET {} WHERE {} = {}",
            driver.quote_identifier(mapping.name()),
            sets.join(", "),
            driver.quote_identifier(ID_COLUMN),
            driver.bind_placeholder(position),
        ),
        args,
    }))
}

pub fn delete(driver: &dyn Driver, mapping: &TableMapping, id: &str) -> Statement {
    Statement {
        sql: format!(
            "DELETE FROM {} WHERE {} = {}",
            driver.quote_identifier(mapping.name()),
            driver.quote_identifier(ID_COLUMN),
            driver.bind_placeholder(1),
        ),
        args: vec![ColumnValue::Text(id.to_string())],
    }
}
