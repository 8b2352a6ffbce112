//! CRUD round-trips against SQLite
//!
//! These tests verify:
//! - Every entity kind round-trips through insert, get, list, update, delete
//! - Sparse updates keep stored values of zero-valued fields
//! - Malformed identifiers are rejected before any statement runs
//! - Structured fields are stored as their exact JSON encoding

use assert_matches::assert_matches;
use facette_backend::storage::{Backend, Graph, Item, Scale, StorageError, Unit};
use pretty_assertions::assert_eq;
use sqlx::sqlite::SqlitePool;

use crate::helpers::*;

#[tokio::test]
async fn test_graph_roundtrip() {
    let (_dir, backend) = sqlite_backend().await;
    let (items, updated) = graphs(date());
    exec_roundtrip(&backend, &items, &updated).await;
}

#[tokio::test]
async fn test_source_group_roundtrip() {
    let (_dir, backend) = sqlite_backend().await;
    let (items, updated) = source_groups(date());
    exec_roundtrip(&backend, &items, &updated).await;
}

#[tokio::test]
async fn test_metric_group_roundtrip() {
    let (_dir, backend) = sqlite_backend().await;
    let (items, updated) = metric_groups(date());
    exec_roundtrip(&backend, &items, &updated).await;
}

#[tokio::test]
async fn test_scale_roundtrip() {
    let (_dir, backend) = sqlite_backend().await;
    let (items, updated) = scales(date());
    exec_roundtrip(&backend, &items, &updated).await;
}

#[tokio::test]
async fn test_unit_roundtrip() {
    let (_dir, backend) = sqlite_backend().await;
    let (items, updated) = units(date());
    exec_roundtrip(&backend, &items, &updated).await;
}

#[tokio::test]
async fn test_memory_database_roundtrip() {
    let backend = Backend::open("sqlite3", ":memory:").await.unwrap();
    let (items, updated) = units(date());
    exec_roundtrip(&backend, &items, &updated).await;
}

#[tokio::test]
async fn test_sparse_update_keeps_omitted_fields() {
    let (_dir, backend) = sqlite_backend().await;
    let date = date();
    let (items, _) = scales(date);
    backend.insert(&items[0]).await.unwrap();

    // Only the value changes; the empty description is left out
    let partial = Scale {
        item: Item {
            id: ID0.to_string(),
            ..Default::default()
        },
        value: 0.5,
    };
    backend.update(&partial).await.unwrap();

    let mut out = Scale::default();
    backend.get(ID0, &mut out).await.unwrap();
    assert_eq!(out.value, 0.5);
    assert_eq!(out.item.name, "scale1");
    assert_eq!(out.item.description, "A great scale description");
    assert_eq!(out.item.created, date);
}

#[tokio::test]
async fn test_update_without_changes_succeeds() {
    let (_dir, backend) = sqlite_backend().await;
    let (items, _) = units(date());
    backend.insert(&items[0]).await.unwrap();

    let mut untouched = Unit::default();
    untouched.item.id = ID0.to_string();
    backend.update(&untouched).await.unwrap();

    let mut out = Unit::default();
    backend.get(ID0, &mut out).await.unwrap();
    assert_eq!(out, items[0]);
}

#[tokio::test]
async fn test_malformed_identifier_is_rejected() {
    let (_dir, backend) = sqlite_backend().await;
    let (mut items, _) = units(date());
    let mut unit = items.remove(0);
    unit.item.id = "not-a-uuid".to_string();

    assert_matches!(
        backend.insert(&unit).await,
        Err(StorageError::InvalidIdentifier(id)) if id == "not-a-uuid"
    );
    assert_matches!(
        backend.update(&unit).await,
        Err(StorageError::InvalidIdentifier(_))
    );
    assert_matches!(
        backend.delete(&unit).await,
        Err(StorageError::InvalidIdentifier(_))
    );

    let mut listed: Vec<Unit> = Vec::new();
    backend.list(&mut listed, "").await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_get_does_not_validate_identifier() {
    let (_dir, backend) = sqlite_backend().await;

    let mut out = Unit::default();
    assert_matches!(
        backend.get("not-a-uuid", &mut out).await,
        Err(StorageError::NotFound { table: "units", id }) if id == "not-a-uuid"
    );
}

#[tokio::test]
async fn test_structured_fields_stored_as_json() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("facette.db");
    let backend = Backend::open("sqlite", db_path.to_str().unwrap())
        .await
        .unwrap();

    let (items, _) = graphs(date());
    backend.insert(&items[0]).await.unwrap();

    let pool = SqlitePool::connect(&format!("sqlite://{}", db_path.display()))
        .await
        .unwrap();
    let (series, options): (String, String) =
        sqlx::query_as("SELECT series, options FROM graphs WHERE id = ?")
            .bind(ID0)
            .fetch_one(&pool)
            .await
            .unwrap();

    assert_eq!(series, serde_json::to_string(&items[0].series).unwrap());
    assert_eq!(options, serde_json::to_string(&items[0].options).unwrap());

    let mut out = Graph::default();
    backend.get(ID0, &mut out).await.unwrap();
    assert_eq!(out.series, items[0].series);
    assert_eq!(out.options, items[0].options);
}

#[tokio::test]
async fn test_list_appends_in_identifier_order() {
    let (_dir, backend) = sqlite_backend().await;
    let (items, _) = units(date());

    // Inserted in reverse; listing follows identifiers
    backend.insert(&items[1]).await.unwrap();
    backend.insert(&items[0]).await.unwrap();

    let mut listed = vec![Unit::default()];
    backend.list(&mut listed, "").await.unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[1], items[0]);
    assert_eq!(listed[2], items[1]);
}

#[tokio::test]
async fn test_list_follows_insertion_with_ascending_identifiers() {
    let (_dir, backend) = sqlite_backend().await;
    let (items, _) = units(date());
    assert!(items[0].item.id < items[1].item.id);

    for unit in &items {
        backend.insert(unit).await.unwrap();
    }

    let mut listed: Vec<Unit> = Vec::new();
    backend.list(&mut listed, "").await.unwrap();
    assert_eq!(listed, items);
}

#[tokio::test]
async fn test_list_ignores_filter() {
    let (_dir, backend) = sqlite_backend().await;
    let (items, _) = units(date());
    for unit in &items {
        backend.insert(unit).await.unwrap();
    }

    let mut listed: Vec<Unit> = Vec::new();
    backend.list(&mut listed, "name = 'unit1'").await.unwrap();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn test_data_survives_reopen() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("facette.db");
    let (items, _) = scales(date());

    {
        let backend = Backend::open("sqlite", db_path.to_str().unwrap())
            .await
            .unwrap();
        backend.insert(&items[0]).await.unwrap();
        backend.close().await.unwrap();
    }

    let backend = Backend::open("sqlite", db_path.to_str().unwrap())
        .await
        .unwrap();
    let mut out = Scale::default();
    backend.get(ID0, &mut out).await.unwrap();
    assert_eq!(out, items[0]);
}
