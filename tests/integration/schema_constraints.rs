//! Constraints declared by the schema
//!
//! These tests verify:
//! - Graphs are either standalone or links to a template, never both
//! - Deleting a template graph cascades to the graphs linking to it
//! - Names are unique per table

use assert_matches::assert_matches;
use facette_backend::storage::{Collection, Graph, Item, SeriesGroup, StorageError, Unit};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::helpers::*;

const ID2: &str = "00000000-0000-0000-0000-000000000002";

fn template_and_link() -> (Graph, Graph) {
    let date = date();
    let template = Graph {
        item: item(ID0, "template1", "A template graph", date),
        series: vec![SeriesGroup {
            series: vec![series("series1", "{{ .metric }}")],
            operator: 0,
        }],
        template: true,
        ..Default::default()
    };
    let linked = Graph {
        item: item(ID1, "linked1", "A graph instantiating a template", date),
        link: ID0.to_string(),
        attributes: object(json!({ "metric": "metric1" })),
        ..Default::default()
    };
    (template, linked)
}

#[tokio::test]
async fn test_linked_graph_roundtrip() {
    let (_dir, backend) = sqlite_backend().await;
    let (template, linked) = template_and_link();

    backend.insert(&template).await.unwrap();
    backend.insert(&linked).await.unwrap();

    let mut out = Graph::default();
    backend.get(ID1, &mut out).await.unwrap();
    assert_eq!(out, linked);

    let mut out = Graph::default();
    backend.get(ID0, &mut out).await.unwrap();
    assert!(out.template);
    assert_eq!(out, template);
}

#[tokio::test]
async fn test_graph_cannot_mix_series_and_link() {
    let (_dir, backend) = sqlite_backend().await;
    let (template, mut linked) = template_and_link();
    backend.insert(&template).await.unwrap();

    linked.series = template.series.clone();
    assert_matches!(
        backend.insert(&linked).await,
        Err(StorageError::QueryFailed(_))
    );
}

#[tokio::test]
async fn test_linked_graph_requires_existing_template() {
    let (_dir, backend) = sqlite_backend().await;
    let (_, mut linked) = template_and_link();
    linked.link = ID2.to_string();

    assert_matches!(
        backend.insert(&linked).await,
        Err(StorageError::QueryFailed(_))
    );
}

#[tokio::test]
async fn test_deleting_template_cascades_to_links() {
    let (_dir, backend) = sqlite_backend().await;
    let (template, linked) = template_and_link();
    backend.insert(&template).await.unwrap();
    backend.insert(&linked).await.unwrap();

    backend.delete(&template).await.unwrap();

    let mut listed: Vec<Graph> = Vec::new();
    backend.list(&mut listed, "").await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_names_are_unique() {
    let (_dir, backend) = sqlite_backend().await;
    let (items, _) = units(date());
    backend.insert(&items[0]).await.unwrap();

    let mut duplicate = items[1].clone();
    duplicate.item.name = items[0].item.name.clone();
    assert_matches!(
        backend.insert(&duplicate).await,
        Err(StorageError::QueryFailed(_))
    );
}

#[tokio::test]
async fn test_storage_defaults_apply_to_omitted_timestamps() {
    let (_dir, backend) = sqlite_backend().await;
    let collection = Collection {
        item: Item {
            id: ID2.to_string(),
            name: "collection1".to_string(),
            ..Default::default()
        },
    };
    backend.insert(&collection).await.unwrap();

    let mut out = Collection::default();
    backend.get(ID2, &mut out).await.unwrap();
    assert_eq!(out.item.name, "collection1");
    assert!(out.item.created > chrono::DateTime::<chrono::Utc>::default());
    assert_eq!(out.item.created, out.item.modified);
}

#[tokio::test]
async fn test_delete_missing_row_is_not_an_error() {
    let (_dir, backend) = sqlite_backend().await;
    let (items, _) = units(date());

    backend.delete(&items[0]).await.unwrap();

    let mut listed: Vec<Unit> = Vec::new();
    backend.list(&mut listed, "").await.unwrap();
    assert!(listed.is_empty());
}
