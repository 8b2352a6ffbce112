//! Helper functions for integration tests
#![allow(dead_code)]

use std::fmt::Debug;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use facette_backend::storage::{
    Backend, Entity, Graph, GroupEntry, Item, MetricGroup, Scale, Series, SeriesGroup,
    SourceGroup, StorageError, Unit,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

pub const ID0: &str = "00000000-0000-0000-0000-000000000000";
pub const ID1: &str = "00000000-0000-0000-0000-000000000001";

/// Access to the identity block of a fixture entity
pub trait Fixture: Entity + Clone + PartialEq + Debug {
    fn item(&self) -> &Item;
}

macro_rules! fixture {
    ($($ty:ty),*) => {
        $(
            impl Fixture for $ty {
                fn item(&self) -> &Item {
                    &self.item
                }
            }
        )*
    };
}

fixture!(Graph, SourceGroup, MetricGroup, Scale, Unit);

/// Current time at second precision, which every engine stores exactly
pub fn date() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

pub async fn sqlite_backend() -> (TempDir, Backend) {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("facette.db");
    let backend = Backend::open("sqlite", db_path.to_str().unwrap())
        .await
        .unwrap();
    (temp_dir, backend)
}

pub fn item(id: &str, name: &str, description: &str, date: DateTime<Utc>) -> Item {
    Item {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        created: date,
        modified: date,
    }
}

pub fn series(name: &str, metric: &str) -> Series {
    Series {
        name: name.to_string(),
        origin: "origin1".to_string(),
        source: "source1".to_string(),
        metric: metric.to_string(),
    }
}

pub fn object(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().unwrap_or_default()
}

pub fn graphs(date: DateTime<Utc>) -> (Vec<Graph>, Graph) {
    let graph = |id: &str, name: &str, description: &str, title: &str| Graph {
        item: item(id, name, description, date),
        series: vec![SeriesGroup {
            series: vec![series("series1", "metric1")],
            operator: 0,
        }],
        options: object(json!({ "title": title })),
        ..Default::default()
    };

    let updated = Graph {
        item: Item {
            modified: date + Duration::hours(1),
            ..item(ID0, "graph1", "A great graph description (updated)", date)
        },
        series: vec![SeriesGroup {
            series: vec![series("series1", "metric1"), series("series2", "metric2")],
            operator: 0,
        }],
        options: object(json!({ "title": "A great graph title (updated)" })),
        ..Default::default()
    };

    (
        vec![
            graph(ID0, "graph1", "A great graph description", "A great graph title"),
            graph(
                ID1,
                "graph2",
                "Another great graph description",
                "Another great graph title",
            ),
        ],
        updated,
    )
}

fn entry(pattern: &str, origin: &str) -> GroupEntry {
    GroupEntry {
        pattern: pattern.to_string(),
        origin: origin.to_string(),
    }
}

pub fn source_groups(date: DateTime<Utc>) -> (Vec<SourceGroup>, SourceGroup) {
    (
        vec![
            SourceGroup {
                item: item(ID0, "sourcegroup1", "A great sourcegroup description", date),
                entries: vec![entry("glob:host*.example.net", "origin1")],
            },
            SourceGroup {
                item: item(ID1, "sourcegroup2", "Another great sourcegroup description", date),
                entries: vec![entry("host3.example.net", "origin1")],
            },
        ],
        SourceGroup {
            item: Item {
                modified: date + Duration::hours(1),
                ..item(ID0, "sourcegroup1", "A great sourcegroup description (updated)", date)
            },
            entries: vec![entry("glob:host*.example.net", "")],
        },
    )
}

pub fn metric_groups(date: DateTime<Utc>) -> (Vec<MetricGroup>, MetricGroup) {
    (
        vec![
            MetricGroup {
                item: item(ID0, "metricgroup1", "A great metricgroup description", date),
                entries: vec![entry("glob:metric1.*", "origin1")],
            },
            MetricGroup {
                item: item(ID1, "metricgroup2", "Another great metricgroup description", date),
                entries: vec![entry("metric2", "origin1")],
            },
        ],
        MetricGroup {
            item: Item {
                modified: date + Duration::hours(1),
                ..item(ID0, "metricgroup1", "A great metricgroup description (updated)", date)
            },
            entries: vec![entry("glob:metric1.*", "")],
        },
    )
}

pub fn scales(date: DateTime<Utc>) -> (Vec<Scale>, Scale) {
    (
        vec![
            Scale {
                item: item(ID0, "scale1", "A great scale description", date),
                value: 0.123,
            },
            Scale {
                item: item(ID1, "scale2", "Another great scale description", date),
                value: 0.456,
            },
        ],
        Scale {
            item: Item {
                modified: date + Duration::hours(1),
                ..item(ID0, "scale1", "A great scale description (updated)", date)
            },
            value: 0.1234,
        },
    )
}

pub fn units(date: DateTime<Utc>) -> (Vec<Unit>, Unit) {
    (
        vec![
            Unit {
                item: item(ID0, "unit1", "A great unit description", date),
                label: "a".to_string(),
            },
            Unit {
                item: item(ID1, "unit2", "Another great unit description", date),
                label: "b".to_string(),
            },
        ],
        Unit {
            item: Item {
                modified: date + Duration::hours(1),
                ..item(ID0, "unit1", "A great unit description (updated)", date)
            },
            label: "aa".to_string(),
        },
    )
}

/// Insert, read back, list, update, then delete a set of entities
pub async fn exec_roundtrip<E: Fixture>(backend: &Backend, items: &[E], updated: &E) {
    for entity in items {
        backend.insert(entity).await.unwrap();

        let mut out = E::default();
        backend.get(&entity.item().id, &mut out).await.unwrap();
        assert_eq!(&out, entity);
    }

    let mut listed: Vec<E> = Vec::new();
    backend.list(&mut listed, "").await.unwrap();
    assert_eq!(listed.len(), items.len());
    for (out, entity) in listed.iter().zip(items) {
        assert_eq!(out, entity);
    }

    backend.update(updated).await.unwrap();

    let mut out = E::default();
    backend.get(&updated.item().id, &mut out).await.unwrap();
    assert_eq!(&out, updated);

    for entity in items {
        backend.delete(entity).await.unwrap();

        let mut out = E::default();
        assert!(matches!(
            backend.get(&entity.item().id, &mut out).await,
            Err(StorageError::NotFound { .. })
        ));
    }

    let mut listed: Vec<E> = Vec::new();
    backend.list(&mut listed, "").await.unwrap();
    assert!(listed.is_empty());
}
