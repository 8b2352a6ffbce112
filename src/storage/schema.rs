//! Persisted domain entities
//!
//! Every top-level entity embeds an [`Item`] carrying the identity block
//! shared by all tables. Nested structures (series groups, group entries,
//! attribute and option maps) are stored as JSON text columns.
//!
//! | Entity          | Table          | Specific columns                                  |
//! |-----------------|----------------|---------------------------------------------------|
//! | [`Scale`]       | `scales`       | `value`                                           |
//! | [`Unit`]        | `units`        | `label`                                           |
//! | [`SourceGroup`] | `sourcegroups` | `entries`                                         |
//! | [`MetricGroup`] | `metricgroups` | `entries`                                         |
//! | [`Graph`]       | `graphs`       | `series`, `link`, `attributes`, `options`, `template` |
//! | [`Collection`]  | `collections`  |                                                   |
//!
//! A graph is either standalone (inline `series`, no `link`) or a link to a
//! template graph with `attributes` filling the template's placeholders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Entity;
use crate::persisted;

/// JSON object stored in a text column
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Identity block shared by every entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub modified: DateTime<Utc>,
}

persisted!(Item {
    "id" => id,
    "name" => name,
    "description" => description,
    "created" => created,
    "modified" => modified,
});

/// A graph, either standalone with inline `series` or a link to a template
/// graph with `attributes` filling the template
///
/// The schema rejects a graph setting both on SQLite and PostgreSQL. MySQL
/// cannot combine that check with the cascading `link` foreign key, so there
/// the rule is left to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(flatten)]
    pub item: Item,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub series: Vec<SeriesGroup>,
    /// Identifier of the template graph this graph instantiates
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub link: String,
    #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
    pub attributes: JsonMap,
    #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
    pub options: JsonMap,
    #[serde(default)]
    pub template: bool,
}

persisted!(Graph {
    embed item: Item,
    "series" => series,
    "link" => link,
    "attributes" => attributes,
    "options" => options,
    "template" => template,
});

impl Entity for Graph {
    fn table_name() -> &'static str {
        "graphs"
    }
}

/// Series plotted together, combined by `operator`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesGroup {
    pub series: Vec<Series>,
    pub operator: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub origin: String,
    pub source: String,
    pub metric: String,
}

/// Pattern matching catalog entries of an origin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub pattern: String,
    pub origin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceGroup {
    #[serde(flatten)]
    pub item: Item,
    pub entries: Vec<GroupEntry>,
}

persisted!(SourceGroup {
    embed item: Item,
    "entries" => entries,
});

impl Entity for SourceGroup {
    fn table_name() -> &'static str {
        "sourcegroups"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricGroup {
    #[serde(flatten)]
    pub item: Item,
    pub entries: Vec<GroupEntry>,
}

persisted!(MetricGroup {
    embed item: Item,
    "entries" => entries,
});

impl Entity for MetricGroup {
    fn table_name() -> &'static str {
        "metricgroups"
    }
}

/// Multiplier applied to plotted values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    #[serde(flatten)]
    pub item: Item,
    pub value: f64,
}

persisted!(Scale {
    embed item: Item,
    "value" => value,
});

impl Entity for Scale {
    fn table_name() -> &'static str {
        "scales"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    #[serde(flatten)]
    pub item: Item,
    pub label: String,
}

persisted!(Unit {
    embed item: Item,
    "label" => label,
});

impl Entity for Unit {
    fn table_name() -> &'static str {
        "units"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(flatten)]
    pub item: Item,
}

persisted!(Collection {
    embed item: Item,
});

impl Entity for Collection {
    fn table_name() -> &'static str {
        "collections"
    }
}
