// medallion-core/src/domain/project/manifest.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The resolved state of a project's declarative layer: the derived tables the
/// transform stage promises to produce and the models built on top of them.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Manifest {
    pub project_name: String,

    /// Models, keyed by name (sorted, so every plan is reproducible).
    pub nodes: BTreeMap<String, ManifestNode>,

    /// Declared shapes of the transform stage outputs.
    #[serde(default)]
    pub tables: BTreeMap<String, TableDeclaration>,
}

/// The declared shape of a derived table, checked against the store before any
/// model reads it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TableDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub columns: Vec<DeclaredColumn>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DeclaredColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

/// A model: one fully rebuilt table of the declarative layer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ManifestNode {
    pub name: String,
    pub path: PathBuf,
    pub schema_path: Option<PathBuf>, // YAML file declaring this model, if any
    pub raw_sql: String,

    /// Other models, via `{{ ref('...') }}`.
    pub refs: Vec<String>,
    /// Declared derived tables, via `{{ source('...') }}`.
    #[serde(default)]
    pub sources: Vec<String>,

    pub config: NodeConfig,

    /// Columns that identify a row. Documentation contract only.
    #[serde(default)]
    pub grain: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct NodeConfig {
    #[serde(default)]
    pub materialized: MaterializationType,
}

/// Every strategy is a full rebuild: no model is ever updated in place.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaterializationType {
    #[default]
    Table,
    View,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ColumnInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub tests: Vec<String>,
}

impl Manifest {
    /// Names of everything a model reads: derived tables first, then models.
    pub fn upstreams<'a>(&self, node: &'a ManifestNode) -> impl Iterator<Item = &'a String> {
        node.sources.iter().chain(node.refs.iter())
    }

    /// Declared tables that at least one model reads, sorted.
    pub fn referenced_tables(&self) -> Vec<&TableDeclaration> {
        self.tables
            .values()
            .filter(|t| self.nodes.values().any(|n| n.sources.contains(&t.name)))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_deserialization() {
        let json_data = r#"
        {
            "project_name": "icu",
            "nodes": {
                "vitals_wide": {
                    "name": "vitals_wide",
                    "path": "models/vitals_wide.sql",
                    "schema_path": null,
                    "raw_sql": "SELECT 1",
                    "refs": [],
                    "sources": ["stg_vitals"],
                    "config": { "materialized": "table" },
                    "grain": ["encounter_id", "patient_id", "effective_ts"],
                    "columns": [
                        { "name": "encounter_id", "tests": ["not_null"] }
                    ]
                }
            },
            "tables": {
                "stg_vitals": {
                    "name": "stg_vitals",
                    "columns": [ { "name": "value", "type": "DOUBLE" } ]
                }
            }
        }
        "#;

        let manifest: Manifest = serde_json::from_str(json_data).expect("Should deserialize");

        let node = manifest.nodes.get("vitals_wide").expect("Node should exist");
        assert_eq!(node.config.materialized, MaterializationType::Table);
        assert_eq!(node.grain.len(), 3);
        assert_eq!(node.columns[0].tests, vec!["not_null".to_string()]);
        assert_eq!(manifest.tables["stg_vitals"].columns[0].data_type, "DOUBLE");
        assert_eq!(manifest.referenced_tables().len(), 1);
    }

    #[test]
    fn test_default_values() {
        let json_data = r#"{ "project_name": "defaults", "nodes": {} }"#;
        let manifest: Manifest = serde_json::from_str(json_data).unwrap();
        assert!(manifest.tables.is_empty());
    }
}
