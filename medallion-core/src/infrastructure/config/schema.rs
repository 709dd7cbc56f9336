// medallion-core/src/infrastructure/config/schema.rs

//! YAML shapes of the declaration files that live next to the models.

use serde::{Deserialize, Serialize};

use crate::domain::project::TableDeclaration;

/// `<model>.yml`
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SchemaFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(rename = "schema", default)]
    pub models: Vec<ModelSchema>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelSchema {
    pub model_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub config: ModelConfig,

    #[serde(default)]
    pub grain: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ColumnSchema>>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ModelConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materialized: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<Vec<String>>,
}

/// `sources.yml`: the derived tables models may read through `source()`.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SourcesFile {
    #[serde(default)]
    pub tables: Vec<TableDeclaration>,
}
