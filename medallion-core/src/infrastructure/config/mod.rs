// medallion-core/src/infrastructure/config/mod.rs

pub mod project;
pub mod schema;

pub use crate::domain::project::ProjectConfig;
pub use project::load_project_config;
pub use schema::{ColumnSchema, ModelSchema, SchemaFile, SourcesFile};
