// medallion-core/src/domain/project/mod.rs

pub mod configuration;
pub mod manifest;
pub use configuration::{ProjectConfig, TrackedCode};

pub use manifest::{
    ColumnInfo, DeclaredColumn, Manifest, ManifestNode, MaterializationType, NodeConfig,
    TableDeclaration,
};
