// medallion-core/src/infrastructure/compiler/mod.rs

pub mod discovery;
pub mod jinja;

pub use discovery::ProjectDiscovery;
pub use jinja::JinjaRenderer;
