// medallion-core/src/domain/compiler/mod.rs

pub mod relations;
pub mod statement;

pub use relations::read_relations;
pub use statement::ReplaceStatement;
