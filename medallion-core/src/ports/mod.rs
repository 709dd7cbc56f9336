// medallion-core/src/ports/mod.rs

pub mod connector;
pub mod source;

pub use connector::{ColumnSchema, Connector, QueryResult};
pub use source::{SkippedSource, SourceAdapter, SourceFile, SourceScan};
