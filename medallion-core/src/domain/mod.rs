// medallion-core/src/domain/mod.rs

pub mod compiler;
pub mod contract;
pub mod error;
pub mod gate;
pub mod graph;
pub mod pipeline;
pub mod ports;
pub mod project;
pub mod transform;

// Re-exports
pub use contract::ContractTable;
pub use error::DomainError;
pub use gate::{GatePolicy, ValidationReport, Violation};
pub use pipeline::{PipelineState, Stage};
