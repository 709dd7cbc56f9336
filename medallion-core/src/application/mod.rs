// medallion-core/src/application/mod.rs

pub mod clean;
pub mod engine;
pub mod gate;
pub mod ingest;
pub mod lineage;
pub mod materialization;
pub mod model_builder;
pub mod pipeline;
pub mod ports;
pub mod transaction;
pub mod transform;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

// --- RE-EXPORTS (FACADE PATTERN) ---
// `use medallion_core::application::{run_pipeline, clean_project, LineageAnalyzer};`

pub use clean::clean_project;
pub use engine::{execute_query, inspect_table};
pub use gate::validate_contract;
pub use ingest::{IngestSummary, ingest};
pub use lineage::{LineageAnalyzer, LineageReport};
pub use materialization::Materializer;
pub use model_builder::{ModelOutcome, build_models};
pub use pipeline::{PipelineContext, RunReport, StageOutcome, StageStatus, run_pipeline};
pub use transform::apply_transforms;
pub use validation::run_tests;
