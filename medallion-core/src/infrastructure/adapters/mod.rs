// medallion-core/src/infrastructure/adapters/mod.rs

pub mod duckdb;
pub mod fhir;

pub use self::duckdb::DuckDBConnector;
pub use self::fhir::FhirFileAdapter;
