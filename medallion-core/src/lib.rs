// medallion-core/src/lib.rs

#![allow(missing_docs)]
// Memory safety
#![deny(unsafe_code)]
// Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Contracts with the outside world: the analytical store and the source readers.
pub mod ports;

// 2. Domain
// Contract table, gate policy, transform units, manifest, DAG, pipeline states.
// Depends on nothing else in the crate.
pub mod domain;

// 3. Infrastructure (Adapters)
// DuckDB, FHIR files, config files, Jinja, discovery.
pub mod infrastructure;

// 4. Application (Use Cases)
// Ingest, Gate, Transform, Models, Orchestrator, Lineage.
pub mod application;

// --- ERRORS ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
// use medallion_core::MedallionError;
pub use error::MedallionError;
