// medallion-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum MedallionError {
    // --- DOMAIN (contracts, cycles, upstream declarations) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE (IO, parsing, database) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- APPLICATION ---
    #[error("Internal Error: {0}")]
    InternalError(String),

    #[error("Unsafe path traversal detected: {0}")]
    UnsafePath(String),
}

// Manual implementations keep `?` ergonomic without duplicating enum variants
impl From<std::io::Error> for MedallionError {
    fn from(err: std::io::Error) -> Self {
        MedallionError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<duckdb::Error> for MedallionError {
    fn from(err: duckdb::Error) -> Self {
        MedallionError::Infrastructure(InfrastructureError::from(err))
    }
}
