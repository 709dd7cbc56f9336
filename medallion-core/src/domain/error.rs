// medallion-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Circular dependency detected involving: {0}")]
    #[diagnostic(code(medallion::domain::cycle), help("Check your {{ ref() }} macros."))]
    CircularDependency(String),

    #[error("Model '{model}' references undeclared upstream '{upstream}'")]
    #[diagnostic(
        code(medallion::domain::undeclared_upstream),
        help("Read derived tables through {{ source() }} (declared in sources.yml) and models through {{ ref() }}.")
    )]
    UndeclaredUpstream { model: String, upstream: String },

    #[error("Model '{model}' is not valid SQL: {reason}")]
    #[diagnostic(code(medallion::domain::model_sql))]
    ModelSql { model: String, reason: String },

    #[error("Schema mismatch on '{table}': {detail}")]
    #[diagnostic(
        code(medallion::domain::schema_mismatch),
        help("The declared columns must match the table produced by the transform stage.")
    )]
    SchemaMismatch { table: String, detail: String },

    #[error("Transform unit '{unit}' rejected: {reason}")]
    #[diagnostic(
        code(medallion::domain::transform_contract),
        help("Each unit must be a single `CREATE OR REPLACE TABLE <name> AS SELECT ...`.")
    )]
    TransformContract { unit: String, reason: String },

    #[error("Transform unit '{unit}' reads '{upstream}', which is not the contract table")]
    #[diagnostic(
        code(medallion::domain::transform_dependency),
        help("Transform units may only read from the contract table.")
    )]
    TransformDependency { unit: String, upstream: String },

    #[error("Data test '{test}' failed on {model}.{column}: {failing_rows} failing row(s)")]
    #[diagnostic(code(medallion::domain::data_test))]
    DataTestFailed {
        model: String,
        column: String,
        test: String,
        failing_rows: u64,
    },

    #[error("Manifest loading Error: {0}")]
    #[diagnostic(code(medallion::domain::manifest))]
    ManifestError(String),
}
