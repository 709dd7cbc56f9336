// medallion-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB store error: {0}")]
    #[diagnostic(
        code(medallion::store::duckdb),
        help("The statement failed inside DuckDB. Run `medallion query` against the store to reproduce it.")
    )]
    DuckDB(#[from] duckdb::Error),

    #[error("DuckDB connection lock poisoned by an earlier panic")]
    #[diagnostic(code(medallion::store::poisoned))]
    Poisoned,
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    #[error("Filesystem error: {0}")]
    #[diagnostic(
        code(medallion::fs),
        help("Make sure the data, transforms, models and target paths are readable and writable.")
    )]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    #[diagnostic(
        code(medallion::yaml),
        help("medallion.yaml and the model .yml files must be valid YAML.")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid project configuration: {0}")]
    #[diagnostic(code(medallion::config))]
    ConfigError(String),

    #[error("No medallion.yaml found at '{0}'")]
    #[diagnostic(
        code(medallion::config::missing),
        help("Pass --project-dir or set MEDALLION_PROJECT_DIR to the project root.")
    )]
    ConfigNotFound(String),

    #[error("Failed to render SQL template: {0}")]
    #[diagnostic(
        code(medallion::template),
        help("Templates only see project_name, contract_table, tracked_codes, source() and ref().")
    )]
    TemplateError(#[from] minijinja::Error),
}

impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Database(DatabaseError::DuckDB(err))
    }
}

// Config loaders attach context through anyhow
impl From<anyhow::Error> for InfrastructureError {
    fn from(err: anyhow::Error) -> Self {
        InfrastructureError::ConfigError(format!("{:#}", err))
    }
}
