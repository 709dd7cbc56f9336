// medallion-core/src/ports/connector.rs

// What the pipeline needs from the analytical store, without knowing which engine
// provides it. Every stage receives the connector explicitly: the store is never
// reached through ambient global state.

use crate::error::MedallionError;
use async_trait::async_trait;

/// Engine-independent description of a column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

/// Rows of an ad-hoc query, rendered as display strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn execute(&self, query: &str) -> Result<(), MedallionError>;

    /// Columns of `table_name` in declaration order. Empty if the table does not exist.
    async fn fetch_columns(&self, table_name: &str) -> Result<Vec<ColumnSchema>, MedallionError>;

    async fn table_exists(&self, table_name: &str) -> Result<bool, MedallionError>;

    /// First column of the first row, as an unsigned count.
    async fn query_scalar(&self, query: &str) -> Result<u64, MedallionError>;

    async fn fetch_rows(&self, query: &str) -> Result<QueryResult, MedallionError>;

    fn engine_name(&self) -> &str;
}
