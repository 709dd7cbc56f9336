// medallion-core/src/application/testing.rs

// Recording connector shared by the use-case unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::MedallionError;
use crate::ports::connector::{ColumnSchema, Connector, QueryResult};

#[derive(Clone, Default)]
pub struct MockConnector {
    pub executed_queries: Arc<Mutex<Vec<String>>>,
    pub columns: HashMap<String, Vec<ColumnSchema>>,
    /// `(query fragment, value)`: the first fragment found in a scalar query wins.
    pub scalars: Vec<(String, u64)>,
    /// Any executed query containing this fragment fails.
    pub fail_on: Option<String>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: &str, columns: &[(&str, &str)]) -> Self {
        self.columns.insert(
            table.to_string(),
            columns
                .iter()
                .map(|(name, data_type)| ColumnSchema {
                    name: name.to_string(),
                    data_type: data_type.to_string(),
                    is_nullable: true,
                })
                .collect(),
        );
        self
    }

    pub fn with_scalar(mut self, fragment: &str, value: u64) -> Self {
        self.scalars.push((fragment.to_string(), value));
        self
    }

    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.fail_on = Some(fragment.to_string());
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.executed_queries
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn execute(&self, query: &str) -> Result<(), MedallionError> {
        if let Ok(mut queries) = self.executed_queries.lock() {
            queries.push(query.to_string());
        }
        match &self.fail_on {
            Some(fragment) if query.contains(fragment.as_str()) => Err(
                MedallionError::InternalError(format!("mock failure on: {}", query)),
            ),
            _ => Ok(()),
        }
    }

    async fn fetch_columns(&self, table_name: &str) -> Result<Vec<ColumnSchema>, MedallionError> {
        Ok(self.columns.get(table_name).cloned().unwrap_or_default())
    }

    async fn table_exists(&self, table_name: &str) -> Result<bool, MedallionError> {
        Ok(self.columns.contains_key(table_name))
    }

    async fn query_scalar(&self, query: &str) -> Result<u64, MedallionError> {
        Ok(self
            .scalars
            .iter()
            .find(|(fragment, _)| query.contains(fragment.as_str()))
            .map(|(_, value)| *value)
            .unwrap_or(0))
    }

    async fn fetch_rows(&self, _query: &str) -> Result<QueryResult, MedallionError> {
        Ok(QueryResult::default())
    }

    fn engine_name(&self) -> &str {
        "mock"
    }
}
