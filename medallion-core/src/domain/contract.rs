// medallion-core/src/domain/contract.rs

//! The raw-record contract table: the fixed shape every source adapter must produce
//! and the single upstream of every transform unit.

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONTRACT_TABLE: &str = "raw_resources";

/// `(column, DuckDB type)` in contract order.
pub const RAW_RECORD_COLUMNS: [(&str, &str); 4] = [
    ("resource_type", "VARCHAR"),
    ("resource_id", "VARCHAR"),
    ("resource", "JSON"),
    ("source_file", "VARCHAR"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractTable {
    pub name: String,
}

impl Default for ContractTable {
    fn default() -> Self {
        Self::new(DEFAULT_CONTRACT_TABLE)
    }
}

impl ContractTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn required_columns() -> impl Iterator<Item = &'static str> {
        RAW_RECORD_COLUMNS.iter().map(|(name, _)| *name)
    }

    /// Drop-and-recreate DDL. Ingestion never merges into an existing table.
    pub fn create_or_replace_ddl(&self) -> String {
        let columns = RAW_RECORD_COLUMNS
            .iter()
            .map(|(name, data_type)| format!("{} {}", name, data_type))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE OR REPLACE TABLE \"{}\" ({})", self.name, columns)
    }
}
