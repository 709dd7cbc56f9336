// medallion-core/src/ports/source.rs

// A source adapter reads one family of files and writes rows shaped like the
// contract table. Which format it reads is its own business.

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::domain::contract::ContractTable;
use crate::error::MedallionError;
use crate::ports::connector::Connector;

/// A file accepted for loading.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the data directory, recorded in `source_file`.
    pub name: String,
}

/// A file that was found but refused before reaching the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSource {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceScan {
    pub files: Vec<SourceFile>,
    pub skipped: Vec<SkippedSource>,
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn format_name(&self) -> &str;

    /// Lists loadable files under `data_dir`, in a stable order.
    fn discover(&self, data_dir: &Path) -> Result<SourceScan, MedallionError>;

    /// Appends the records of `file` to the (already recreated) contract table.
    async fn load_file(
        &self,
        connector: &dyn Connector,
        contract: &ContractTable,
        file: &SourceFile,
    ) -> Result<(), MedallionError>;
}
