// medallion-core/src/application/ingest.rs

use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::application::transaction;
use crate::domain::contract::ContractTable;
use crate::error::MedallionError;
use crate::ports::connector::Connector;
use crate::ports::source::{SkippedSource, SourceAdapter, SourceScan};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestSummary {
    /// False when nothing was loadable and the existing table was left alone.
    pub replaced: bool,
    pub files_loaded: Vec<String>,
    pub skipped: Vec<SkippedSource>,
    pub row_count: u64,
}

/// Rebuilds the contract table from every loadable file under `data_dir`.
/// All files load inside one transaction: either the new table replaces the old
/// one completely, or the old one survives untouched.
#[instrument(skip(connector, adapter, contract), fields(format = adapter.format_name()))]
pub async fn ingest(
    connector: &dyn Connector,
    adapter: &dyn SourceAdapter,
    contract: &ContractTable,
    data_dir: &Path,
) -> Result<IngestSummary, MedallionError> {
    let SourceScan { files, skipped } = adapter.discover(data_dir)?;
    for s in &skipped {
        warn!(file = %s.name, reason = %s.reason, "⚠️  Source file skipped");
    }

    if files.is_empty() {
        warn!(path = ?data_dir, "No loadable source files; contract table left as is");
        return Ok(IngestSummary {
            replaced: false,
            files_loaded: Vec::new(),
            skipped,
            row_count: 0,
        });
    }

    transaction::begin(connector).await?;
    let loaded = async {
        connector.execute(&contract.create_or_replace_ddl()).await?;
        let mut names = Vec::with_capacity(files.len());
        for file in &files {
            adapter.load_file(connector, contract, file).await?;
            info!(file = %file.name, "📥 Loaded");
            names.push(file.name.clone());
        }
        Ok::<_, MedallionError>(names)
    }
    .await;
    let files_loaded = transaction::finish(connector, loaded).await?;

    let row_count = connector
        .query_scalar(&format!("SELECT count(*) FROM \"{}\"", contract.name))
        .await?;
    info!(rows = row_count, files = files_loaded.len(), "Contract table rebuilt");

    Ok(IngestSummary {
        replaced: true,
        files_loaded,
        skipped,
        row_count,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::testing::MockConnector;
    use crate::ports::source::SourceFile;
    use async_trait::async_trait;
    use std::path::PathBuf;

    struct StaticSource {
        files: Vec<&'static str>,
    }

    #[async_trait]
    impl SourceAdapter for StaticSource {
        fn format_name(&self) -> &str {
            "static"
        }

        fn discover(&self, _data_dir: &Path) -> Result<SourceScan, MedallionError> {
            Ok(SourceScan {
                files: self
                    .files
                    .iter()
                    .map(|name| SourceFile {
                        path: PathBuf::from(name),
                        name: name.to_string(),
                    })
                    .collect(),
                skipped: vec![SkippedSource {
                    name: "bad name.ndjson".into(),
                    reason: "pattern".into(),
                }],
            })
        }

        async fn load_file(
            &self,
            connector: &dyn Connector,
            contract: &ContractTable,
            file: &SourceFile,
        ) -> Result<(), MedallionError> {
            connector
                .execute(&format!("INSERT INTO {} -- {}", contract.name, file.name))
                .await
        }
    }

    #[tokio::test]
    async fn test_ingest_replaces_table_in_one_transaction() {
        let connector = MockConnector::new().with_scalar("count(*)", 150);
        let adapter = StaticSource {
            files: vec!["a.ndjson", "b.ndjson"],
        };

        let summary = ingest(&connector, &adapter, &ContractTable::default(), Path::new("data"))
            .await
            .unwrap();

        assert!(summary.replaced);
        assert_eq!(summary.row_count, 150);
        assert_eq!(summary.skipped.len(), 1);
        let queries = connector.queries();
        assert_eq!(queries.first().unwrap(), "BEGIN TRANSACTION");
        assert!(queries[1].starts_with("CREATE OR REPLACE TABLE \"raw_resources\""));
        assert_eq!(queries.last().unwrap(), "COMMIT");
        assert_eq!(queries.len(), 5);
    }

    #[tokio::test]
    async fn test_failed_file_rolls_back() {
        let connector = MockConnector::new().failing_on("b.ndjson");
        let adapter = StaticSource {
            files: vec!["a.ndjson", "b.ndjson", "c.ndjson"],
        };

        let result =
            ingest(&connector, &adapter, &ContractTable::default(), Path::new("data")).await;

        assert!(result.is_err());
        let queries = connector.queries();
        assert_eq!(queries.last().unwrap(), "ROLLBACK");
        assert!(!queries.iter().any(|q| q.contains("c.ndjson")));
    }

    #[tokio::test]
    async fn test_nothing_to_load_is_a_noop() {
        let connector = MockConnector::new();
        let adapter = StaticSource { files: vec![] };

        let summary = ingest(&connector, &adapter, &ContractTable::default(), Path::new("data"))
            .await
            .unwrap();

        assert!(!summary.replaced);
        assert!(connector.queries().is_empty());
    }
}
