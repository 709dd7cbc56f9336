// medallion-core/src/infrastructure/adapters/fhir.rs

//! FHIR file reader. `.ndjson` files hold one resource per line, `.json` files
//! hold a Bundle (or a single resource). DuckDB parses both; rows land in the
//! contract table untouched apart from the type/id projection.

use async_trait::async_trait;
use regex::Regex;
use std::path::{Component, Path};
use std::sync::OnceLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::contract::ContractTable;
use crate::error::MedallionError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::connector::Connector;
use crate::ports::source::{SkippedSource, SourceAdapter, SourceFile, SourceScan};

fn re_safe_component() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$")
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

const EXTENSIONS: [&str; 2] = ["ndjson", "json"];

pub struct FhirFileAdapter;

impl FhirFileAdapter {
    /// Relative name of `path` under `root`, if every component is on the allow-list.
    fn safe_name(root: &Path, path: &Path) -> Result<String, String> {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let mut parts = Vec::new();
        for component in relative.components() {
            let Component::Normal(part) = component else {
                return Err("path leaves the data directory".to_string());
            };
            let part = part
                .to_str()
                .ok_or_else(|| "file name is not valid UTF-8".to_string())?;
            if !re_safe_component().is_match(part) {
                return Err(format!(
                    "'{}' does not match the allowed file name pattern",
                    part
                ));
            }
            parts.push(part);
        }
        Ok(parts.join("/"))
    }

    fn insert_sql(contract: &ContractTable, file: &SourceFile) -> Result<String, MedallionError> {
        let path = file.path.to_str().ok_or_else(|| {
            MedallionError::UnsafePath(format!("{:?} is not valid UTF-8", file.path))
        })?;
        let path = escape_literal(path);
        let name = escape_literal(&file.name);

        let records = if file.path.extension().is_some_and(|ext| ext == "ndjson") {
            format!("SELECT json AS resource FROM read_ndjson_objects('{}')", path)
        } else {
            // A Bundle contributes its entries; any other document is itself a resource.
            format!(
                "SELECT unnest(CASE WHEN json_extract_string(json, '$.resourceType') = 'Bundle' \
                 THEN json_extract(json, '$.entry[*].resource') ELSE [json] END) AS resource \
                 FROM read_json_objects('{}')",
                path
            )
        };

        Ok(format!(
            "INSERT INTO \"{table}\" \
             SELECT json_extract_string(resource, '$.resourceType') AS resource_type, \
             json_extract_string(resource, '$.id') AS resource_id, \
             resource, \
             '{name}' AS source_file \
             FROM ({records})",
            table = contract.name,
            name = name,
            records = records,
        ))
    }
}

fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

#[async_trait]
impl SourceAdapter for FhirFileAdapter {
    fn format_name(&self) -> &str {
        "fhir"
    }

    fn discover(&self, data_dir: &Path) -> Result<SourceScan, MedallionError> {
        let mut scan = SourceScan::default();
        if !data_dir.exists() {
            warn!(path = ?data_dir, "Data directory does not exist");
            return Ok(scan);
        }

        let walker = WalkDir::new(data_dir).sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|e| {
                InfrastructureError::Io(std::io::Error::other(format!(
                    "Failed to walk {:?}: {}",
                    data_dir, e
                )))
            })?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || !path
                    .extension()
                    .is_some_and(|ext| EXTENSIONS.iter().any(|e| ext == *e))
            {
                continue;
            }

            match Self::safe_name(data_dir, path) {
                Ok(name) => {
                    debug!(file = %name, "Source file accepted");
                    scan.files.push(SourceFile {
                        path: path.to_path_buf(),
                        name,
                    });
                }
                Err(reason) => {
                    let name = path
                        .strip_prefix(data_dir)
                        .unwrap_or(path)
                        .to_string_lossy()
                        .to_string();
                    warn!(file = %name, %reason, "Skipping source file");
                    scan.skipped.push(SkippedSource { name, reason });
                }
            }
        }

        Ok(scan)
    }

    async fn load_file(
        &self,
        connector: &dyn Connector,
        contract: &ContractTable,
        file: &SourceFile,
    ) -> Result<(), MedallionError> {
        let sql = Self::insert_sql(contract, file)?;
        connector.execute(&sql).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::DuckDBConnector;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    const PATIENT: &str = r#"{"resourceType":"Patient","id":"p1"}"#;

    #[test]
    fn test_discover_sorts_and_skips_unsafe_names() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("b_obs.ndjson"), PATIENT)?;
        fs::write(dir.path().join("a_bundle.json"), "{}")?;
        fs::write(dir.path().join("bad name.ndjson"), PATIENT)?;
        fs::write(dir.path().join("x';DROP.ndjson"), PATIENT)?;
        fs::write(dir.path().join("notes.txt"), "ignored")?;
        fs::create_dir(dir.path().join("site1"))?;
        fs::write(dir.path().join("site1").join("c.ndjson"), PATIENT)?;

        let scan = FhirFileAdapter.discover(dir.path())?;
        let names: Vec<_> = scan.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a_bundle.json", "b_obs.ndjson", "site1/c.ndjson"]);

        let skipped: Vec<_> = scan.skipped.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(skipped, vec!["bad name.ndjson", "x';DROP.ndjson"]);
        Ok(())
    }

    #[test]
    fn test_missing_data_dir_is_empty_scan() -> Result<()> {
        let dir = tempdir()?;
        let scan = FhirFileAdapter.discover(&dir.path().join("nope"))?;
        assert!(scan.files.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_load_ndjson_and_bundle() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("patients.ndjson"),
            format!("{}\n{}\n", PATIENT, r#"{"resourceType":"Patient","id":"p2"}"#),
        )?;
        fs::write(
            dir.path().join("bundle.json"),
            r#"{"resourceType":"Bundle","type":"collection","entry":[
                {"resource":{"resourceType":"Encounter","id":"e1"}},
                {"resource":{"resourceType":"Observation","id":"o1"}}
            ]}"#,
        )?;

        let connector = DuckDBConnector::new(":memory:")?;
        let contract = ContractTable::default();
        connector.execute(&contract.create_or_replace_ddl()).await?;

        let adapter = FhirFileAdapter;
        let scan = adapter.discover(dir.path())?;
        for file in &scan.files {
            adapter.load_file(&connector, &contract, file).await?;
        }

        assert_eq!(
            connector
                .query_scalar("SELECT count(*) FROM raw_resources")
                .await?,
            4
        );
        let rows = connector
            .fetch_rows(
                "SELECT resource_type, resource_id, source_file FROM raw_resources \
                 WHERE resource_type = 'Observation'",
            )
            .await?;
        assert_eq!(
            rows.rows,
            vec![vec![
                "Observation".to_string(),
                "o1".to_string(),
                "bundle.json".to_string()
            ]]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_load_malformed_file_errors() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("broken.ndjson"), "{not json\n")?;

        let connector = DuckDBConnector::new(":memory:")?;
        let contract = ContractTable::default();
        connector.execute(&contract.create_or_replace_ddl()).await?;

        let scan = FhirFileAdapter.discover(dir.path())?;
        let result = FhirFileAdapter
            .load_file(&connector, &contract, &scan.files[0])
            .await;
        assert!(result.is_err());
        Ok(())
    }
}
