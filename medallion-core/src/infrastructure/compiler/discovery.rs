// medallion-core/src/infrastructure/compiler/discovery.rs

use crate::domain::error::DomainError;
use crate::domain::ports::{ManifestLoader, TransformSource};
use crate::domain::project::ProjectConfig;
use crate::domain::project::configuration::is_identifier;
use crate::domain::project::manifest::{
    ColumnInfo, Manifest, ManifestNode, MaterializationType, NodeConfig, TableDeclaration,
};
use crate::domain::transform::TransformUnit;
use crate::infrastructure::config::{ModelSchema, SchemaFile, SourcesFile};
use crate::infrastructure::error::InfrastructureError;

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

const SOURCES_FILE: &str = "sources.yml";

fn re_ref() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\bref\s*\(\s*['"]([^'"]+)['"]\s*\)"#)
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

fn re_source() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\bsource\s*\(\s*['"]([^'"]+)['"]\s*\)"#)
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

/// Names captured by `re` in `sql`, deduplicated and sorted.
fn captures(re: &Regex, sql: &str) -> Vec<String> {
    re.captures_iter(sql)
        .map(|cap| cap[1].to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// `*.sql` files directly or transitively under `dir`, in file-name order.
fn sql_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, InfrastructureError> {
    let mut walker = WalkDir::new(dir).follow_links(true).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }
    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            InfrastructureError::Io(std::io::Error::other(format!(
                "Failed to walk {:?}: {}",
                dir, e
            )))
        })?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

fn file_stem(path: &Path) -> Result<String, InfrastructureError> {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| {
            InfrastructureError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid filename: {:?}", path),
            ))
        })
}

/// Reads the project tree: models, their YAML declarations, the derived-table
/// declarations and the transform units.
pub struct ProjectDiscovery;

impl ManifestLoader for ProjectDiscovery {
    fn load(&self, root: &Path, config: &ProjectConfig) -> Result<Manifest, DomainError> {
        Self::discover(root, config).map_err(|e| DomainError::ManifestError(e.to_string()))
    }
}

impl TransformSource for ProjectDiscovery {
    fn load_units(
        &self,
        root: &Path,
        config: &ProjectConfig,
    ) -> Result<Vec<TransformUnit>, DomainError> {
        Self::discover_units(root, config).map_err(|e| DomainError::ManifestError(e.to_string()))
    }
}

impl ProjectDiscovery {
    #[instrument(skip(config))]
    pub fn discover(
        project_dir: &Path,
        config: &ProjectConfig,
    ) -> Result<Manifest, InfrastructureError> {
        let mut nodes: BTreeMap<String, ManifestNode> = BTreeMap::new();
        let mut tables: BTreeMap<String, TableDeclaration> = BTreeMap::new();

        for model_path in &config.model_paths {
            let models_dir = project_dir.join(model_path);
            if !models_dir.exists() {
                warn!(path = ?models_dir, "Model path does not exist");
                continue;
            }

            for table in Self::load_table_declarations(&models_dir)? {
                if tables.contains_key(&table.name) {
                    return Err(InfrastructureError::ConfigError(format!(
                        "Table '{}' is declared more than once",
                        table.name
                    )));
                }
                tables.insert(table.name.clone(), table);
            }

            info!(path = ?models_dir, "Scanning SQL models");
            for path in sql_files(&models_dir, true)? {
                let node = Self::parse_sql_file(&path, project_dir)?;
                if let Some(previous) = nodes.get(&node.name) {
                    return Err(InfrastructureError::ConfigError(format!(
                        "Model '{}' is defined twice ({:?} and {:?})",
                        node.name, previous.path, node.path
                    )));
                }
                nodes.insert(node.name.clone(), node);
            }
        }

        Ok(Manifest {
            project_name: config.name.clone(),
            nodes,
            tables,
        })
    }

    fn load_table_declarations(
        models_dir: &Path,
    ) -> Result<Vec<TableDeclaration>, InfrastructureError> {
        let path = models_dir.join(SOURCES_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)?;
        let parsed: SourcesFile = serde_yaml::from_str(&content)?;
        debug!(count = parsed.tables.len(), "Derived table declarations loaded");
        Ok(parsed.tables)
    }

    /// The `<model>.yml` next to `<model>.sql`, if it declares that model.
    fn load_model_schema(
        sql_path: &Path,
        model_name: &str,
    ) -> Result<Option<(ModelSchema, PathBuf)>, InfrastructureError> {
        let yaml_path = sql_path.with_extension("yml");
        if !yaml_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&yaml_path)?;
        let parsed: SchemaFile = serde_yaml::from_str(&content)?;
        let found = parsed
            .models
            .into_iter()
            .find(|m| m.model_name == model_name);
        if found.is_none() {
            warn!(path = ?yaml_path, model = model_name, "YAML does not declare its model");
        }
        Ok(found.map(|m| (m, yaml_path)))
    }

    fn parse_sql_file(
        path: &Path,
        project_root: &Path,
    ) -> Result<ManifestNode, InfrastructureError> {
        let raw_sql = fs::read_to_string(path)?;
        let name = file_stem(path)?;
        // The file stem becomes a table name
        if !is_identifier(&name) {
            return Err(InfrastructureError::ConfigError(format!(
                "Model file {:?}: '{}' is not a valid table name (letters, digits, underscores)",
                path, name
            )));
        }
        let rel_path = path
            .strip_prefix(project_root)
            .unwrap_or(path)
            .to_path_buf();

        let refs = captures(re_ref(), &raw_sql);
        let sources = captures(re_source(), &raw_sql);

        let schema_entry = Self::load_model_schema(path, &name)?;
        let schema_def = schema_entry.as_ref().map(|(s, _)| s);
        let schema_path = schema_entry.as_ref().map(|(_, p)| p.clone());

        let materialized = match schema_def.and_then(|s| s.config.materialized.as_deref()) {
            None => MaterializationType::default(),
            Some(m) => match m.to_lowercase().as_str() {
                "table" => MaterializationType::Table,
                "view" => MaterializationType::View,
                other => {
                    return Err(InfrastructureError::ConfigError(format!(
                        "Model '{}': unsupported materialization '{}' (expected table or view)",
                        name, other
                    )));
                }
            },
        };

        let columns = schema_def
            .and_then(|s| s.columns.as_ref())
            .map(|cols| {
                cols.iter()
                    .map(|c| ColumnInfo {
                        name: c.name.clone(),
                        description: c.description.clone(),
                        tests: c.tests.clone().unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(ManifestNode {
            name,
            path: rel_path,
            schema_path,
            raw_sql,
            refs,
            sources,
            config: NodeConfig { materialized },
            grain: schema_def.map(|s| s.grain.clone()).unwrap_or_default(),
            description: schema_def.and_then(|s| s.description.clone()),
            columns,
        })
    }

    #[instrument(skip(config))]
    pub fn discover_units(
        project_dir: &Path,
        config: &ProjectConfig,
    ) -> Result<Vec<TransformUnit>, InfrastructureError> {
        let transform_dir = project_dir.join(&config.transform_path);
        if !transform_dir.exists() {
            warn!(path = ?transform_dir, "Transform path does not exist");
            return Ok(Vec::new());
        }

        let mut units = Vec::new();
        for path in sql_files(&transform_dir, false)? {
            units.push(TransformUnit {
                name: file_stem(&path)?,
                raw_sql: fs::read_to_string(&path)?,
                path,
            });
        }
        info!(count = units.len(), "Transform units discovered");
        Ok(units)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn config() -> ProjectConfig {
        serde_yaml::from_str("name: icu\nversion: \"1.0\"\n").unwrap()
    }

    #[test]
    fn test_discover_models_and_declarations() -> Result<()> {
        let dir = tempdir()?;
        let models = dir.path().join("models");
        fs::create_dir_all(&models)?;
        fs::write(
            models.join("sources.yml"),
            "tables:\n  - name: stg_vitals\n    columns:\n      - { name: value, type: DOUBLE }\n",
        )?;
        fs::write(
            models.join("vitals_wide.sql"),
            "SELECT * FROM {{ source('stg_vitals') }}",
        )?;
        fs::write(
            models.join("vitals_wide.yml"),
            "schema:\n  - model_name: vitals_wide\n    config: { materialized: view }\n    grain: [encounter_id]\n",
        )?;
        fs::write(
            models.join("vitals_enriched.sql"),
            "SELECT * FROM {{ ref(\"vitals_wide\") }} w JOIN {{ ref('vitals_wide') }} v USING (encounter_id)",
        )?;

        let manifest = ProjectDiscovery::discover(dir.path(), &config())?;

        assert_eq!(manifest.project_name, "icu");
        assert_eq!(manifest.tables.len(), 1);

        let wide = &manifest.nodes["vitals_wide"];
        assert_eq!(wide.sources, vec!["stg_vitals".to_string()]);
        assert_eq!(wide.config.materialized, MaterializationType::View);
        assert_eq!(wide.grain, vec!["encounter_id".to_string()]);
        assert!(wide.schema_path.is_some());

        let enriched = &manifest.nodes["vitals_enriched"];
        assert_eq!(enriched.refs, vec!["vitals_wide".to_string()]);
        assert_eq!(enriched.config.materialized, MaterializationType::Table);
        Ok(())
    }

    #[test]
    fn test_unknown_materialization_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let models = dir.path().join("models");
        fs::create_dir_all(&models)?;
        fs::write(models.join("m.sql"), "SELECT 1")?;
        fs::write(
            models.join("m.yml"),
            "schema:\n  - model_name: m\n    config: { materialized: incremental }\n",
        )?;

        let result = ProjectDiscovery.load(dir.path(), &config());
        assert!(matches!(result, Err(DomainError::ManifestError(_))));
        Ok(())
    }

    #[test]
    fn test_model_file_name_must_be_identifier() -> Result<()> {
        let dir = tempdir()?;
        let models = dir.path().join("models");
        fs::create_dir_all(&models)?;
        fs::write(models.join("vitals-wide v2.sql"), "SELECT 1")?;

        let err = ProjectDiscovery.load(dir.path(), &config()).unwrap_err();
        assert!(err.to_string().contains("not a valid table name"));
        Ok(())
    }

    #[test]
    fn test_transform_units_in_lexical_order() -> Result<()> {
        let dir = tempdir()?;
        let transforms = dir.path().join("transforms");
        fs::create_dir_all(transforms.join("drafts"))?;
        fs::write(transforms.join("stg_vitals.sql"), "-- b")?;
        fs::write(transforms.join("stg_encounters.sql"), "-- a")?;
        fs::write(transforms.join("README.md"), "not a unit")?;
        fs::write(transforms.join("drafts").join("old.sql"), "-- ignored")?;

        let units = ProjectDiscovery.load_units(dir.path(), &config())?;
        let names: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["stg_encounters", "stg_vitals"]);
        assert_eq!(units[1].raw_sql, "-- b");
        Ok(())
    }

    #[test]
    fn test_missing_dirs_are_empty() -> Result<()> {
        let dir = tempdir()?;
        let manifest = ProjectDiscovery::discover(dir.path(), &config())?;
        assert!(manifest.nodes.is_empty());
        assert!(ProjectDiscovery.load_units(dir.path(), &config())?.is_empty());
        Ok(())
    }
}
