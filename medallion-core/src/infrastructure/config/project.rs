// medallion-core/src/infrastructure/config/project.rs

use anyhow::Context;
use serde::{Deserialize, de::DeserializeOwned};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::gate::GatePolicy;
use crate::domain::project::configuration::ProjectConfig;
use crate::infrastructure::error::InfrastructureError;

const CONFIG_CANDIDATES: [&str; 2] = ["medallion_project.yaml", "medallion.yaml"];

#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project configuration");

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read project config at {:?}", config_path))?;
    let mut config: ProjectConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse project config YAML at {:?}", config_path))?;

    // Satellites win over the main file
    if let Some(config_folder) = config.config_paths.first() {
        let config_dir = project_dir.join(config_folder);
        if config_dir.exists() {
            load_satellite_configs(&mut config, &config_dir)?;
        }
    }

    // Environment wins over everything: MEDALLION_TARGET_PATH=/tmp/build medallion run
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    config
        .validate()
        .map_err(|e| InfrastructureError::ConfigError(format!("Invalid project config: {}", e)))?;

    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    for filename in CONFIG_CANDIDATES {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, CONFIG_CANDIDATES
    )))
}

/// Loads a typed configuration fragment. `T` is the wrapper expected in the file.
fn load_fragment<T: DeserializeOwned>(path: &Path) -> Result<T, InfrastructureError> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config fragment at {:?}", path))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse YAML fragment at {:?}", path))
        .map_err(Into::into)
}

fn load_satellite_configs(
    config: &mut ProjectConfig,
    config_dir: &Path,
) -> Result<(), InfrastructureError> {
    let qual_path = config_dir.join("quality.yml");
    if qual_path.exists() {
        #[derive(Deserialize)]
        struct QualityWrapper {
            gate: GatePolicy,
        }

        // A corrupt satellite stops the run rather than silently falling back
        let wrapper: QualityWrapper = load_fragment(&qual_path)?;
        config.gate = wrapper.gate;
        info!("  ✅ Gate policy loaded from {:?}", qual_path);
    }

    Ok(())
}

fn apply_env_overrides<F>(config: &mut ProjectConfig, lookup: F) -> Result<(), InfrastructureError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("MEDALLION_TARGET_PATH") {
        info!(old = ?config.target_path, new = ?val, "Overriding target path via ENV");
        config.target_path = val;
    }
    if let Some(val) = lookup("MEDALLION_DATABASE_PATH") {
        info!(old = ?config.database_path, new = ?val, "Overriding database path via ENV");
        config.database_path = val;
    }
    if let Some(val) = lookup("MEDALLION_NULL_THRESHOLD") {
        let threshold: f64 = val.trim().parse().map_err(|_| {
            InfrastructureError::ConfigError(format!(
                "MEDALLION_NULL_THRESHOLD must be a number, got '{}'",
                val
            ))
        })?;
        info!(
            old = config.gate.null_rate_threshold_pct,
            new = threshold,
            "Overriding null rate threshold via ENV"
        );
        config.gate.null_rate_threshold_pct = threshold;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::collections::HashMap;
    use tempfile::tempdir;

    const MINIMAL: &str = "name: icu\nversion: \"1.0\"\n";

    #[test]
    fn test_missing_config_is_reported() {
        let dir = tempdir().unwrap();
        let result = load_project_config(dir.path());
        assert!(matches!(result, Err(InfrastructureError::ConfigNotFound(_))));
    }

    #[test]
    fn test_quality_satellite_overrides_gate() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("medallion.yaml"), MINIMAL)?;
        fs::create_dir(dir.path().join("config"))?;
        fs::write(
            dir.path().join("config/quality.yml"),
            "gate:\n  null_rate_threshold_pct: 1.0\n  critical_columns: [resource_id]\n",
        )?;

        let config = load_project_config(dir.path())?;
        assert_eq!(config.gate.null_rate_threshold_pct, 1.0);
        assert_eq!(config.gate.critical_columns, vec!["resource_id".to_string()]);
        Ok(())
    }

    #[test]
    fn test_corrupt_satellite_fails() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("medallion.yaml"), MINIMAL)?;
        fs::create_dir(dir.path().join("config"))?;
        fs::write(dir.path().join("config/quality.yml"), "gate: [not, a, map]\n")?;

        assert!(load_project_config(dir.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_out_of_range_threshold_fails_validation() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("medallion.yaml"),
            format!("{}gate:\n  null_rate_threshold_pct: 150\n", MINIMAL),
        )?;
        let result = load_project_config(dir.path());
        assert!(matches!(result, Err(InfrastructureError::ConfigError(_))));
        Ok(())
    }

    #[test]
    fn test_env_overrides() -> Result<()> {
        let mut config: ProjectConfig = serde_yaml::from_str(MINIMAL)?;
        let env: HashMap<&str, &str> = [
            ("MEDALLION_DATABASE_PATH", ":memory:"),
            ("MEDALLION_NULL_THRESHOLD", "2.5"),
        ]
        .into_iter()
        .collect();

        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()))?;
        assert_eq!(config.database_path, ":memory:");
        assert_eq!(config.gate.null_rate_threshold_pct, 2.5);
        assert_eq!(config.target_path, "target");

        let bad = apply_env_overrides(&mut config, |k| {
            (k == "MEDALLION_NULL_THRESHOLD").then(|| "five".to_string())
        });
        assert!(bad.is_err());
        Ok(())
    }
}
