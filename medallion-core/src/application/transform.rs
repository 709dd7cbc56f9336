// medallion-core/src/application/transform.rs

use serde_json::json;
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::application::ports::TemplateEngine;
use crate::application::transaction;
use crate::domain::project::ProjectConfig;
use crate::domain::transform::{CompiledUnit, TransformPlan, TransformUnit};
use crate::error::MedallionError;
use crate::infrastructure::fs::write_artifact;
use crate::ports::connector::Connector;

/// Variables visible to every transform unit and model template.
pub fn template_context(config: &ProjectConfig) -> serde_json::Value {
    json!({
        "project_name": config.name,
        "contract_table": config.contract_table,
        "tracked_codes": config.tracked_codes,
    })
}

/// Renders and checks every unit before anything touches the store.
pub fn compile_units(
    units: &[TransformUnit],
    renderer: &dyn TemplateEngine,
    context: &serde_json::Value,
    contract_table: &str,
) -> Result<TransformPlan, MedallionError> {
    let mut compiled = Vec::with_capacity(units.len());
    for unit in units {
        let sql = renderer.render(&unit.raw_sql, context)?;
        compiled.push(CompiledUnit::compile(&unit.name, sql)?);
    }
    Ok(TransformPlan::new(compiled, contract_table)?)
}

/// Applies the flattening units in lexical order, all or nothing.
/// `compiled_dir` receives the rendered SQL of each unit.
#[instrument(skip_all, fields(units = units.len()))]
pub async fn apply_transforms(
    connector: &dyn Connector,
    renderer: &dyn TemplateEngine,
    units: &[TransformUnit],
    config: &ProjectConfig,
    compiled_dir: Option<&Path>,
) -> Result<TransformPlan, MedallionError> {
    let context = template_context(config);
    let plan = compile_units(units, renderer, &context, &config.contract_table)?;

    if plan.is_empty() {
        warn!("No transform units found");
        return Ok(plan);
    }

    if let Some(dir) = compiled_dir {
        for unit in plan.units() {
            write_artifact(dir.join(format!("{}.sql", unit.name)), &unit.sql)?;
        }
    }

    transaction::begin(connector).await?;
    let applied = async {
        for unit in plan.units() {
            connector.execute(&unit.sql).await.map_err(|e| {
                MedallionError::InternalError(format!(
                    "Transform unit '{}' failed: {}",
                    unit.name, e
                ))
            })?;
            info!(unit = %unit.name, target = %unit.target, "🔧 Applied");
        }
        Ok::<_, MedallionError>(())
    }
    .await;
    transaction::finish(connector, applied).await?;

    Ok(plan)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::testing::MockConnector;
    use crate::domain::error::DomainError;
    use crate::infrastructure::compiler::JinjaRenderer;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn config() -> ProjectConfig {
        serde_yaml::from_str("name: icu\nversion: \"1.0\"\n").unwrap()
    }

    fn unit(name: &str, sql: &str) -> TransformUnit {
        TransformUnit {
            name: name.to_string(),
            path: PathBuf::from(format!("transforms/{}.sql", name)),
            raw_sql: sql.to_string(),
        }
    }

    #[tokio::test]
    async fn test_units_rendered_and_applied_in_one_transaction() {
        let connector = MockConnector::new();
        let dir = tempdir().unwrap();
        let units = vec![
            unit(
                "stg_vitals",
                "CREATE OR REPLACE TABLE stg_vitals AS SELECT * FROM {{ contract_table }} \
                 WHERE code IN ({{ tracked_codes | map(attribute='code') | sql_list }})",
            ),
            unit(
                "stg_encounters",
                "CREATE OR REPLACE TABLE stg_encounters AS SELECT * FROM {{ contract_table }}",
            ),
        ];

        let plan = apply_transforms(
            &connector,
            &JinjaRenderer::new(),
            &units,
            &config(),
            Some(dir.path()),
        )
        .await
        .unwrap();

        assert_eq!(plan.targets(), vec!["stg_encounters", "stg_vitals"]);
        let queries = connector.queries();
        assert_eq!(queries[0], "BEGIN TRANSACTION");
        assert!(queries[1].contains("stg_encounters"));
        assert!(queries[2].contains("'8867-4', '9279-1'"));
        assert_eq!(queries[3], "COMMIT");

        let compiled = std::fs::read_to_string(dir.path().join("stg_vitals.sql")).unwrap();
        assert!(compiled.contains("FROM raw_resources"));
    }

    #[tokio::test]
    async fn test_failing_unit_rolls_back_whole_stage() {
        let connector = MockConnector::new().failing_on("stg_vitals");
        let units = vec![
            unit("a_enc", "CREATE OR REPLACE TABLE stg_encounters AS SELECT 1 AS x"),
            unit("b_vitals", "CREATE OR REPLACE TABLE stg_vitals AS SELECT 1 AS x"),
        ];

        let result =
            apply_transforms(&connector, &JinjaRenderer::new(), &units, &config(), None).await;

        assert!(result.is_err());
        assert_eq!(connector.queries().last().unwrap(), "ROLLBACK");
    }

    #[tokio::test]
    async fn test_invalid_unit_never_reaches_store() {
        let connector = MockConnector::new();
        let units = vec![unit("bad", "DROP TABLE raw_resources")];

        let result =
            apply_transforms(&connector, &JinjaRenderer::new(), &units, &config(), None).await;

        assert!(matches!(
            result,
            Err(MedallionError::Domain(DomainError::TransformContract { .. }))
        ));
        assert!(connector.queries().is_empty());
    }
}
