// medallion-core/src/application/model_builder.rs

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, instrument};

use crate::application::materialization::Materializer;
use crate::application::ports::TemplateEngine;
use crate::application::validation;
use crate::domain::compiler::read_relations;
use crate::domain::error::DomainError;
use crate::domain::graph::GraphSolver;
use crate::domain::project::{Manifest, ManifestNode, MaterializationType, TableDeclaration};
use crate::error::MedallionError;
use crate::infrastructure::fs::write_artifact;
use crate::ports::connector::Connector;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelOutcome {
    pub name: String,
    pub materialized: String,
    /// Row count after the rebuild. Not computed for views.
    pub row_count: Option<u64>,
    pub undocumented_columns: Vec<String>,
}

/// Every model reads only declared tables and known models.
pub fn check_upstreams(manifest: &Manifest) -> Result<(), DomainError> {
    for (name, node) in &manifest.nodes {
        if let Some(table) = node.sources.iter().find(|s| !manifest.tables.contains_key(*s)) {
            return Err(DomainError::UndeclaredUpstream {
                model: name.clone(),
                upstream: table.clone(),
            });
        }
        if let Some(model) = node.refs.iter().find(|r| !manifest.nodes.contains_key(*r)) {
            return Err(DomainError::UndeclaredUpstream {
                model: name.clone(),
                upstream: model.clone(),
            });
        }
    }
    Ok(())
}

/// The rendered SQL of `node` reads nothing but what it declared through
/// `source()` and `ref()`. A table named directly has no edge in the plan and no
/// schema check, so it is refused.
pub fn check_model_relations(node: &ManifestNode, sql: &str) -> Result<(), DomainError> {
    let reads = read_relations(sql).map_err(|e| DomainError::ModelSql {
        model: node.name.clone(),
        reason: e.to_string(),
    })?;

    let declared = |table: &String| {
        node.sources
            .iter()
            .chain(node.refs.iter())
            .any(|upstream| upstream.eq_ignore_ascii_case(table))
    };
    match reads.iter().find(|table| !declared(table)) {
        Some(table) => Err(DomainError::UndeclaredUpstream {
            model: node.name.clone(),
            upstream: table.clone(),
        }),
        None => Ok(()),
    }
}

/// The store's version of `declared` must carry exactly the declared columns,
/// with the declared types (case-insensitive).
pub async fn check_declared_schema(
    connector: &dyn Connector,
    declared: &TableDeclaration,
) -> Result<(), MedallionError> {
    let actual: BTreeMap<String, String> = connector
        .fetch_columns(&declared.name)
        .await?
        .into_iter()
        .map(|c| (c.name.to_lowercase(), c.data_type.to_uppercase()))
        .collect();

    let mismatch = |detail: String| DomainError::SchemaMismatch {
        table: declared.name.clone(),
        detail,
    };

    if actual.is_empty() {
        return Err(mismatch("table does not exist".to_string()).into());
    }

    let expected: BTreeMap<String, String> = declared
        .columns
        .iter()
        .map(|c| (c.name.to_lowercase(), c.data_type.to_uppercase()))
        .collect();

    let missing: Vec<&str> = expected
        .keys()
        .filter(|c| !actual.contains_key(*c))
        .map(String::as_str)
        .collect();
    let unexpected: Vec<&str> = actual
        .keys()
        .filter(|c| !expected.contains_key(*c))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(mismatch(format!(
            "missing columns [{}], unexpected columns [{}]",
            missing.join(", "),
            unexpected.join(", ")
        ))
        .into());
    }

    for (column, expected_type) in &expected {
        if let Some(actual_type) = actual.get(column)
            && actual_type != expected_type
        {
            return Err(mismatch(format!(
                "column '{}' is {} but declared {}",
                column, actual_type, expected_type
            ))
            .into());
        }
    }

    Ok(())
}

/// Rebuilds every model in dependency order, one at a time. Stops at the first
/// failure; models built before it keep their new version.
#[instrument(skip_all, fields(models = manifest.nodes.len()))]
pub async fn build_models(
    connector: &dyn Connector,
    renderer: &dyn TemplateEngine,
    manifest: &Manifest,
    context: &serde_json::Value,
    compiled_dir: Option<&Path>,
) -> Result<Vec<ModelOutcome>, MedallionError> {
    // 1. Pre-flight: nothing is built unless the whole plan can run
    check_upstreams(manifest)?;
    let layers = GraphSolver::plan_execution(manifest)?;

    let mut rendered = Vec::with_capacity(manifest.nodes.len());
    for name in layers.iter().flatten() {
        let node = manifest
            .nodes
            .get(name)
            .ok_or_else(|| MedallionError::InternalError(format!("Model '{}' vanished from plan", name)))?;
        let sql = renderer.render(&node.raw_sql, context)?;
        check_model_relations(node, &sql)?;
        rendered.push((node, sql));
    }

    for table in manifest.referenced_tables() {
        check_declared_schema(connector, table).await?;
    }

    info!("📝 Execution Plan: {} models in {} layers", rendered.len(), layers.len());

    // 2. Build
    let mut outcomes = Vec::with_capacity(rendered.len());
    for (node, sql) in rendered {
        if let Some(dir) = compiled_dir {
            write_artifact(dir.join(format!("{}.sql", node.name)), &sql)?;
        }

        let materialized = Materializer::materialize(connector, &node.name, &sql, &node.config).await?;
        let undocumented = validation::run_tests(node, connector).await?;

        let row_count = match node.config.materialized {
            MaterializationType::Table => Some(
                connector
                    .query_scalar(&format!("SELECT count(*) FROM \"{}\"", node.name))
                    .await?,
            ),
            MaterializationType::View => None,
        };

        info!(model = %node.name, rows = ?row_count, "🏗️  Built as {}", materialized);
        outcomes.push(ModelOutcome {
            name: node.name.clone(),
            materialized,
            row_count,
            undocumented_columns: undocumented.into_iter().collect(),
        });
    }

    Ok(outcomes)
}
