// medallion-core/src/application/validation.rs

use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::domain::error::DomainError;
use crate::domain::project::manifest::ManifestNode;
use crate::error::MedallionError;
use crate::ports::connector::Connector;

/// Runs the column tests declared for a freshly built model.
/// Returns the columns the model produces but its YAML does not document.
pub async fn run_tests(
    node: &ManifestNode,
    connector: &dyn Connector,
) -> Result<BTreeSet<String>, MedallionError> {
    let undocumented_columns = detect_drift(node, connector).await?;

    for col in &node.columns {
        for test in &col.tests {
            let failing_rows = match test.as_str() {
                "not_null" => count_nulls(&node.name, &col.name, connector).await?,
                "unique" => count_duplicates(&node.name, &col.name, connector).await?,
                _ => {
                    warn!("⚠️ Unknown test type '{}' on {}.{} (skipping)", test, node.name, col.name);
                    continue;
                }
            };

            if failing_rows > 0 {
                return Err(DomainError::DataTestFailed {
                    model: node.name.clone(),
                    column: col.name.clone(),
                    test: test.clone(),
                    failing_rows,
                }
                .into());
            }
            info!("      ✅ PASS: {} on {}.{}", test, node.name, col.name);
        }
    }

    Ok(undocumented_columns)
}

async fn detect_drift(
    node: &ManifestNode,
    connector: &dyn Connector,
) -> Result<BTreeSet<String>, MedallionError> {
    // Undocumented models have nothing to drift from
    if node.columns.is_empty() {
        return Ok(BTreeSet::new());
    }

    let actual_columns: BTreeSet<String> = connector
        .fetch_columns(&node.name)
        .await?
        .into_iter()
        .map(|c| c.name.to_lowercase())
        .collect();

    let expected_columns: BTreeSet<String> =
        node.columns.iter().map(|c| c.name.to_lowercase()).collect();

    let undocumented_columns: BTreeSet<String> = actual_columns
        .difference(&expected_columns)
        .cloned()
        .collect();

    if !undocumented_columns.is_empty() {
        warn!(
            "    ⚠️  Undocumented columns detected in {}: {:?}",
            node.name, undocumented_columns
        );
    }

    Ok(undocumented_columns)
}

async fn count_nulls(
    table: &str,
    column: &str,
    connector: &dyn Connector,
) -> Result<u64, MedallionError> {
    connector
        .query_scalar(&format!(
            "SELECT count(*) FROM \"{}\" WHERE \"{}\" IS NULL",
            table, column
        ))
        .await
}

async fn count_duplicates(
    table: &str,
    column: &str,
    connector: &dyn Connector,
) -> Result<u64, MedallionError> {
    connector
        .query_scalar(&format!(
            "SELECT count(*) FROM (SELECT \"{c}\" FROM \"{t}\" WHERE \"{c}\" IS NOT NULL \
             GROUP BY \"{c}\" HAVING count(*) > 1)",
            c = column,
            t = table
        ))
        .await
}
