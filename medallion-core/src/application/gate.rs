// medallion-core/src/application/gate.rs

use tracing::{info, instrument, warn};

use crate::domain::contract::ContractTable;
use crate::domain::gate::{ContractProfile, GatePolicy, ValidationReport};
use crate::error::MedallionError;
use crate::ports::connector::Connector;

/// Reads what the gate needs from the store. Never writes.
pub async fn profile_contract(
    connector: &dyn Connector,
    contract: &ContractTable,
    policy: &GatePolicy,
) -> Result<ContractProfile, MedallionError> {
    let columns: Vec<String> = connector
        .fetch_columns(&contract.name)
        .await?
        .into_iter()
        .map(|c| c.name.to_lowercase())
        .collect();

    // Missing table: zero rows, every column missing
    if columns.is_empty() {
        return Ok(ContractProfile {
            table: contract.name.clone(),
            ..Default::default()
        });
    }

    let row_count = connector
        .query_scalar(&format!("SELECT count(*) FROM \"{}\"", contract.name))
        .await?;

    let mut null_counts = Vec::new();
    if row_count > 0 {
        for column in &policy.critical_columns {
            if !columns.contains(&column.to_lowercase()) {
                continue;
            }
            let nulls = connector
                .query_scalar(&format!(
                    "SELECT count(*) FROM \"{}\" WHERE \"{}\" IS NULL",
                    contract.name, column
                ))
                .await?;
            null_counts.push((column.clone(), nulls));
        }
    }

    Ok(ContractProfile {
        table: contract.name.clone(),
        row_count,
        columns,
        null_counts,
    })
}

#[instrument(skip(connector, policy), fields(table = %contract.name))]
pub async fn validate_contract(
    connector: &dyn Connector,
    contract: &ContractTable,
    policy: &GatePolicy,
) -> Result<ValidationReport, MedallionError> {
    let profile = profile_contract(connector, contract, policy).await?;
    let report = policy.evaluate(&profile);

    if report.passed() {
        info!(rows = report.row_count, "🛡️  Validation gate passed");
    } else {
        for message in report.messages() {
            warn!("⛔ {}", message);
        }
    }
    Ok(report)
}
