// medallion/src/commands/validate.rs
//
// USE CASE: Run the validation gate alone, against whatever the contract table
// currently holds. Read-only.

use anyhow::Context;
use std::path::PathBuf;

use medallion_core::application::validate_contract;
use medallion_core::domain::ContractTable;
use medallion_core::infrastructure::config::load_project_config;

use super::open_existing_store;

pub async fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let config = load_project_config(&project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    let connector = open_existing_store(&project_dir, &config.database_path)?;

    let contract = ContractTable::new(config.contract_table.clone());
    let report = validate_contract(&connector, &contract, &config.gate).await?;

    if report.passed() {
        println!(
            "🛡️  Contract table '{}' passed ({} rows).",
            report.table, report.row_count
        );
        return Ok(());
    }

    eprintln!(
        "❌ Contract table '{}' rejected ({} rows):",
        report.table, report.row_count
    );
    for message in report.messages() {
        eprintln!("   ⛔ {}", message);
    }
    std::process::exit(1);
}
