// medallion/src/commands/mod.rs

pub mod clean;
pub mod inspect;
pub mod lineage;
pub mod query;
pub mod run;
pub mod validate;

use anyhow::Context;
use comfy_table::{Table, presets::UTF8_FULL};
use std::path::Path;

use medallion_core::infrastructure::adapters::DuckDBConnector;
use medallion_core::infrastructure::config::load_project_config;
use medallion_core::ports::connector::QueryResult;

/// Opens `database_path` (relative to `base`) without creating it.
pub fn open_existing_store(base: &Path, database_path: &str) -> anyhow::Result<DuckDBConnector> {
    if database_path != ":memory:" && !base.join(database_path).exists() {
        anyhow::bail!(
            "❌ Database not found at: {}\n👉 Have you run 'medallion run'?",
            base.join(database_path).display()
        );
    }

    tracing::debug!(path = %base.join(database_path).display(), "Opening existing store");
    DuckDBConnector::open(base, database_path)
        .with_context(|| format!("Failed to open DuckDB at {}", database_path))
}

/// `--db-path` when given (relative to the working directory), the project's
/// `database-path` otherwise.
pub fn open_selected_store(
    project_dir: &Path,
    db_path: Option<String>,
) -> anyhow::Result<DuckDBConnector> {
    match db_path {
        Some(path) => open_existing_store(Path::new("."), &path),
        None => {
            let config = load_project_config(project_dir).with_context(|| {
                format!(
                    "Failed to load project configuration from {:?}",
                    project_dir
                )
            })?;
            open_existing_store(project_dir, &config.database_path)
        }
    }
}

pub fn render_table(result: &QueryResult) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(&result.columns);
    for row in &result.rows {
        table.add_row(row);
    }
    table
}
