// medallion/src/commands/inspect.rs
//
// USE CASE: Inspect a table (schema + sample rows).

use comfy_table::{Table, presets::UTF8_FULL};
use std::path::PathBuf;

use medallion_core::application::inspect_table;

use super::{open_selected_store, render_table};

pub async fn execute(
    table: String,
    limit: usize,
    project_dir: PathBuf,
    db_path: Option<String>,
) -> anyhow::Result<()> {
    let connector = open_selected_store(&project_dir, db_path)?;

    println!("\n🔍 Inspecting Table: '{}'", table);
    let (columns, sample) = inspect_table(&connector, &table, limit).await?;

    let mut schema = Table::new();
    schema.load_preset(UTF8_FULL);
    schema.set_header(vec!["column", "type", "nullable"]);
    for column in &columns {
        schema.add_row(vec![
            column.name.clone(),
            column.data_type.clone(),
            column.is_nullable.to_string(),
        ]);
    }
    println!("{}", schema);

    println!("   --- Rows (Limit {}) ---", limit);
    println!("{}", render_table(&sample));
    Ok(())
}
