// medallion/src/commands/query.rs
//
// USE CASE: Execute a raw SQL query (ad-hoc).

use std::path::PathBuf;

use medallion_core::application::execute_query;

use super::{open_selected_store, render_table};

pub async fn execute(
    query: String,
    project_dir: PathBuf,
    db_path: Option<String>,
) -> anyhow::Result<()> {
    let connector = open_selected_store(&project_dir, db_path)?;

    match execute_query(&connector, &query).await {
        Ok(result) => {
            println!("{}", render_table(&result));
            println!("({} row(s))", result.rows.len());
        }
        Err(e) => {
            eprintln!("❌ Query failed: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}
