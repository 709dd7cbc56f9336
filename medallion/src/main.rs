// medallion/src/main.rs

mod cli;
mod commands;

use clap::Parser;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean for reports.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { project_dir } => commands::run::execute(project_dir).await,
        Commands::Validate { project_dir } => commands::validate::execute(project_dir).await,
        Commands::Lineage {
            project_dir,
            check,
            format,
        } => commands::lineage::execute(project_dir, check, format),
        Commands::Query {
            query,
            project_dir,
            db_path,
        } => commands::query::execute(query, project_dir, db_path).await,
        Commands::Inspect {
            table,
            limit,
            project_dir,
            db_path,
        } => commands::inspect::execute(table, limit, project_dir, db_path).await,
        Commands::Clean { project_dir } => commands::clean::execute(project_dir),
    }
}
