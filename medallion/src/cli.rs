// medallion/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "medallion")]
#[command(about = "Contract-gated clinical-record pipeline (ingest -> gate -> transform -> model)", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LineageFormat {
    Mermaid,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🚀 Runs the pipeline (Ingest -> Validate -> Transform -> Model)
    Run {
        /// Project directory
        #[arg(long, default_value = ".", env = "MEDALLION_PROJECT_DIR")]
        project_dir: PathBuf,
    },

    /// 🛡️ Runs the validation gate against the current contract table
    Validate {
        /// Project directory
        #[arg(long, default_value = ".", env = "MEDALLION_PROJECT_DIR")]
        project_dir: PathBuf,
    },

    /// 🔗 Prints the static lineage of the project
    Lineage {
        /// Project directory
        #[arg(long, default_value = ".", env = "MEDALLION_PROJECT_DIR")]
        project_dir: PathBuf,

        /// Exit with error if a model reads an undeclared upstream
        #[arg(long)]
        check: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = LineageFormat::Mermaid)]
        format: LineageFormat,
    },

    /// ⚡ Executes a raw SQL query (Ad-hoc)
    Query {
        query: String,

        /// Project directory (its database-path is used unless --db-path is given)
        #[arg(long, default_value = ".", env = "MEDALLION_PROJECT_DIR")]
        project_dir: PathBuf,

        /// Path to the DuckDB database file
        #[arg(long)]
        db_path: Option<String>,
    },

    /// 🔍 Inspects a table (schema + sample rows)
    Inspect {
        /// Table name to inspect
        #[arg(long, short)]
        table: String,

        /// Number of sample rows to display
        #[arg(long, default_value = "5")]
        limit: usize,

        /// Project directory (its database-path is used unless --db-path is given)
        #[arg(long, default_value = ".", env = "MEDALLION_PROJECT_DIR")]
        project_dir: PathBuf,

        /// Path to the DuckDB database file
        #[arg(long)]
        db_path: Option<String>,
    },

    /// 🧹 Cleans build artifacts (target/ folder)
    Clean {
        #[arg(long, default_value = ".", env = "MEDALLION_PROJECT_DIR")]
        project_dir: PathBuf,
    },
}
