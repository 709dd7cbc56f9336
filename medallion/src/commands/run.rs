// medallion/src/commands/run.rs
//
// USE CASE: Run the pipeline.

use anyhow::Context;
use comfy_table::{Table, presets::UTF8_FULL};
use std::path::PathBuf;

use medallion_core::application::{PipelineContext, RunReport, run_pipeline};
use medallion_core::infrastructure::adapters::{DuckDBConnector, FhirFileAdapter};
use medallion_core::infrastructure::compiler::{JinjaRenderer, ProjectDiscovery};
use medallion_core::infrastructure::config::load_project_config;
use medallion_core::ports::Connector;

pub async fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let start = std::time::Instant::now();

    // A. Load the Config (Infra)
    println!("⚙️  Loading configuration...");
    let config = load_project_config(&project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    println!("   Project: {} (v{})", config.name, config.version);

    // B. Open the store
    let connector = DuckDBConnector::open(&project_dir, &config.database_path)
        .with_context(|| format!("Failed to initialize DuckDB at {}", config.database_path))?;
    println!(
        "   Engine: {} 🦆 ({})",
        connector.engine_name(),
        config.database_path
    );

    // C. Run the Pipeline (Application Layer)
    let source = FhirFileAdapter;
    let renderer = JinjaRenderer::new();
    let discovery = ProjectDiscovery;
    let ctx = PipelineContext {
        project_dir: &project_dir,
        config: &config,
        connector: &connector,
        source: &source,
        renderer: &renderer,
        manifest_loader: &discovery,
        transform_source: &discovery,
    };

    let report = match run_pipeline(&ctx).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("\n💥 CRITICAL PIPELINE ERROR:");
            eprintln!("{:?}", miette::Report::new(e));
            std::process::exit(1);
        }
    };

    print_skipped(&report);

    if report.succeeded() {
        print_models(&report);
        println!("\n✨ SUCCESS! Pipeline finished in {:.2?}", start.elapsed());
        return Ok(());
    }

    eprintln!("\n❌ {}", report.final_state);
    if let Some(failed) = report.failed_stage() {
        for diagnostic in &failed.diagnostics {
            eprintln!("   ⛔ {}", diagnostic);
        }
    }
    std::process::exit(1);
}

fn print_skipped(report: &RunReport) {
    let Some(ingest) = &report.ingest else {
        return;
    };
    for skipped in &ingest.skipped {
        eprintln!("   ⚠️  Skipped '{}': {}", skipped.name, skipped.reason);
    }
}

fn print_models(report: &RunReport) {
    if report.models.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["model", "materialized", "rows"]);
    for model in &report.models {
        table.add_row(vec![
            model.name.clone(),
            model.materialized.clone(),
            model
                .row_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{}", table);
}
