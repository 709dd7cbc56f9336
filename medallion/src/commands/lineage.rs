// medallion/src/commands/lineage.rs
//
// USE CASE: Static lineage, contract table -> derived tables -> models.

use anyhow::Context;
use std::path::PathBuf;

use medallion_core::application::LineageAnalyzer;
use medallion_core::infrastructure::compiler::ProjectDiscovery;
use medallion_core::infrastructure::config::load_project_config;
use medallion_core::infrastructure::fs::write_artifact;

use crate::cli::LineageFormat;

pub fn execute(project_dir: PathBuf, check: bool, format: LineageFormat) -> anyhow::Result<()> {
    println!("🔍 Analyzing Data Lineage...");

    // 1. Load Config & Discover Manifest
    let config = load_project_config(&project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    let manifest = ProjectDiscovery::discover(&project_dir, &config)?;

    println!(
        "   Project: {} ({} models)",
        config.name,
        manifest.nodes.len()
    );

    // 2. Run Lineage Analysis
    let report = LineageAnalyzer::analyze(&manifest, &config.contract_table);

    // 3. Output Report
    match format {
        LineageFormat::Json => {
            let json = report.to_json()?;
            let out_path = project_dir.join(&config.target_path).join("lineage.json");
            write_artifact(&out_path, &json)?;
            println!("📄 JSON report saved to {}", out_path.display());
            println!("{}", json);
        }
        LineageFormat::Mermaid => {
            println!("\n```mermaid");
            println!("{}", report.to_mermaid());
            println!("```\n");
        }
    }

    // 4. Summary
    println!("📊 Lineage Summary:");
    println!("   Nodes: {}", report.nodes.len());
    println!("   Edges: {}", report.edges.len());

    if report.has_violations() {
        eprintln!("\n⚠️  {} violation(s) detected:", report.violations.len());
        for v in &report.violations {
            eprintln!("   ❌ {}", v.message);
        }

        if check {
            eprintln!("\n💥 --check mode: Failing due to undeclared upstreams.");
            std::process::exit(1);
        }
    } else {
        println!("   ✅ Every upstream is declared.");
    }

    Ok(())
}
