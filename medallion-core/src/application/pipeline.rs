// medallion-core/src/application/pipeline.rs

//! The orchestrator: drives the run state machine through ingest, gate, transform
//! and model stages, halting at the first failing stage.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info};

use crate::application::gate::validate_contract;
use crate::application::ingest::{IngestSummary, ingest};
use crate::application::model_builder::{ModelOutcome, build_models};
use crate::application::ports::TemplateEngine;
use crate::application::transform::{apply_transforms, template_context};
use crate::domain::contract::ContractTable;
use crate::domain::gate::ValidationReport;
use crate::domain::pipeline::{PipelineState, Stage};
use crate::domain::ports::{ManifestLoader, TransformSource};
use crate::domain::project::ProjectConfig;
use crate::error::MedallionError;
use crate::infrastructure::fs::write_artifact;
use crate::ports::connector::Connector;
use crate::ports::source::SourceAdapter;

pub const RUN_RESULTS_FILE: &str = "run_results.json";

/// Everything a run needs, passed in explicitly.
pub struct PipelineContext<'a> {
    pub project_dir: &'a Path,
    pub config: &'a ProjectConfig,
    pub connector: &'a dyn Connector,
    pub source: &'a dyn SourceAdapter,
    pub renderer: &'a dyn TemplateEngine,
    pub manifest_loader: &'a dyn ManifestLoader,
    pub transform_source: &'a dyn TransformSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub status: StageStatus,
    pub duration_ms: u128,
    pub message: String,
    /// Why the stage failed: gate violations, or the error chain.
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub project: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u128,
    pub final_state: PipelineState,
    pub stages: Vec<StageOutcome>,
    pub ingest: Option<IngestSummary>,
    pub validation: Option<ValidationReport>,
    pub transformed_tables: Vec<String>,
    pub models: Vec<ModelOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.final_state == PipelineState::Done
    }

    pub fn failed_stage(&self) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|s| s.status == StageStatus::Failed)
    }
}

type StageResult = Result<String, Vec<String>>;

fn diagnose(e: MedallionError) -> Vec<String> {
    vec![e.to_string()]
}

/// Runs the pipeline to `Done` or `Halted`. A halt is a normal outcome and comes
/// back as `Ok` with the failing stage in the report; `Err` means the run
/// artifacts could not be written.
pub async fn run_pipeline(ctx: &PipelineContext<'_>) -> Result<RunReport, MedallionError> {
    println!("🚀 Starting Pipeline Orchestrator...");
    let start_time = Instant::now();

    let mut report = RunReport {
        project: ctx.config.name.clone(),
        started_at: Utc::now(),
        duration_ms: 0,
        final_state: PipelineState::start(),
        stages: Vec::new(),
        ingest: None,
        validation: None,
        transformed_tables: Vec::new(),
        models: Vec::new(),
    };

    let mut state = PipelineState::start();
    while let PipelineState::Running(stage) = state {
        println!("🔹 {}", stage);
        let stage_start = Instant::now();
        let result = run_stage(stage, ctx, &mut report).await;
        let duration_ms = stage_start.elapsed().as_millis();

        let outcome = match result {
            Ok(message) => {
                println!("   ✅ {}", message);
                StageOutcome {
                    stage,
                    status: StageStatus::Success,
                    duration_ms,
                    message,
                    diagnostics: Vec::new(),
                }
            }
            Err(diagnostics) => {
                for d in &diagnostics {
                    error!(stage = %stage, "{}", d);
                }
                StageOutcome {
                    stage,
                    status: StageStatus::Failed,
                    duration_ms,
                    message: format!("{} failed", stage),
                    diagnostics,
                }
            }
        };

        state = state.advance(outcome.status == StageStatus::Success);
        report.stages.push(outcome);
    }

    report.final_state = state;
    report.duration_ms = start_time.elapsed().as_millis();

    let target_dir = ctx.project_dir.join(&ctx.config.target_path);
    save_json(&target_dir.join(RUN_RESULTS_FILE), &report)?;

    match state {
        PipelineState::Done => println!(
            "✨ Done in {:.2}s.",
            start_time.elapsed().as_secs_f64()
        ),
        _ => eprintln!("🛑 {}", state),
    }

    Ok(report)
}

async fn run_stage(stage: Stage, ctx: &PipelineContext<'_>, report: &mut RunReport) -> StageResult {
    let contract = ContractTable::new(&ctx.config.contract_table);
    let target_dir = ctx.project_dir.join(&ctx.config.target_path);

    match stage {
        Stage::Ingest => {
            let data_dir = ctx.project_dir.join(&ctx.config.data_path);
            let summary = ingest(ctx.connector, ctx.source, &contract, &data_dir)
                .await
                .map_err(diagnose)?;
            let message = if summary.replaced {
                format!(
                    "{} rows from {} files ({} skipped)",
                    summary.row_count,
                    summary.files_loaded.len(),
                    summary.skipped.len()
                )
            } else {
                format!(
                    "no loadable files ({} skipped), contract table unchanged",
                    summary.skipped.len()
                )
            };
            report.ingest = Some(summary);
            Ok(message)
        }
        Stage::Validate => {
            let validation = validate_contract(ctx.connector, &contract, &ctx.config.gate)
                .await
                .map_err(diagnose)?;
            let outcome = if validation.passed() {
                Ok(format!("{} rows passed the gate", validation.row_count))
            } else {
                Err(validation.messages())
            };
            report.validation = Some(validation);
            outcome
        }
        Stage::Transform => {
            let units = ctx
                .transform_source
                .load_units(ctx.project_dir, ctx.config)
                .map_err(|e| diagnose(e.into()))?;
            let compiled_dir = target_dir.join("compiled").join("staging");
            let plan = apply_transforms(
                ctx.connector,
                ctx.renderer,
                &units,
                ctx.config,
                Some(&compiled_dir),
            )
            .await
            .map_err(diagnose)?;
            report.transformed_tables = plan.targets().iter().map(|t| t.to_string()).collect();
            Ok(format!("{} derived tables rebuilt", plan.units().len()))
        }
        Stage::Model => {
            let manifest = ctx
                .manifest_loader
                .load(ctx.project_dir, ctx.config)
                .map_err(|e| diagnose(e.into()))?;
            save_json(&target_dir.join("manifest.json"), &manifest).map_err(diagnose)?;

            let compiled_dir = target_dir.join("compiled").join("marts");
            let outcomes = build_models(
                ctx.connector,
                ctx.renderer,
                &manifest,
                &template_context(ctx.config),
                Some(&compiled_dir),
            )
            .await
            .map_err(diagnose)?;
            let message = format!("{} models rebuilt", outcomes.len());
            report.models = outcomes;
            info!("{}", message);
            Ok(message)
        }
    }
}

fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), MedallionError> {
    let content = serde_json::to_string_pretty(data)
        .map_err(|e| MedallionError::InternalError(format!("Serialization: {}", e)))?;
    write_artifact(path, content)?;
    Ok(())
}
