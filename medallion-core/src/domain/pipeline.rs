// medallion-core/src/domain/pipeline.rs

//! The run state machine: `INGEST -> VALIDATE -> TRANSFORM -> MODEL -> DONE`, with
//! `HALTED` reachable from any stage. No retry, no recovery.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ingest,
    Validate,
    Transform,
    Model,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Ingest, Stage::Validate, Stage::Transform, Stage::Model];

    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Ingest => Some(Stage::Validate),
            Stage::Validate => Some(Stage::Transform),
            Stage::Transform => Some(Stage::Model),
            Stage::Model => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Ingest => "INGEST",
            Stage::Validate => "VALIDATE",
            Stage::Transform => "TRANSFORM",
            Stage::Model => "MODEL",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "stage", rename_all = "snake_case")]
pub enum PipelineState {
    Running(Stage),
    Done,
    Halted(Stage),
}

impl PipelineState {
    pub fn start() -> Self {
        PipelineState::Running(Stage::Ingest)
    }

    /// Transition after the current stage reported `succeeded`.
    /// Terminal states absorb every transition.
    pub fn advance(self, succeeded: bool) -> Self {
        match self {
            PipelineState::Running(stage) if succeeded => {
                stage.next().map_or(PipelineState::Done, PipelineState::Running)
            }
            PipelineState::Running(stage) => PipelineState::Halted(stage),
            terminal => terminal,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, PipelineState::Running(_))
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Running(stage) => write!(f, "{}", stage),
            PipelineState::Done => f.write_str("DONE"),
            PipelineState::Halted(stage) => write!(f, "HALTED at {}", stage),
        }
    }
}
