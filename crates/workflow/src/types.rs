use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use brandforge_core::types::{ArtifactRef, MediaKind, RunStatus, StyleProfile};
use brandforge_critique::types::CritiqueReport;
use brandforge_refinement::RefinementStrategy;

/// The pipeline stages, in nominal order. Refine routes back into
/// Generate or Critique until a terminal decision lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    BrandProfile,
    Generate,
    Critique,
    Refine,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::BrandProfile => "brand_profile",
            Stage::Generate => "generate",
            Stage::Critique => "critique",
            Stage::Refine => "refine",
        }
    }

    /// Progress percentage reported when this stage completes. Terminal
    /// completion bumps to 100.
    pub fn progress(&self) -> f64 {
        match self {
            Stage::BrandProfile => 25.0,
            Stage::Generate => 50.0,
            Stage::Critique => 75.0,
            Stage::Refine => 90.0,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to run the pipeline once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub prompt: String,
    pub media_kind: MediaKind,
    /// Source for brand-profile extraction (upload path or website
    /// URL). When absent the brand-profile stage is skipped.
    pub style_source: Option<String>,
}

/// Mutable per-run state, owned exclusively by the workflow engine for
/// the lifetime of one run and frozen once the status turns terminal.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub run_id: Uuid,
    pub prompt: String,
    pub media_kind: MediaKind,
    pub style_source: Option<String>,
    pub style_profile: Option<Arc<StyleProfile>>,
    pub current_stage: Stage,
    /// Latest generated artifact, replaced on every generation attempt.
    pub artifact: Option<ArtifactRef>,
    /// Locally repaired artifact from the enhance path, if any. Reset
    /// by each fresh generation.
    pub repaired_artifact: Option<ArtifactRef>,
    pub critique_report: Option<CritiqueReport>,
    pub last_strategy: Option<RefinementStrategy>,
    pub refined_prompt: Option<String>,
    pub retry_count: u32,
    pub enhance_count: u32,
    pub status: RunStatus,
    pub error_message: Option<String>,
}

impl WorkflowState {
    pub fn new(run_id: Uuid, request: &RunRequest) -> Self {
        Self {
            run_id,
            prompt: request.prompt.clone(),
            media_kind: request.media_kind,
            style_source: request.style_source.clone(),
            style_profile: None,
            current_stage: Stage::BrandProfile,
            artifact: None,
            repaired_artifact: None,
            critique_report: None,
            last_strategy: None,
            refined_prompt: None,
            retry_count: 0,
            enhance_count: 0,
            status: RunStatus::Pending,
            error_message: None,
        }
    }

    /// The artifact the run would ship right now: a repaired artifact
    /// wins over the raw generation.
    pub fn current_artifact(&self) -> Option<&ArtifactRef> {
        self.repaired_artifact.as_ref().or(self.artifact.as_ref())
    }
}

/// Record of one stage execution for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Registry-side record of a run, kept after the run turns terminal so
/// the status surface can still serve it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub progress: f64,
    pub prompt: String,
    pub media_kind: MediaKind,
    pub current_stage: Option<Stage>,
    pub stages: Vec<StageRecord>,
    pub retry_count: u32,
    pub critique_report: Option<CritiqueReport>,
    pub final_artifact: Option<ArtifactRef>,
    pub error_message: Option<String>,
    #[serde(default, skip_serializing)]
    pub cancel_requested: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Snapshot polled by the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatusView {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub progress: f64,
    pub current_stage: Option<Stage>,
    pub retry_count: u32,
    pub critique_report: Option<CritiqueReport>,
    pub final_artifact: Option<ArtifactRef>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Terminal result of one workflow execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub final_artifact: Option<ArtifactRef>,
    pub critique_report: Option<CritiqueReport>,
    pub retry_count: u32,
    pub error: Option<String>,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.status == RunStatus::Completed
    }
}
