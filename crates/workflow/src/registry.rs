//! Run registry: the shared surface between concurrently executing
//! workflow instances and the status-polling layer.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use brandforge_core::types::{ArtifactRef, RunStatus};
use brandforge_critique::types::CritiqueReport;

use crate::types::{RunRecord, RunRequest, RunStatusView, Stage, StageRecord};

/// Keyed by run id. Records survive their run's terminal transition so
/// results remain pollable; terminal records are never mutated again.
#[derive(Default)]
pub struct RunRegistry {
    runs: Arc<DashMap<Uuid, RunRecord>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self {
            runs: Arc::new(DashMap::new()),
        }
    }

    /// Create a pending record for a new run and return its id.
    pub fn submit(&self, request: &RunRequest) -> Uuid {
        let run_id = Uuid::new_v4();
        let now = Utc::now();
        let record = RunRecord {
            run_id,
            status: RunStatus::Pending,
            progress: 0.0,
            prompt: request.prompt.clone(),
            media_kind: request.media_kind,
            current_stage: None,
            stages: Vec::new(),
            retry_count: 0,
            critique_report: None,
            final_artifact: None,
            error_message: None,
            cancel_requested: false,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        info!(run_id = %run_id, media = %request.media_kind, "Run submitted");
        self.runs.insert(run_id, record);
        run_id
    }

    /// Mark a stage as started. Moves a pending run into processing.
    pub fn start_stage(&self, run_id: Uuid, stage: Stage) {
        if let Some(mut record) = self.runs.get_mut(&run_id) {
            if record.status.is_terminal() {
                return;
            }
            record.status = RunStatus::Processing;
            record.current_stage = Some(stage);
            record.stages.push(StageRecord {
                stage,
                started_at: Utc::now(),
                completed_at: None,
                error: None,
            });
            record.updated_at = Utc::now();
        }
    }

    /// Mark the latest record of `stage` completed and advance progress.
    /// Progress is monotonically non-decreasing: the regenerate loop
    /// re-runs earlier stages without ever walking progress backwards.
    pub fn complete_stage(&self, run_id: Uuid, stage: Stage) {
        if let Some(mut record) = self.runs.get_mut(&run_id) {
            if record.status.is_terminal() {
                return;
            }
            if let Some(entry) = record
                .stages
                .iter_mut()
                .rev()
                .find(|s| s.stage == stage && s.completed_at.is_none())
            {
                entry.completed_at = Some(Utc::now());
            }
            record.progress = record.progress.max(stage.progress());
            record.updated_at = Utc::now();
        }
    }

    /// Record a stage failure without deciding the run's fate; the
    /// engine follows up with `complete_run`.
    pub fn fail_stage(&self, run_id: Uuid, stage: Stage, error: &str) {
        if let Some(mut record) = self.runs.get_mut(&run_id) {
            if record.status.is_terminal() {
                return;
            }
            if let Some(entry) = record
                .stages
                .iter_mut()
                .rev()
                .find(|s| s.stage == stage && s.completed_at.is_none())
            {
                entry.completed_at = Some(Utc::now());
                entry.error = Some(error.to_string());
            }
            record.updated_at = Utc::now();
        }
    }

    pub fn set_retry_count(&self, run_id: Uuid, retry_count: u32) {
        if let Some(mut record) = self.runs.get_mut(&run_id) {
            if !record.status.is_terminal() {
                record.retry_count = retry_count;
                record.updated_at = Utc::now();
            }
        }
    }

    /// Request cancellation. The engine honors it at the next stage
    /// boundary; there is no mid-stage cancellation primitive. Returns
    /// `false` for unknown or already-terminal runs.
    pub fn request_cancel(&self, run_id: Uuid) -> bool {
        match self.runs.get_mut(&run_id) {
            Some(mut record) if !record.status.is_terminal() => {
                record.cancel_requested = true;
                record.updated_at = Utc::now();
                info!(run_id = %run_id, "Cancellation requested");
                true
            }
            _ => false,
        }
    }

    pub fn is_cancel_requested(&self, run_id: Uuid) -> bool {
        self.runs
            .get(&run_id)
            .map(|r| r.cancel_requested)
            .unwrap_or(false)
    }

    /// Terminal transition: persist the final artifact and report, set
    /// exactly one terminal status, and freeze the record.
    pub fn complete_run(
        &self,
        run_id: Uuid,
        status: RunStatus,
        final_artifact: Option<ArtifactRef>,
        critique_report: Option<CritiqueReport>,
        error: Option<String>,
    ) {
        debug_assert!(status.is_terminal());
        if let Some(mut record) = self.runs.get_mut(&run_id) {
            if record.status.is_terminal() {
                return;
            }
            record.status = status;
            record.final_artifact = final_artifact;
            record.critique_report = critique_report;
            record.error_message = error;
            if status == RunStatus::Completed {
                record.progress = 100.0;
            }
            record.completed_at = Some(Utc::now());
            record.updated_at = Utc::now();
            info!(run_id = %run_id, status = ?status, "Run finished");
        }
    }

    pub fn get(&self, run_id: Uuid) -> Option<RunRecord> {
        self.runs.get(&run_id).map(|r| r.clone())
    }

    /// Snapshot for the status-polling surface.
    pub fn status(&self, run_id: Uuid) -> Option<RunStatusView> {
        self.runs.get(&run_id).map(|r| RunStatusView {
            run_id: r.run_id,
            status: r.status,
            progress: r.progress,
            current_stage: r.current_stage,
            retry_count: r.retry_count,
            critique_report: r.critique_report.clone(),
            final_artifact: r.final_artifact.clone(),
            error: r.error_message.clone(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }

    pub fn run_ids(&self) -> Vec<Uuid> {
        self.runs.iter().map(|r| *r.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brandforge_core::types::MediaKind;

    fn request() -> RunRequest {
        RunRequest {
            prompt: "summer sale banner".into(),
            media_kind: MediaKind::Image,
            style_source: None,
        }
    }

    #[test]
    fn test_stage_lifecycle_updates_progress() {
        let registry = RunRegistry::new();
        let run_id = registry.submit(&request());

        assert_eq!(registry.status(run_id).unwrap().status, RunStatus::Pending);

        registry.start_stage(run_id, Stage::Generate);
        let view = registry.status(run_id).unwrap();
        assert_eq!(view.status, RunStatus::Processing);
        assert_eq!(view.current_stage, Some(Stage::Generate));

        registry.complete_stage(run_id, Stage::Generate);
        assert_eq!(registry.status(run_id).unwrap().progress, 50.0);
    }

    #[test]
    fn test_progress_never_decreases_on_loops() {
        let registry = RunRegistry::new();
        let run_id = registry.submit(&request());

        registry.start_stage(run_id, Stage::Critique);
        registry.complete_stage(run_id, Stage::Critique);
        assert_eq!(registry.status(run_id).unwrap().progress, 75.0);

        // Regenerate loop re-enters the generate stage.
        registry.start_stage(run_id, Stage::Generate);
        registry.complete_stage(run_id, Stage::Generate);
        assert_eq!(registry.status(run_id).unwrap().progress, 75.0);
    }

    #[test]
    fn test_terminal_record_is_frozen() {
        let registry = RunRegistry::new();
        let run_id = registry.submit(&request());

        registry.complete_run(run_id, RunStatus::Completed, None, None, None);
        let completed_at = registry.get(run_id).unwrap().completed_at;

        registry.start_stage(run_id, Stage::Generate);
        registry.complete_run(run_id, RunStatus::Failed, None, None, Some("late".into()));

        let record = registry.get(run_id).unwrap();
        assert_eq!(record.status, RunStatus::Completed);
        assert_eq!(record.progress, 100.0);
        assert!(record.error_message.is_none());
        assert_eq!(record.completed_at, completed_at);
        assert!(!registry.request_cancel(run_id));
    }

    #[test]
    fn test_cancel_request_flag() {
        let registry = RunRegistry::new();
        let run_id = registry.submit(&request());

        assert!(!registry.is_cancel_requested(run_id));
        assert!(registry.request_cancel(run_id));
        assert!(registry.is_cancel_requested(run_id));
        assert!(!registry.request_cancel(Uuid::new_v4()));
    }
}
