//! Workflow engine: drives one run through brand-profile extraction,
//! generation, critique, and the refine-or-accept loop, bounded by the
//! retry and enhance budgets.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use brandforge_core::config::AppConfig;
use brandforge_core::error::PipelineError;
use brandforge_core::event_bus::{make_event, noop_sink, EventSink, WorkflowEventType};
use brandforge_core::providers::{
    GenerationProvider, PromptImprover, RepairProvider, StyleProfileProvider,
};
use brandforge_core::types::RunStatus;
use brandforge_critique::CritiqueEngine;
use brandforge_refinement::{build_refinement_context, derive_repair_flags, RefinementPolicy};

use crate::registry::RunRegistry;
use crate::state_machine::{Decision, Next, StageMachine};
use crate::types::{RunOutcome, RunRequest, RunStatusView, Stage, WorkflowState};

/// Orchestrates workflow runs. Each `execute` call owns its
/// `WorkflowState` exclusively; runs share nothing but the registry.
/// Collaborators are constructor-injected so tests can substitute
/// fakes.
pub struct WorkflowEngine {
    config: AppConfig,
    registry: Arc<RunRegistry>,
    critique: CritiqueEngine,
    policy: RefinementPolicy,
    machine: StageMachine,
    generator: Arc<dyn GenerationProvider>,
    repairer: Arc<dyn RepairProvider>,
    prompt_improver: Arc<dyn PromptImprover>,
    profiles: Option<Arc<dyn StyleProfileProvider>>,
    events: Arc<dyn EventSink>,
}

impl WorkflowEngine {
    pub fn new(
        config: AppConfig,
        registry: Arc<RunRegistry>,
        critique: CritiqueEngine,
        policy: RefinementPolicy,
        generator: Arc<dyn GenerationProvider>,
        repairer: Arc<dyn RepairProvider>,
        prompt_improver: Arc<dyn PromptImprover>,
    ) -> Self {
        Self {
            config,
            registry,
            critique,
            policy,
            machine: StageMachine::new(),
            generator,
            repairer,
            prompt_improver,
            profiles: None,
            events: noop_sink(),
        }
    }

    /// Attach a brand-profile extraction provider for requests that
    /// carry a style source.
    pub fn with_style_profiles(mut self, provider: Arc<dyn StyleProfileProvider>) -> Self {
        self.profiles = Some(provider);
        self
    }

    /// Attach an event sink for lifecycle events.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    pub fn registry(&self) -> Arc<RunRegistry> {
        Arc::clone(&self.registry)
    }

    /// Status snapshot for polling.
    pub fn status(&self, run_id: Uuid) -> Option<RunStatusView> {
        self.registry.status(run_id)
    }

    /// Run the pipeline to a terminal state. Stage errors are captured
    /// and converted into a terminal `Failed` outcome; this function
    /// never panics the host.
    pub async fn execute(&self, request: RunRequest) -> RunOutcome {
        let run_id = self.registry.submit(&request);
        metrics::counter!("workflow.runs_started").increment(1);
        self.events
            .emit(make_event(WorkflowEventType::RunSubmitted, run_id, None, None));
        info!(run_id = %run_id, media = %request.media_kind, "Starting workflow run");

        let mut state = WorkflowState::new(run_id, &request);
        state.status = RunStatus::Processing;

        // -- brand profile ------------------------------------------------
        if let Some(source) = state.style_source.clone() {
            if self.cancel_requested(run_id) {
                return self.finish(state, RunStatus::Cancelled, None);
            }
            state.current_stage = Stage::BrandProfile;
            self.start_stage(run_id, Stage::BrandProfile);

            let Some(provider) = self.profiles.as_ref() else {
                return self.fail_stage(
                    state,
                    Stage::BrandProfile,
                    PipelineError::ProfileExtraction(
                        "request carries a style source but no profile provider is configured"
                            .into(),
                    ),
                );
            };

            match provider.extract(&source).await {
                Ok(profile) => {
                    state.style_profile = Some(Arc::new(profile));
                    self.complete_stage(run_id, Stage::BrandProfile);
                }
                Err(e) => {
                    return self.fail_stage(
                        state,
                        Stage::BrandProfile,
                        PipelineError::ProfileExtraction(e.to_string()),
                    );
                }
            }
        }

        // -- generation cycle ---------------------------------------------
        loop {
            if self.cancel_requested(run_id) {
                return self.finish(state, RunStatus::Cancelled, None);
            }
            state.current_stage = Stage::Generate;
            self.start_stage(run_id, Stage::Generate);

            let prompt = state
                .refined_prompt
                .clone()
                .unwrap_or_else(|| state.prompt.clone());

            match self
                .generator
                .generate(&prompt, state.media_kind, state.style_profile.as_deref())
                .await
            {
                Ok(artifact) => {
                    info!(run_id = %run_id, artifact = %artifact.uri, "Artifact generated");
                    state.artifact = Some(artifact);
                    state.repaired_artifact = None;
                    state.refined_prompt = None;
                    // The enhance budget is per artifact.
                    state.enhance_count = 0;
                    self.complete_stage(run_id, Stage::Generate);
                }
                Err(e) => {
                    return self.fail_stage(
                        state,
                        Stage::Generate,
                        PipelineError::Generation(e.to_string()),
                    );
                }
            }

            // -- critique cycle -------------------------------------------
            loop {
                if self.cancel_requested(run_id) {
                    return self.finish(state, RunStatus::Cancelled, None);
                }
                state.current_stage = Stage::Critique;
                self.start_stage(run_id, Stage::Critique);

                let Some(artifact) = state.current_artifact().cloned() else {
                    return self.fail_stage(
                        state,
                        Stage::Critique,
                        PipelineError::Critique("no artifact to critique".into()),
                    );
                };

                let report = self
                    .critique
                    .evaluate_variations(
                        run_id,
                        &[artifact],
                        state.style_profile.clone(),
                        state.media_kind,
                        Some(&state.prompt),
                    )
                    .await;
                self.complete_stage(run_id, Stage::Critique);

                // -- refine -----------------------------------------------
                state.current_stage = Stage::Refine;
                self.start_stage(run_id, Stage::Refine);

                let Some(best) = report.best_variation.clone() else {
                    state.critique_report = Some(report);
                    return self.fail_stage(
                        state,
                        Stage::Refine,
                        PipelineError::Critique("no variations evaluated".into()),
                    );
                };
                state.critique_report = Some(report);

                let strategy = self.policy.decide(&best, state.media_kind);
                state.last_strategy = Some(strategy);
                info!(
                    run_id = %run_id,
                    strategy = %strategy,
                    overall_score = best.overall_score,
                    "Refinement decision"
                );
                self.complete_stage(run_id, Stage::Refine);

                let mut decision = Decision::from(strategy);

                if decision == Decision::Enhance {
                    let flags = derive_repair_flags(&best);
                    if state.enhance_count >= self.config.workflow.max_enhance_passes {
                        warn!(
                            run_id = %run_id,
                            passes = state.enhance_count,
                            "Enhance budget exhausted, demoting to regenerate"
                        );
                        decision = Decision::Regenerate;
                    } else if !flags.any() {
                        warn!(run_id = %run_id, "No applicable repairs, demoting to regenerate");
                        decision = Decision::Regenerate;
                    }
                }

                // The retry budget belongs to the router, not the policy:
                // a regenerate decision past the budget forces the end.
                if decision == Decision::Regenerate
                    && state.retry_count >= self.config.workflow.max_retries
                {
                    decision = Decision::End;
                }

                let next = match self.machine.route(Stage::Refine, decision) {
                    Ok(next) => next,
                    Err(e) => {
                        return self.fail_stage(state, Stage::Refine, PipelineError::Internal(e));
                    }
                };

                match (decision, next) {
                    (Decision::Approve, Next::End) => {
                        return self.finish(state, RunStatus::Completed, None);
                    }
                    (Decision::Reject, Next::End) => {
                        let ctx = build_refinement_context(
                            &best,
                            self.config.critique.approve_threshold,
                        );
                        let detail = if ctx.critical_issues.is_empty() {
                            "content rejected by critique".to_string()
                        } else {
                            format!("content rejected: {}", ctx.critical_issues.join("; "))
                        };
                        return self.finish(state, RunStatus::Rejected, Some(detail));
                    }
                    (Decision::End, Next::End) => {
                        metrics::counter!("workflow.retries_exhausted").increment(1);
                        return self.finish(
                            state,
                            RunStatus::Failed,
                            Some(PipelineError::RetryExhausted.to_string()),
                        );
                    }
                    (Decision::Enhance, Next::Stage(Stage::Critique)) => {
                        let flags = derive_repair_flags(&best);
                        match self.repairer.repair(&best.artifact, flags).await {
                            Ok(repaired) => {
                                info!(run_id = %run_id, artifact = %repaired.uri, "Artifact repaired");
                                metrics::counter!("workflow.enhancements").increment(1);
                                state.repaired_artifact = Some(repaired);
                                state.enhance_count += 1;
                                // Loop back to critique on the repaired artifact.
                            }
                            Err(e) => {
                                return self.fail_stage(
                                    state,
                                    Stage::Refine,
                                    PipelineError::Repair(e.to_string()),
                                );
                            }
                        }
                    }
                    (Decision::Regenerate, Next::Stage(Stage::Generate)) => {
                        state.retry_count += 1;
                        self.registry.set_retry_count(run_id, state.retry_count);
                        metrics::counter!("workflow.regenerations").increment(1);

                        let ctx = build_refinement_context(
                            &best,
                            self.config.critique.approve_threshold,
                        );
                        match self
                            .prompt_improver
                            .improve(&state.prompt, &ctx.issues, state.style_profile.as_deref())
                            .await
                        {
                            Ok(refined) => {
                                info!(
                                    run_id = %run_id,
                                    retry = state.retry_count,
                                    "Prompt refined for regeneration"
                                );
                                state.refined_prompt = Some(refined);
                                break; // back to the generation cycle
                            }
                            Err(e) => {
                                return self.fail_stage(
                                    state,
                                    Stage::Refine,
                                    PipelineError::PromptRefinement(e.to_string()),
                                );
                            }
                        }
                    }
                    (decision, next) => {
                        return self.fail_stage(
                            state,
                            Stage::Refine,
                            PipelineError::Internal(anyhow::anyhow!(
                                "router produced inconsistent hop {next:?} for {decision:?}"
                            )),
                        );
                    }
                }
            }
        }
    }

    // -- helpers ----------------------------------------------------------

    fn cancel_requested(&self, run_id: Uuid) -> bool {
        self.registry.is_cancel_requested(run_id)
    }

    fn start_stage(&self, run_id: Uuid, stage: Stage) {
        self.registry.start_stage(run_id, stage);
        self.events.emit(make_event(
            WorkflowEventType::StageStarted,
            run_id,
            Some(stage.as_str().into()),
            None,
        ));
    }

    fn complete_stage(&self, run_id: Uuid, stage: Stage) {
        self.registry.complete_stage(run_id, stage);
        self.events.emit(make_event(
            WorkflowEventType::StageCompleted,
            run_id,
            Some(stage.as_str().into()),
            None,
        ));
    }

    /// Convert a stage-level error into the terminal failed outcome.
    fn fail_stage(
        &self,
        state: WorkflowState,
        stage: Stage,
        error: PipelineError,
    ) -> RunOutcome {
        let message = error.to_string();
        error!(
            run_id = %state.run_id,
            stage = %stage,
            error = %message,
            "Stage failed"
        );
        self.registry.fail_stage(state.run_id, stage, &message);
        self.events.emit(make_event(
            WorkflowEventType::StageFailed,
            state.run_id,
            Some(stage.as_str().into()),
            Some(message.clone()),
        ));
        self.finish(state, RunStatus::Failed, Some(message))
    }

    /// Terminal transition: persist the preferred artifact and report,
    /// freeze the record, and emit the closing event.
    fn finish(
        &self,
        mut state: WorkflowState,
        status: RunStatus,
        detail: Option<String>,
    ) -> RunOutcome {
        state.status = status;
        state.error_message = detail.clone();

        // Prefer a repaired artifact over the raw generation, whatever
        // the terminal status; rejected runs still keep their evidence.
        let final_artifact = state.current_artifact().cloned();

        self.registry.complete_run(
            state.run_id,
            status,
            final_artifact.clone(),
            state.critique_report.clone(),
            detail.clone(),
        );

        let (event_type, counter) = match status {
            RunStatus::Completed => (WorkflowEventType::RunCompleted, "workflow.runs_completed"),
            RunStatus::Rejected => (WorkflowEventType::RunRejected, "workflow.runs_rejected"),
            RunStatus::Cancelled => (WorkflowEventType::RunCancelled, "workflow.runs_cancelled"),
            _ => (WorkflowEventType::RunFailed, "workflow.runs_failed"),
        };
        metrics::counter!(counter).increment(1);
        self.events
            .emit(make_event(event_type, state.run_id, None, detail.clone()));

        info!(
            run_id = %state.run_id,
            status = ?status,
            retries = state.retry_count,
            "Workflow run finished"
        );

        RunOutcome {
            run_id: state.run_id,
            status,
            final_artifact,
            critique_report: state.critique_report,
            retry_count: state.retry_count,
            error: detail,
        }
    }
}
