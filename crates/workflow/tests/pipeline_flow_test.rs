//! End-to-end pipeline flow against the scripted demo providers.

use brandforge_core::config::AppConfig;
use brandforge_core::types::{MediaKind, RunStatus};
use brandforge_critique::types::Dimension;
use brandforge_workflow::demo::demo_engine;
use brandforge_workflow::types::{RunRequest, Stage};

#[tokio::test]
async fn image_run_repairs_and_completes() {
    let engine = demo_engine(AppConfig::default());
    let outcome = engine
        .execute(RunRequest {
            prompt: "A vibrant summer sale banner".into(),
            media_kind: MediaKind::Image,
            style_source: Some("https://demo.example.com".into()),
        })
        .await;

    // First generation shows a soft visual defect, the enhance path
    // repairs it, and the re-critique approves.
    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.retry_count, 0);

    let final_artifact = outcome.final_artifact.expect("completed run ships an artifact");
    assert!(final_artifact.uri.ends_with(".repaired"));

    let report = outcome.critique_report.expect("report persisted");
    assert_eq!(report.total_variations, 1);
    assert_eq!(report.passed_variations, 1);
    let best = report.best_variation.expect("best variation present");
    assert_eq!(best.rank, Some(1));

    // Scorecards come back in canonical dimension order.
    let dims: Vec<Dimension> = best.scorecards.iter().map(|c| c.dimension).collect();
    assert_eq!(dims, Dimension::ALL.to_vec());

    // Registry snapshot reflects the terminal state.
    let view = engine.status(outcome.run_id).expect("run is pollable");
    assert_eq!(view.status, RunStatus::Completed);
    assert_eq!(view.progress, 100.0);

    // Every pipeline stage ran, including the brand-profile extraction.
    let record = engine.registry().get(outcome.run_id).expect("record kept");
    for stage in [Stage::BrandProfile, Stage::Generate, Stage::Critique, Stage::Refine] {
        assert!(
            record.stages.iter().any(|s| s.stage == stage && s.completed_at.is_some()),
            "stage {stage} missing from record"
        );
    }
}

#[tokio::test]
async fn video_run_cannot_repair_and_exhausts_retries() {
    let mut config = AppConfig::default();
    config.workflow.max_retries = 2;
    let engine = demo_engine(config);

    let outcome = engine
        .execute(RunRequest {
            prompt: "A teaser clip for the summer sale".into(),
            media_kind: MediaKind::Video,
            style_source: None,
        })
        .await;

    // The demo defect is pixel-simple, but video has no local repair
    // path, so every cycle regenerates until the budget is gone.
    assert_eq!(outcome.status, RunStatus::Failed);
    assert_eq!(outcome.error.as_deref(), Some("maximum retries reached"));
    assert_eq!(outcome.retry_count, 2);

    // The evidence of the last critique is still persisted.
    let view = engine.status(outcome.run_id).expect("run is pollable");
    assert!(view.critique_report.is_some());
    assert!(view.final_artifact.is_some());
}

#[tokio::test]
async fn runs_are_isolated_and_concurrent() {
    let engine = std::sync::Arc::new(demo_engine(AppConfig::default()));

    let mut handles = Vec::new();
    for i in 0..4 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .execute(RunRequest {
                    prompt: format!("banner {i}"),
                    media_kind: MediaKind::Image,
                    style_source: None,
                })
                .await
        }));
    }

    let mut run_ids = Vec::new();
    for handle in handles {
        let outcome = handle.await.expect("run task completed");
        assert_eq!(outcome.status, RunStatus::Completed);
        run_ids.push(outcome.run_id);
    }

    run_ids.sort();
    run_ids.dedup();
    assert_eq!(run_ids.len(), 4);
    assert_eq!(engine.registry().len(), 4);
}
