//! Scripted in-process providers for development, demos, and
//! integration tests. No real synthesis backend is involved: the
//! generator stamps attempt-numbered URIs, the repair provider tags the
//! URI, and the evaluators score off those markers.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use brandforge_core::config::AppConfig;
use brandforge_core::providers::{
    GenerationProvider, PromptImprover, RepairFlags, RepairProvider, StyleProfileProvider,
};
use brandforge_core::types::{ArtifactRef, BrandColor, MediaKind, StyleProfile};
use brandforge_critique::evaluator::{DimensionEvaluator, EvaluationContext, EvaluatorSet};
use brandforge_critique::scorer::{Scorer, ScoringThresholds};
use brandforge_critique::types::{Dimension, ScoreCard};
use brandforge_critique::CritiqueEngine;
use brandforge_refinement::{PolicyThresholds, RefinementPolicy};

use crate::engine::WorkflowEngine;
use crate::registry::RunRegistry;

/// Generator that stamps an attempt counter into the artifact URI.
#[derive(Default)]
pub struct DemoGenerator {
    attempts: AtomicU32,
}

#[async_trait]
impl GenerationProvider for DemoGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        media_kind: MediaKind,
        _style_profile: Option<&StyleProfile>,
    ) -> anyhow::Result<ArtifactRef> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        Ok(ArtifactRef::new(
            format!("demo://{media_kind}/attempt-{attempt}/creative"),
            media_kind,
        ))
    }
}

/// Repair provider that tags the URI so the evaluators see the fix.
pub struct DemoRepair;

#[async_trait]
impl RepairProvider for DemoRepair {
    async fn repair(
        &self,
        artifact: &ArtifactRef,
        _flags: RepairFlags,
    ) -> anyhow::Result<ArtifactRef> {
        Ok(ArtifactRef::new(
            format!("{}.repaired", artifact.uri),
            artifact.media_kind,
        ))
    }
}

/// Appends the critique's findings to the original prompt.
pub struct DemoPromptImprover;

#[async_trait]
impl PromptImprover for DemoPromptImprover {
    async fn improve(
        &self,
        original_prompt: &str,
        issues: &[String],
        _style_profile: Option<&StyleProfile>,
    ) -> anyhow::Result<String> {
        if issues.is_empty() {
            return Ok(original_prompt.to_string());
        }
        Ok(format!(
            "{original_prompt}. Avoid: {}",
            issues.join("; ")
        ))
    }
}

/// Returns a fixed demo brand profile for any source.
pub struct DemoStyleProfiles;

#[async_trait]
impl StyleProfileProvider for DemoStyleProfiles {
    async fn extract(&self, source: &str) -> anyhow::Result<StyleProfile> {
        Ok(StyleProfile {
            id: Uuid::new_v4(),
            display_name: format!("Demo Brand ({source})"),
            colors: vec![
                BrandColor {
                    name: "Primary Blue".into(),
                    hex: "#0052CC".into(),
                },
                BrandColor {
                    name: "Accent Orange".into(),
                    hex: "#FF5630".into(),
                },
            ],
            logo_uri: Some("demo://brand/logo".into()),
            product_uri: None,
            extracted_at: Utc::now(),
        })
    }
}

/// Marker-driven evaluator: the first generation shows a soft visual
/// defect that local repair fixes; every other dimension scores clean.
pub struct DemoEvaluator {
    dimension: Dimension,
}

#[async_trait]
impl DimensionEvaluator for DemoEvaluator {
    fn dimension(&self) -> Dimension {
        self.dimension
    }

    async fn evaluate(&self, ctx: &EvaluationContext) -> anyhow::Result<ScoreCard> {
        let repaired = ctx.artifact.uri.contains(".repaired");
        let card = match self.dimension {
            Dimension::VisualQuality if !repaired => ScoreCard::new(
                self.dimension,
                0.55,
                "hero area reads soft and washed out",
                vec![
                    "soft focus across the hero area".into(),
                    "slightly dull contrast".into(),
                ],
                vec!["sharpen the hero area".into(), "lift midtone contrast".into()],
            ),
            Dimension::VisualQuality => {
                ScoreCard::new(self.dimension, 0.9, "crisp after repair", vec![], vec![])
            }
            Dimension::BrandAlignment => {
                ScoreCard::new(self.dimension, 0.8, "palette matches the profile", vec![], vec![])
            }
            Dimension::MessageClarity => {
                ScoreCard::new(self.dimension, 0.85, "headline reads clearly", vec![], vec![])
            }
            Dimension::Safety => {
                ScoreCard::new(self.dimension, 0.95, "no safety concerns", vec![], vec![])
            }
        };
        Ok(card)
    }
}

/// Build the full evaluator set backed by the demo evaluators.
pub fn demo_evaluator_set(evaluator_timeout: Duration) -> EvaluatorSet {
    let mut set = EvaluatorSet::new(evaluator_timeout);
    for dimension in Dimension::ALL {
        set.register(Arc::new(DemoEvaluator { dimension }));
    }
    set
}

/// Wire a complete engine with demo collaborators.
pub fn demo_engine(config: AppConfig) -> WorkflowEngine {
    let evaluators = demo_evaluator_set(Duration::from_millis(config.critique.evaluator_timeout_ms));
    let critique = CritiqueEngine::new(
        evaluators,
        Scorer::new(ScoringThresholds::from(&config.critique)),
    );
    let policy = RefinementPolicy::new(PolicyThresholds::from(&config.critique));

    WorkflowEngine::new(
        config,
        Arc::new(RunRegistry::new()),
        critique,
        policy,
        Arc::new(DemoGenerator::default()),
        Arc::new(DemoRepair),
        Arc::new(DemoPromptImprover),
    )
    .with_style_profiles(Arc::new(DemoStyleProfiles))
}
