//! Critique engine: fans out the dimension evaluators over each
//! candidate variation, scores, ranks, and assembles the report.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use brandforge_core::types::{ArtifactRef, MediaKind, StyleProfile};

use crate::evaluator::{EvaluationContext, EvaluatorSet};
use crate::ranker::Ranker;
use crate::scorer::Scorer;
use crate::types::{CritiqueReport, VariationResult};

pub struct CritiqueEngine {
    evaluators: EvaluatorSet,
    scorer: Scorer,
    ranker: Ranker,
}

impl CritiqueEngine {
    pub fn new(evaluators: EvaluatorSet, scorer: Scorer) -> Self {
        Self {
            evaluators,
            scorer,
            ranker: Ranker::new(),
        }
    }

    /// Evaluate a batch of candidate artifacts and produce the ranked
    /// critique report. Each variation gets a fresh scorecard set; the
    /// per-variation fan-out is the only intra-run parallelism.
    pub async fn evaluate_variations(
        &self,
        run_id: Uuid,
        artifacts: &[ArtifactRef],
        style_profile: Option<Arc<StyleProfile>>,
        media_kind: MediaKind,
        intent: Option<&str>,
    ) -> CritiqueReport {
        let start = std::time::Instant::now();
        info!(
            run_id = %run_id,
            variations = artifacts.len(),
            media = %media_kind,
            "Evaluating variations"
        );

        let mut results = Vec::with_capacity(artifacts.len());

        for (i, artifact) in artifacts.iter().enumerate() {
            let variation_id = format!("var_{}", i + 1);
            let ctx = EvaluationContext {
                artifact: artifact.clone(),
                style_profile: style_profile.clone(),
                media_kind,
                intent: intent.map(str::to_owned),
            };

            let scorecards = self.evaluators.evaluate_all(&ctx).await;
            let overall_score = self.scorer.overall_score(&scorecards, None);
            let passed = self.scorer.determine_pass(overall_score, &scorecards);

            results.push(VariationResult {
                variation_id,
                artifact: artifact.clone(),
                overall_score,
                scorecards,
                passed,
                rank: None,
            });
        }

        let ranked = self.ranker.rank(results);
        let report = CritiqueReport::from_ranked(run_id, ranked);

        metrics::histogram!("critique.latency_us").record(start.elapsed().as_micros() as f64);
        info!(
            run_id = %run_id,
            passed = report.passed_variations,
            total = report.total_variations,
            "Critique complete"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::DimensionEvaluator;
    use crate::scorer::ScoringThresholds;
    use crate::types::{Dimension, ScoreCard};
    use async_trait::async_trait;
    use std::time::Duration;

    struct UriScoredEvaluator {
        dimension: Dimension,
    }

    #[async_trait]
    impl DimensionEvaluator for UriScoredEvaluator {
        fn dimension(&self) -> Dimension {
            self.dimension
        }

        // Score encoded in the artifact URI, e.g. "mem://ad-80.png" -> 0.8.
        async fn evaluate(&self, ctx: &EvaluationContext) -> anyhow::Result<ScoreCard> {
            let digits: String = ctx
                .artifact
                .uri
                .chars()
                .filter(|c| c.is_ascii_digit())
                .collect();
            let score = digits.parse::<f64>().unwrap_or(50.0) / 100.0;
            Ok(ScoreCard::new(self.dimension, score, "scored", vec![], vec![]))
        }
    }

    fn engine() -> CritiqueEngine {
        let mut set = EvaluatorSet::new(Duration::from_secs(1));
        for dimension in Dimension::ALL {
            set.register(Arc::new(UriScoredEvaluator { dimension }));
        }
        CritiqueEngine::new(set, Scorer::new(ScoringThresholds::default()))
    }

    #[tokio::test]
    async fn test_report_ranks_batch() {
        let artifacts = vec![
            ArtifactRef::new("mem://ad-50.png", MediaKind::Image),
            ArtifactRef::new("mem://ad-90.png", MediaKind::Image),
            ArtifactRef::new("mem://ad-70.png", MediaKind::Image),
        ];

        let report = engine()
            .evaluate_variations(Uuid::new_v4(), &artifacts, None, MediaKind::Image, None)
            .await;

        assert_eq!(report.total_variations, 3);
        assert_eq!(report.passed_variations, 2); // 0.9 and 0.7 pass, 0.5 fails
        let best = report.best_variation.unwrap();
        assert_eq!(best.rank, Some(1));
        assert!((best.overall_score - 0.9).abs() < 1e-9);
        assert_eq!(best.variation_id, "var_2");
    }

    #[tokio::test]
    async fn test_empty_batch_produces_empty_report() {
        let report = engine()
            .evaluate_variations(Uuid::new_v4(), &[], None, MediaKind::Image, None)
            .await;
        assert_eq!(report.total_variations, 0);
        assert!(report.best_variation.is_none());
    }
}
