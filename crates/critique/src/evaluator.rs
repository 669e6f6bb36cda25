//! Dimension evaluators and the concurrent fan-out that drives them.
//!
//! Each registered evaluator runs in its own task with an isolated error
//! boundary: a failure, panic, or timeout in one evaluator substitutes a
//! neutral scorecard instead of failing the whole critique.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{info, warn};

use brandforge_core::types::{ArtifactRef, MediaKind, StyleProfile};

use crate::types::{Dimension, ScoreCard};

/// Everything an evaluator may look at. Handed to each fan-out task by
/// value; evaluators share no mutable state.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    pub artifact: ArtifactRef,
    pub style_profile: Option<Arc<StyleProfile>>,
    pub media_kind: MediaKind,
    /// Original intent text of the request, for evaluators that judge
    /// message fit.
    pub intent: Option<String>,
}

/// One independent quality-dimension evaluator. The analysis behind the
/// score is opaque to the pipeline; the contract is a bounded call that
/// returns a scorecard for its declared dimension.
#[async_trait]
pub trait DimensionEvaluator: Send + Sync {
    fn dimension(&self) -> Dimension;

    async fn evaluate(&self, ctx: &EvaluationContext) -> anyhow::Result<ScoreCard>;
}

/// The registered evaluators for a pipeline, keyed by dimension.
pub struct EvaluatorSet {
    evaluators: Vec<Arc<dyn DimensionEvaluator>>,
    evaluator_timeout: Duration,
}

impl EvaluatorSet {
    pub fn new(evaluator_timeout: Duration) -> Self {
        Self {
            evaluators: Vec::new(),
            evaluator_timeout,
        }
    }

    /// Register an evaluator. Registration is keyed by dimension: a
    /// second evaluator for the same dimension replaces the first, so
    /// scorecard keys stay unique by construction.
    pub fn register(&mut self, evaluator: Arc<dyn DimensionEvaluator>) {
        self.evaluators
            .retain(|e| e.dimension() != evaluator.dimension());
        self.evaluators.push(evaluator);
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }

    /// Run every registered evaluator concurrently against one artifact
    /// and block until all have returned or defaulted. Results are
    /// merged in canonical dimension order regardless of completion
    /// order.
    pub async fn evaluate_all(&self, ctx: &EvaluationContext) -> Vec<ScoreCard> {
        let mut handles = Vec::with_capacity(self.evaluators.len());

        for evaluator in &self.evaluators {
            let evaluator = Arc::clone(evaluator);
            let ctx = ctx.clone();
            let deadline = self.evaluator_timeout;
            let dimension = evaluator.dimension();

            let handle = tokio::spawn(async move {
                timeout(deadline, evaluator.evaluate(&ctx)).await
            });
            handles.push((dimension, handle));
        }

        let mut collected: Vec<ScoreCard> = Vec::with_capacity(handles.len());
        for (dimension, handle) in handles {
            let card = match handle.await {
                Ok(Ok(Ok(card))) => card,
                Ok(Ok(Err(e))) => {
                    warn!(dimension = %dimension, error = %e, "Evaluator failed, substituting neutral score");
                    metrics::counter!("critique.evaluator_failures").increment(1);
                    neutral_card(dimension, "evaluator error")
                }
                Ok(Err(_elapsed)) => {
                    warn!(dimension = %dimension, "Evaluator timed out, substituting neutral score");
                    metrics::counter!("critique.evaluator_failures").increment(1);
                    neutral_card(dimension, "evaluator timed out")
                }
                Err(join_err) => {
                    warn!(dimension = %dimension, error = %join_err, "Evaluator task panicked, substituting neutral score");
                    metrics::counter!("critique.evaluator_failures").increment(1);
                    neutral_card(dimension, "evaluator task panicked")
                }
            };
            collected.push(card);
        }

        // Completion order is arbitrary; re-impose the canonical order.
        let mut merged = Vec::with_capacity(collected.len());
        for dimension in Dimension::ALL {
            if let Some(pos) = collected.iter().position(|c| c.dimension == dimension) {
                merged.push(collected.swap_remove(pos));
            }
        }
        // Evaluators for dimensions outside the fixed set don't exist,
        // but keep anything unexpected rather than dropping it.
        merged.extend(collected);

        info!(
            artifact = %ctx.artifact.uri,
            dimensions = merged.len(),
            "Evaluation fan-out complete"
        );

        merged
    }
}

/// Mid-range stand-in for a dimension whose evaluator was unavailable.
fn neutral_card(dimension: Dimension, reason: &str) -> ScoreCard {
    ScoreCard::new(
        dimension,
        0.5,
        format!("{} evaluation unavailable ({reason}); neutral score substituted", dimension),
        vec![],
        vec![],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use brandforge_core::types::MediaKind;

    struct FixedEvaluator {
        dimension: Dimension,
        score: f64,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl DimensionEvaluator for FixedEvaluator {
        fn dimension(&self) -> Dimension {
            self.dimension
        }

        async fn evaluate(&self, _ctx: &EvaluationContext) -> anyhow::Result<ScoreCard> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(ScoreCard::new(self.dimension, self.score, "ok", vec![], vec![]))
        }
    }

    struct FailingEvaluator;

    #[async_trait]
    impl DimensionEvaluator for FailingEvaluator {
        fn dimension(&self) -> Dimension {
            Dimension::VisualQuality
        }

        async fn evaluate(&self, _ctx: &EvaluationContext) -> anyhow::Result<ScoreCard> {
            anyhow::bail!("analyzer backend unreachable")
        }
    }

    struct PanickingEvaluator;

    #[async_trait]
    impl DimensionEvaluator for PanickingEvaluator {
        fn dimension(&self) -> Dimension {
            Dimension::MessageClarity
        }

        async fn evaluate(&self, _ctx: &EvaluationContext) -> anyhow::Result<ScoreCard> {
            panic!("evaluator bug")
        }
    }

    fn test_ctx() -> EvaluationContext {
        EvaluationContext {
            artifact: ArtifactRef::new("mem://ad.png", MediaKind::Image),
            style_profile: None,
            media_kind: MediaKind::Image,
            intent: Some("test ad".into()),
        }
    }

    fn set_with(evaluators: Vec<Arc<dyn DimensionEvaluator>>) -> EvaluatorSet {
        let mut set = EvaluatorSet::new(Duration::from_millis(200));
        for e in evaluators {
            set.register(e);
        }
        set
    }

    #[tokio::test]
    async fn test_merge_order_is_canonical() {
        // Register out of order with a slow first dimension; the merge
        // must still come back in canonical order.
        let set = set_with(vec![
            Arc::new(FixedEvaluator {
                dimension: Dimension::Safety,
                score: 0.9,
                delay: None,
            }),
            Arc::new(FixedEvaluator {
                dimension: Dimension::BrandAlignment,
                score: 0.8,
                delay: Some(Duration::from_millis(50)),
            }),
            Arc::new(FixedEvaluator {
                dimension: Dimension::VisualQuality,
                score: 0.7,
                delay: None,
            }),
            Arc::new(FixedEvaluator {
                dimension: Dimension::MessageClarity,
                score: 0.6,
                delay: None,
            }),
        ]);

        let cards = set.evaluate_all(&test_ctx()).await;
        let dims: Vec<Dimension> = cards.iter().map(|c| c.dimension).collect();
        assert_eq!(dims, Dimension::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_failure_substitutes_neutral_default() {
        let set = set_with(vec![
            Arc::new(FixedEvaluator {
                dimension: Dimension::BrandAlignment,
                score: 0.8,
                delay: None,
            }),
            Arc::new(FailingEvaluator),
        ]);

        let cards = set.evaluate_all(&test_ctx()).await;
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].score, 0.8);
        assert_eq!(cards[1].dimension, Dimension::VisualQuality);
        assert_eq!(cards[1].score, 0.5);
        assert!(cards[1].feedback.contains("unavailable"));
    }

    #[tokio::test]
    async fn test_panic_is_isolated() {
        let set = set_with(vec![
            Arc::new(PanickingEvaluator),
            Arc::new(FixedEvaluator {
                dimension: Dimension::Safety,
                score: 1.0,
                delay: None,
            }),
        ]);

        let cards = set.evaluate_all(&test_ctx()).await;
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].dimension, Dimension::MessageClarity);
        assert_eq!(cards[0].score, 0.5);
        assert_eq!(cards[1].score, 1.0);
    }

    #[tokio::test]
    async fn test_timeout_substitutes_neutral_default() {
        let set = set_with(vec![Arc::new(FixedEvaluator {
            dimension: Dimension::VisualQuality,
            score: 0.9,
            delay: Some(Duration::from_secs(5)),
        })]);

        let cards = set.evaluate_all(&test_ctx()).await;
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].score, 0.5);
    }

    #[tokio::test]
    async fn test_same_dimension_registration_replaces() {
        let set = set_with(vec![
            Arc::new(FixedEvaluator {
                dimension: Dimension::Safety,
                score: 0.2,
                delay: None,
            }),
            Arc::new(FixedEvaluator {
                dimension: Dimension::Safety,
                score: 0.9,
                delay: None,
            }),
        ]);

        assert_eq!(set.len(), 1);
        let cards = set.evaluate_all(&test_ctx()).await;
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].score, 0.9);
    }
}
