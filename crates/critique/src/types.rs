use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use brandforge_core::types::ArtifactRef;

/// The fixed set of quality dimensions every variation is evaluated on.
/// Declaration order is the canonical merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    BrandAlignment,
    VisualQuality,
    MessageClarity,
    Safety,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::BrandAlignment,
        Dimension::VisualQuality,
        Dimension::MessageClarity,
        Dimension::Safety,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::BrandAlignment => "brand_alignment",
            Dimension::VisualQuality => "visual_quality",
            Dimension::MessageClarity => "message_clarity",
            Dimension::Safety => "safety",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The evaluation result for one dimension of one variation. Never
/// mutated after construction; each critique pass builds a fresh set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreCard {
    pub dimension: Dimension,
    pub score: f64,
    pub feedback: String,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ScoreCard {
    /// Build a scorecard, clamping the score into [0, 1] before storage.
    pub fn new(
        dimension: Dimension,
        score: f64,
        feedback: impl Into<String>,
        issues: Vec<String>,
        suggestions: Vec<String>,
    ) -> Self {
        Self {
            dimension,
            score: score.clamp(0.0, 1.0),
            feedback: feedback.into(),
            issues,
            suggestions,
        }
    }
}

/// One candidate artifact with its per-dimension scorecards. The overall
/// score and passed flag are derived by the scorer, never set directly;
/// rank is assigned only by the ranker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariationResult {
    pub variation_id: String,
    pub artifact: ArtifactRef,
    pub overall_score: f64,
    pub scorecards: Vec<ScoreCard>,
    pub passed: bool,
    pub rank: Option<u32>,
}

impl VariationResult {
    /// Returns the score for the given dimension, if it was evaluated.
    pub fn dimension_score(&self, dimension: Dimension) -> Option<f64> {
        self.scorecards
            .iter()
            .find(|c| c.dimension == dimension)
            .map(|c| c.score)
    }
}

/// Complete critique result for one evaluation pass over a batch of
/// variations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CritiqueReport {
    pub run_id: Uuid,
    pub total_variations: usize,
    pub passed_variations: usize,
    pub failed_variations: usize,
    pub best_variation: Option<VariationResult>,
    pub all_variations: Vec<VariationResult>,
    pub generated_at: DateTime<Utc>,
}

impl CritiqueReport {
    /// Assemble a report from an already-ranked variation list. Counts
    /// are derived so that passed + failed == total always holds, and
    /// the best variation is the rank-1 entry.
    pub fn from_ranked(run_id: Uuid, ranked: Vec<VariationResult>) -> Self {
        let total = ranked.len();
        let passed = ranked.iter().filter(|v| v.passed).count();
        Self {
            run_id,
            total_variations: total,
            passed_variations: passed,
            failed_variations: total - passed,
            best_variation: ranked.first().cloned(),
            all_variations: ranked,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brandforge_core::types::MediaKind;

    fn card(dimension: Dimension, score: f64) -> ScoreCard {
        ScoreCard::new(dimension, score, "ok", vec![], vec![])
    }

    #[test]
    fn test_score_clamped_on_construction() {
        assert_eq!(card(Dimension::Safety, 1.7).score, 1.0);
        assert_eq!(card(Dimension::Safety, -0.2).score, 0.0);
        assert_eq!(card(Dimension::Safety, 0.42).score, 0.42);
    }

    #[test]
    fn test_report_counts_are_consistent() {
        let artifact = ArtifactRef::new("mem://a.png", MediaKind::Image);
        let variations = vec![
            VariationResult {
                variation_id: "var_1".into(),
                artifact: artifact.clone(),
                overall_score: 0.8,
                scorecards: vec![card(Dimension::Safety, 0.8)],
                passed: true,
                rank: Some(1),
            },
            VariationResult {
                variation_id: "var_2".into(),
                artifact,
                overall_score: 0.3,
                scorecards: vec![card(Dimension::Safety, 0.3)],
                passed: false,
                rank: Some(2),
            },
        ];

        let report = CritiqueReport::from_ranked(Uuid::new_v4(), variations);
        assert_eq!(report.total_variations, 2);
        assert_eq!(
            report.passed_variations + report.failed_variations,
            report.total_variations
        );
        let best = report.best_variation.unwrap();
        assert_eq!(best.rank, Some(1));
        assert_eq!(best.variation_id, "var_1");
    }
}
