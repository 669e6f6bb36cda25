use std::collections::HashMap;

use brandforge_core::config::CritiqueSettings;

use crate::types::{Dimension, ScoreCard};

/// Pass/fail thresholds applied by the scorer.
#[derive(Debug, Clone, Copy)]
pub struct ScoringThresholds {
    /// Minimum overall score for a variation to pass.
    pub overall_threshold: f64,
    /// Minimum score every single dimension must reach.
    pub dimension_floor: f64,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            overall_threshold: 0.6,
            dimension_floor: 0.4,
        }
    }
}

impl From<&CritiqueSettings> for ScoringThresholds {
    fn from(settings: &CritiqueSettings) -> Self {
        Self {
            overall_threshold: settings.overall_threshold,
            dimension_floor: settings.dimension_floor,
        }
    }
}

/// Aggregates a set of scorecards into an overall score and a pass/fail
/// verdict.
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    thresholds: ScoringThresholds,
}

impl Scorer {
    pub fn new(thresholds: ScoringThresholds) -> Self {
        Self { thresholds }
    }

    /// Weighted mean of the dimension scores, clamped to [0, 1].
    ///
    /// Missing weights mean equal weighting across the dimensions that
    /// are present. A supplied weight table whose sum over the present
    /// dimensions is zero also falls back to equal weighting.
    pub fn overall_score(
        &self,
        scorecards: &[ScoreCard],
        weights: Option<&HashMap<Dimension, f64>>,
    ) -> f64 {
        if scorecards.is_empty() {
            return 0.0;
        }

        let equal_mean = || {
            let sum: f64 = scorecards.iter().map(|c| c.score).sum();
            sum / scorecards.len() as f64
        };

        let overall = match weights {
            Some(w) => {
                let total_weight: f64 = scorecards
                    .iter()
                    .map(|c| w.get(&c.dimension).copied().unwrap_or(0.0))
                    .sum();
                if total_weight > 0.0 {
                    let weighted_sum: f64 = scorecards
                        .iter()
                        .map(|c| c.score * w.get(&c.dimension).copied().unwrap_or(0.0))
                        .sum();
                    weighted_sum / total_weight
                } else {
                    equal_mean()
                }
            }
            None => equal_mean(),
        };

        overall.clamp(0.0, 1.0)
    }

    /// A variation passes only when the overall score clears the
    /// threshold AND no single dimension sits below the floor. The
    /// double condition keeps one catastrophic dimension from being
    /// averaged away.
    pub fn determine_pass(&self, overall_score: f64, scorecards: &[ScoreCard]) -> bool {
        if overall_score < self.thresholds.overall_threshold {
            return false;
        }
        scorecards
            .iter()
            .all(|c| c.score >= self.thresholds.dimension_floor)
    }
}
