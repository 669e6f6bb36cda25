//! Refinement decision policy: a pure function from the top-ranked
//! variation and the media kind to one of four strategies.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use brandforge_core::config::CritiqueSettings;
use brandforge_core::types::MediaKind;
use brandforge_critique::types::{Dimension, ScoreCard, VariationResult};

use crate::classifier::{IssueClass, IssueClassifier, KeywordClassifier};

/// The four possible outcomes of a refinement decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinementStrategy {
    /// The artifact ships as-is.
    Approve,
    /// Local pixel-level fix-up, then re-critique.
    Enhance,
    /// Full re-synthesis with an improved prompt.
    Regenerate,
    /// Cannot be auto-repaired; the run concludes without shipping.
    Reject,
}

impl std::fmt::Display for RefinementStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RefinementStrategy::Approve => "approve",
            RefinementStrategy::Enhance => "enhance",
            RefinementStrategy::Regenerate => "regenerate",
            RefinementStrategy::Reject => "reject",
        };
        f.write_str(s)
    }
}

/// Score gates applied before the content-based routing.
#[derive(Debug, Clone, Copy)]
pub struct PolicyThresholds {
    /// Overall score at or above which (with no flagged dimension) the
    /// artifact is approved. Dimensions below this value are "flagged"
    /// and their feedback drives the enhance/regenerate routing.
    pub approve_threshold: f64,
    /// Overall score below which the artifact is rejected.
    pub reject_threshold: f64,
    /// Safety score below which the artifact is rejected no matter what
    /// the other dimensions say.
    pub safety_floor: f64,
}

impl Default for PolicyThresholds {
    fn default() -> Self {
        Self {
            approve_threshold: 0.7,
            reject_threshold: 0.3,
            safety_floor: 0.3,
        }
    }
}

impl From<&CritiqueSettings> for PolicyThresholds {
    fn from(settings: &CritiqueSettings) -> Self {
        Self {
            approve_threshold: settings.approve_threshold,
            reject_threshold: settings.reject_threshold,
            safety_floor: settings.safety_floor,
        }
    }
}

/// Two-level decision: a hard safety/score gate, then a content-based
/// router between the cheap local fix-up and full re-synthesis.
pub struct RefinementPolicy {
    thresholds: PolicyThresholds,
    classifier: Arc<dyn IssueClassifier>,
}

impl RefinementPolicy {
    pub fn new(thresholds: PolicyThresholds) -> Self {
        Self {
            thresholds,
            classifier: Arc::new(KeywordClassifier::new()),
        }
    }

    /// Swap in a different issue classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn IssueClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn decide(&self, top: &VariationResult, media_kind: MediaKind) -> RefinementStrategy {
        // A critical safety failure cannot be auto-repaired.
        if let Some(safety) = top.dimension_score(Dimension::Safety) {
            if safety < self.thresholds.safety_floor {
                debug!(safety, "Safety floor breached, rejecting");
                return RefinementStrategy::Reject;
            }
        }

        if top.overall_score < self.thresholds.reject_threshold {
            return RefinementStrategy::Reject;
        }

        let flagged: Vec<&ScoreCard> = top
            .scorecards
            .iter()
            .filter(|c| c.score < self.thresholds.approve_threshold)
            .collect();

        if top.overall_score >= self.thresholds.approve_threshold && flagged.is_empty() {
            return RefinementStrategy::Approve;
        }

        // Mid-band: route by what the flagged dimensions complain about.
        let all_simple = flagged
            .iter()
            .flat_map(|card| flagged_text(card))
            .all(|text| self.classifier.classify(&text) == IssueClass::Simple);

        if all_simple && media_kind.supports_local_repair() {
            RefinementStrategy::Enhance
        } else {
            RefinementStrategy::Regenerate
        }
    }
}

/// The feedback and issue strings of one flagged scorecard.
fn flagged_text(card: &ScoreCard) -> impl Iterator<Item = String> + '_ {
    let feedback = (!card.feedback.is_empty()).then(|| card.feedback.clone());
    feedback.into_iter().chain(card.issues.iter().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brandforge_core::types::ArtifactRef;

    fn variation(scores: [f64; 4], issues: &[(Dimension, &str)]) -> VariationResult {
        let scorecards: Vec<ScoreCard> = Dimension::ALL
            .iter()
            .zip(scores)
            .map(|(d, s)| {
                let dim_issues: Vec<String> = issues
                    .iter()
                    .filter(|(dim, _)| dim == d)
                    .map(|(_, text)| text.to_string())
                    .collect();
                ScoreCard::new(*d, s, "", dim_issues, vec![])
            })
            .collect();
        let overall = scores.iter().sum::<f64>() / 4.0;

        VariationResult {
            variation_id: "var_1".into(),
            artifact: ArtifactRef::new("mem://ad.png", MediaKind::Image),
            overall_score: overall,
            scorecards,
            passed: overall >= 0.6 && scores.iter().all(|s| *s >= 0.4),
            rank: Some(1),
        }
    }

    fn policy() -> RefinementPolicy {
        RefinementPolicy::new(PolicyThresholds::default())
    }

    #[test]
    fn test_all_good_approves() {
        let v = variation([0.9, 0.9, 0.9, 0.9], &[]);
        assert!((v.overall_score - 0.9).abs() < 1e-9);
        assert!(v.passed);
        assert_eq!(policy().decide(&v, MediaKind::Image), RefinementStrategy::Approve);
    }

    #[test]
    fn test_safety_floor_rejects_unconditionally() {
        // Overall 0.9 can't save a 0.2 safety score.
        let v = variation([1.0, 1.0, 1.0, 0.2], &[]);
        assert!(v.overall_score > 0.7);
        assert_eq!(policy().decide(&v, MediaKind::Image), RefinementStrategy::Reject);
    }

    #[test]
    fn test_very_low_overall_rejects() {
        let v = variation([0.2, 0.2, 0.3, 0.4], &[]);
        assert_eq!(policy().decide(&v, MediaKind::Image), RefinementStrategy::Reject);
    }

    #[test]
    fn test_simple_issues_enhance_for_images_only() {
        let issues = [
            (Dimension::BrandAlignment, "slight blur on the headline"),
            (Dimension::VisualQuality, "blurry edges"),
        ];
        let v = variation([0.5, 0.5, 0.9, 1.0], &issues);

        assert_eq!(policy().decide(&v, MediaKind::Image), RefinementStrategy::Enhance);
        assert_eq!(policy().decide(&v, MediaKind::Video), RefinementStrategy::Regenerate);
    }

    #[test]
    fn test_complex_issue_forces_regenerate() {
        let issues = [(Dimension::BrandAlignment, "logo is distorted")];
        let v = variation([0.2, 0.9, 0.9, 0.9], &issues);
        // Overall 0.725 is above the approve bar, but the flagged brand
        // dimension carries a complex issue.
        assert!(v.overall_score >= 0.7);
        assert_eq!(policy().decide(&v, MediaKind::Image), RefinementStrategy::Regenerate);
    }

    #[test]
    fn test_mixed_issues_regenerate() {
        let issues = [
            (Dimension::VisualQuality, "noisy background"),
            (Dimension::MessageClarity, "message is unclear"),
        ];
        let v = variation([0.8, 0.5, 0.5, 0.9], &issues);
        assert_eq!(policy().decide(&v, MediaKind::Image), RefinementStrategy::Regenerate);
    }

    #[test]
    fn test_custom_classifier_is_plugged_in() {
        struct AlwaysSimple;
        impl IssueClassifier for AlwaysSimple {
            fn classify(&self, _text: &str) -> IssueClass {
                IssueClass::Simple
            }
        }

        let issues = [(Dimension::BrandAlignment, "logo is distorted")];
        let v = variation([0.5, 0.9, 0.9, 0.9], &issues);

        let lenient = policy().with_classifier(Arc::new(AlwaysSimple));
        assert_eq!(lenient.decide(&v, MediaKind::Image), RefinementStrategy::Enhance);
    }
}
