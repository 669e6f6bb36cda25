use brandforge_critique::types::{Dimension, VariationResult};

/// Everything the prompt-improvement provider needs to address the
/// critique's findings on the regenerate path.
#[derive(Debug, Clone, Default)]
pub struct RefinementContext {
    /// Deduplicated issue strings plus low-score summaries.
    pub issues: Vec<String>,
    /// Dimensions scoring below the approve bar, with their scores.
    pub low_scores: Vec<(Dimension, f64)>,
    /// Per-dimension summaries for badly failing dimensions, surfaced
    /// in terminal rejection context.
    pub critical_issues: Vec<String>,
}

/// Collect issues and low-score summaries from the top variation.
pub fn build_refinement_context(
    variation: &VariationResult,
    approve_threshold: f64,
) -> RefinementContext {
    let mut issues: Vec<String> = Vec::new();
    let mut low_scores = Vec::new();
    let mut critical_issues = Vec::new();

    for card in &variation.scorecards {
        for issue in &card.issues {
            if !issues.contains(issue) {
                issues.push(issue.clone());
            }
        }

        if card.score < 0.6 {
            let summary = format!("Low {} score: {}", card.dimension, card.feedback);
            if !issues.contains(&summary) {
                issues.push(summary);
            }
        }

        if card.score < approve_threshold {
            low_scores.push((card.dimension, card.score));
        }

        if card.score < 0.5 {
            let detail = if card.issues.is_empty() {
                "Low score".to_string()
            } else {
                card.issues.join(", ")
            };
            critical_issues.push(format!("{}: {}", card.dimension, detail));
        }
    }

    RefinementContext {
        issues,
        low_scores,
        critical_issues,
    }
}
