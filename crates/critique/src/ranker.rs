use crate::types::VariationResult;

/// Orders candidate variations by overall score with a deterministic
/// tie-break: equal scores keep their original evaluation order.
#[derive(Debug, Clone, Default)]
pub struct Ranker;

impl Ranker {
    pub fn new() -> Self {
        Self
    }

    /// Sort descending by overall score and assign 1-based ranks. The
    /// sort is stable, so equal-score entries are never reordered.
    pub fn rank(&self, mut variations: Vec<VariationResult>) -> Vec<VariationResult> {
        variations.sort_by(|a, b| {
            b.overall_score
                .partial_cmp(&a.overall_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for (i, variation) in variations.iter_mut().enumerate() {
            variation.rank = Some(i as u32 + 1);
        }

        variations
    }

    /// The best `n` variations from an already-ranked list.
    pub fn top_n<'a>(
        &self,
        ranked: &'a [VariationResult],
        n: usize,
    ) -> Vec<&'a VariationResult> {
        ranked.iter().take(n).collect()
    }

    /// Only the variations that passed evaluation, in rank order.
    pub fn passed_only<'a>(&self, ranked: &'a [VariationResult]) -> Vec<&'a VariationResult> {
        ranked.iter().filter(|v| v.passed).collect()
    }
}
