pub mod engine;
pub mod evaluator;
pub mod ranker;
pub mod scorer;
pub mod types;

pub use engine::CritiqueEngine;
pub use evaluator::{DimensionEvaluator, EvaluationContext, EvaluatorSet};
pub use ranker::Ranker;
pub use scorer::{Scorer, ScoringThresholds};
pub use types::{CritiqueReport, Dimension, ScoreCard, VariationResult};
