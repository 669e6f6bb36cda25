use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Brand profile extraction error: {0}")]
    ProfileExtraction(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Critique error: {0}")]
    Critique(String),

    #[error("Repair error: {0}")]
    Repair(String),

    #[error("Prompt refinement error: {0}")]
    PromptRefinement(String),

    #[error("Run {0} not found")]
    RunNotFound(uuid::Uuid),

    #[error("maximum retries reached")]
    RetryExhausted,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
