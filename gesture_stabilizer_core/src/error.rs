use thiserror::Error;

/// Errors surfaced by the stabilizer core.
///
/// The ingest-time variants are contract violations between collaborators
/// (classifier output vs. label catalog). They are never retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StabilizerError {
    #[error("label catalog is empty")]
    EmptyCatalog,

    #[error("distribution is empty")]
    EmptyDistribution,

    #[error("distribution has {got} values but the label catalog has {expected}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("distribution value at index {index} is not finite")]
    NonFiniteProbability { index: usize },

    #[error("invalid stabilizer config: {0}")]
    InvalidConfig(String),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("invalid model metadata: {0}")]
    Metadata(String),
}

impl From<serde_json::Error> for StabilizerError {
    fn from(e: serde_json::Error) -> Self {
        StabilizerError::Metadata(e.to_string())
    }
}
