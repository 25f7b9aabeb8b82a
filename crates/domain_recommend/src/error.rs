//! Recommendation errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("Scoring service request failed: {0}")]
    Remote(#[from] reqwest::Error),

    #[error("Scoring service returned {got} scores for {expected} listings")]
    ScoreCountMismatch { expected: usize, got: usize },

    #[error("Failed to serialize training example: {0}")]
    Serialization(#[from] serde_json::Error),
}
