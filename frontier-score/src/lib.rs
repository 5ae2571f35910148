//! Scores are assigned by an external scoring function before enqueue and
//! are immutable thereafter. The frontier core never calls this trait — it
//! consumes the `ScoredTask` the caller already built — but deployments
//! need a named place to implement scoring, so it is part of the public
//! surface rather than left as an unstated convention.

use frontier_primitives::Task;
use thiserror::Error;

#[async_trait::async_trait]
pub trait Score<T>: Send + Sync {
    async fn score(&self, task: &Task<T>) -> Result<f64, ScoreError>;
}

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("scoring backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// A fixed score for every task, useful in tests and as a starting point
/// for deployments that have not yet implemented real scoring.
pub struct ConstantScore(pub f64);

#[async_trait::async_trait]
impl<T: Send + Sync> Score<T> for ConstantScore {
    async fn score(&self, _task: &Task<T>) -> Result<f64, ScoreError> {
        Ok(self.0)
    }
}
