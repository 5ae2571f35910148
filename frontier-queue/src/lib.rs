//! Ordered store of [`ScoredTask`]s: the backend a [`Scheduler`] drains
//! into and refills from. Fallible, `async`, and generic over the stored
//! value so a caller can swap in a durable backend without touching the
//! scheduler.

mod memory;

pub use memory::InMemoryQueue;

use frontier_primitives::ScoredTask;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// A generic ordered queue over `ScoredTask<T>`.
///
/// Implementations may be in-memory or disk-backed; the contract requires:
/// stable ordering by score descending (ties broken by insertion order),
/// tolerance for concurrent callers, and `dequeue` never removing more
/// items than it successfully delivers to `out`.
#[async_trait::async_trait]
pub trait Queue<T: Send + 'static>: Send + Sync {
    /// Atomically insert all `items`. Fails the whole batch rather than
    /// partially succeeding.
    async fn enqueue(&self, items: Vec<ScoredTask<T>>) -> Result<(), QueueError>;

    /// Remove up to `n` highest-scored items and deliver them to `out`.
    /// Returns the number of items actually delivered. Returns `Ok(0)`
    /// immediately when the queue is empty — this method never blocks
    /// waiting for items to arrive.
    ///
    /// If `out` has less than `n` slots of headroom, delivery stops at
    /// capacity: the method must not block the caller waiting for room,
    /// and any item popped from the backend but not delivered must be
    /// treated as not yet dequeued (left in, or restored to, the backend).
    async fn dequeue(&self, n: usize, out: &mpsc::Sender<ScoredTask<T>>) -> Result<usize, QueueError>;

    /// Approximate pending count. Advisory only — may be stale under
    /// concurrent mutation.
    async fn len(&self) -> usize;
}
