use crate::SchedError;
use frontier_lifecycle::Lifecycle;
use frontier_primitives::ScoredTask;
use tokio_util::sync::CancellationToken;

/// The contract shared by [`crate::BufferedScheduler`] and
/// [`crate::UnbufferedScheduler`]. `enqueue`/`dequeue` each take the
/// *caller's* cancellation token, independent of whatever token the
/// scheduler derived for itself in `start` — a cancelled caller token only
/// ever affects that one call.
///
/// `dequeue` returning `None` is the unambiguous end-of-stream signal
/// (caller cancellation or scheduler shutdown); `None` is never returned
/// for any other reason, and a task is never represented as `None`.
#[async_trait::async_trait]
pub trait Scheduler<T: Send + 'static>: Lifecycle {
    async fn enqueue(&self, ctx: &CancellationToken, task: ScoredTask<T>) -> Result<(), SchedError>;
    async fn dequeue(&self, ctx: &CancellationToken) -> Option<ScoredTask<T>>;
}
