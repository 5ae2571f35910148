use crate::{SchedError, Scheduler};
use frontier_lifecycle::{Lifecycle, LifecycleError};
use frontier_primitives::ScoredTask;
use frontier_queue::Queue;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Distinguishes "never started" (`None`) from "stopped" (a cancelled
/// token is kept around so callers racing a shutdown observe cancellation
/// rather than a misleading "not started" error).
enum RunState {
    Running(CancellationToken),
    Stopped(CancellationToken),
}

impl RunState {
    fn token(&self) -> CancellationToken {
        match self {
            RunState::Running(t) | RunState::Stopped(t) => t.clone(),
        }
    }
}

/// Forwards `enqueue`/`dequeue` straight to the backend queue: no
/// buffering, no background workers. Useful when the backend is already
/// fast/local and the prefetch/flush machinery would only add latency.
pub struct UnbufferedScheduler<T> {
    queue: Arc<dyn Queue<T>>,
    state: Mutex<Option<RunState>>,
}

impl<T: Send + 'static> UnbufferedScheduler<T> {
    pub fn new(queue: Arc<dyn Queue<T>>) -> Self {
        Self { queue, state: Mutex::new(None) }
    }

    fn scheduler_token(&self) -> Result<CancellationToken, SchedError> {
        self.state.lock().as_ref().map(RunState::token).ok_or(SchedError::NotStarted)
    }
}

#[async_trait::async_trait]
impl<T: Send + 'static> Lifecycle for UnbufferedScheduler<T> {
    async fn start(&self, parent: &CancellationToken) -> Result<(), LifecycleError> {
        let mut state = self.state.lock();
        if matches!(*state, Some(RunState::Running(_))) {
            return Err(LifecycleError::AlreadyStarted);
        }
        *state = Some(RunState::Running(parent.child_token()));
        Ok(())
    }

    async fn stop(&self) -> Result<(), LifecycleError> {
        let mut state = self.state.lock();
        let token = match state.take() {
            Some(RunState::Running(token)) => token,
            other => {
                *state = other;
                return Err(LifecycleError::NotStarted);
            }
        };
        token.cancel();
        *state = Some(RunState::Stopped(token));
        Ok(())
    }
}

#[async_trait::async_trait]
impl<T: Send + 'static> Scheduler<T> for UnbufferedScheduler<T> {
    async fn enqueue(&self, ctx: &CancellationToken, task: ScoredTask<T>) -> Result<(), SchedError> {
        let sched_token = self.scheduler_token()?;
        tokio::select! {
            biased;
            _ = sched_token.cancelled() => Err(SchedError::ContextCancelled),
            _ = ctx.cancelled() => Err(SchedError::ContextCancelled),
            res = self.queue.enqueue(vec![task]) => Ok(res?),
        }
    }

    async fn dequeue(&self, ctx: &CancellationToken) -> Option<ScoredTask<T>> {
        let sched_token = self.scheduler_token().ok()?;
        // A fresh single-slot channel per call: the backend writes at most
        // one item into it, which this call alone consumes. This avoids
        // sharing one receiver across concurrently-calling consumers.
        let (tx, mut rx) = mpsc::channel(1);
        let n = tokio::select! {
            biased;
            _ = sched_token.cancelled() => return None,
            _ = ctx.cancelled() => return None,
            res = self.queue.dequeue(1, &tx) => res,
        };
        match n {
            Ok(1) => rx.recv().await,
            _ => None,
        }
    }
}
