use crate::policy::BufferPolicy;
use crate::{SchedError, Scheduler};
use frontier_lifecycle::{Lifecycle, LifecycleError};
use frontier_primitives::{BufferState, ScoredTask};
use frontier_queue::Queue;
use frontier_time::Duration;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex as AsyncMutex, Notify};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

struct Inner<T> {
    queue: Arc<dyn Queue<T>>,
    policy: Arc<dyn BufferPolicy>,

    prefetch_cap: usize,
    prefetch_tx: mpsc::Sender<ScoredTask<T>>,
    prefetch_rx: AsyncMutex<mpsc::Receiver<ScoredTask<T>>>,
    prefetch_signal: Notify,

    flush_cap: usize,
    flush_tx: mpsc::Sender<ScoredTask<T>>,
    flush_rx: AsyncMutex<mpsc::Receiver<ScoredTask<T>>>,
    flush_signal: Notify,
}

struct Running {
    cancel: CancellationToken,
    workers: JoinSet<()>,
}

/// Distinguishes "never started" (`None`) from "stopped" (a cancelled
/// token is kept around so callers racing a shutdown observe cancellation
/// rather than a misleading "not started" error).
enum RunState {
    Running(Running),
    Stopped(CancellationToken),
}

impl RunState {
    fn token(&self) -> CancellationToken {
        match self {
            RunState::Running(r) => r.cancel.clone(),
            RunState::Stopped(t) => t.clone(),
        }
    }
}

/// Dual-channel adapter over a [`Queue`] backend: a flush buffer producers
/// publish into (drained to the backend by a dedicated worker) and a
/// prefetch buffer consumers read from (refilled from the backend by
/// another dedicated worker). Amortizes backend round-trips and keeps
/// consumers from blocking on the backend on every single `dequeue`.
///
/// Runs a dedicated flush worker rather than flushing inline on the
/// producer's call stack, so a slow backend enqueue never blocks a
/// producer beyond the buffer's own backpressure.
pub struct BufferedScheduler<T> {
    inner: Arc<Inner<T>>,
    state: AsyncMutex<Option<RunState>>,
}

impl<T: Send + 'static> BufferedScheduler<T> {
    pub fn new(
        queue: Arc<dyn Queue<T>>,
        policy: Arc<dyn BufferPolicy>,
        prefetch_cap: usize,
        flush_cap: usize,
    ) -> Self {
        let (prefetch_tx, prefetch_rx) = mpsc::channel(prefetch_cap.max(1));
        let (flush_tx, flush_rx) = mpsc::channel(flush_cap.max(1));
        Self {
            inner: Arc::new(Inner {
                queue,
                policy,
                prefetch_cap,
                prefetch_tx,
                prefetch_rx: AsyncMutex::new(prefetch_rx),
                prefetch_signal: Notify::new(),
                flush_cap,
                flush_tx,
                flush_rx: AsyncMutex::new(flush_rx),
                flush_signal: Notify::new(),
            }),
            state: AsyncMutex::new(None),
        }
    }

}

#[async_trait::async_trait]
impl<T: Send + 'static> Lifecycle for BufferedScheduler<T> {
    async fn start(&self, parent: &CancellationToken) -> Result<(), LifecycleError> {
        let mut state = self.state.lock().await;
        if matches!(*state, Some(RunState::Running(_))) {
            return Err(LifecycleError::AlreadyStarted);
        }

        let cancel = parent.child_token();
        let mut workers = JoinSet::new();
        workers.spawn(prefetch_worker(self.inner.clone(), cancel.clone()));
        workers.spawn(flush_worker(self.inner.clone(), cancel.clone()));

        // Kick off an initial refill so the prefetch buffer isn't empty on
        // the very first `dequeue` if the backend already has work queued.
        self.inner.prefetch_signal.notify_one();

        *state = Some(RunState::Running(Running { cancel, workers }));
        Ok(())
    }

    async fn stop(&self) -> Result<(), LifecycleError> {
        let mut state = self.state.lock().await;
        let Running { cancel, mut workers } = match state.take() {
            Some(RunState::Running(running)) => running,
            other => {
                *state = other;
                return Err(LifecycleError::NotStarted);
            }
        };

        cancel.cancel();
        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                tracing::error!(target: "frontier::sched", error = %e, "scheduler worker panicked");
            }
        }
        *state = Some(RunState::Stopped(cancel));
        Ok(())
    }
}

#[async_trait::async_trait]
impl<T: Send + 'static> Scheduler<T> for BufferedScheduler<T> {
    #[tracing::instrument(target = "frontier::sched", level = "trace", skip_all)]
    async fn enqueue(&self, ctx: &CancellationToken, task: ScoredTask<T>) -> Result<(), SchedError> {
        let sched_token = {
            let state = self.state.lock().await;
            state.as_ref().ok_or(SchedError::NotStarted)?.token()
        };
        if sched_token.is_cancelled() {
            // Stopped (as opposed to never started): the backing channels
            // are still open and would accept this item, but nothing will
            // ever drain them again.
            return Err(SchedError::ContextCancelled);
        }

        // Fast path: non-blocking send. Still wakes the flush worker
        // afterwards — accepting an item can itself cross the policy's
        // flush threshold, and the worker is the only one that evaluates
        // that threshold.
        let task = match self.inner.flush_tx.try_send(task) {
            Ok(()) => {
                self.inner.flush_signal.notify_one();
                return Ok(());
            }
            Err(mpsc::error::TrySendError::Full(task)) => task,
            Err(mpsc::error::TrySendError::Closed(_)) => return Err(SchedError::ContextCancelled),
        };

        // Slow path: wake the flush worker (coalesced — Notify keeps at
        // most one outstanding permit) and wait for room, racing both
        // cancellation sources.
        self.inner.flush_signal.notify_one();
        tokio::select! {
            biased;
            _ = sched_token.cancelled() => Err(SchedError::ContextCancelled),
            _ = ctx.cancelled() => Err(SchedError::ContextCancelled),
            res = self.inner.flush_tx.send(task) => res.map_err(|_| SchedError::ContextCancelled),
        }
    }

    #[tracing::instrument(target = "frontier::sched", level = "trace", skip_all)]
    async fn dequeue(&self, ctx: &CancellationToken) -> Option<ScoredTask<T>> {
        let sched_token = {
            let state = self.state.lock().await;
            state.as_ref()?.token()
        };
        if sched_token.is_cancelled() {
            return None;
        }

        // Fast path: non-blocking receive. Still wakes the prefetch worker
        // afterwards — consuming an item can itself cross the policy's
        // refill threshold, and the worker is the only one that evaluates
        // that threshold.
        {
            let mut rx = self.inner.prefetch_rx.lock().await;
            if let Ok(task) = rx.try_recv() {
                drop(rx);
                self.inner.prefetch_signal.notify_one();
                return Some(task);
            }
        }

        // Slow path: wake the prefetch worker, then block for an item,
        // racing caller cancellation and scheduler shutdown.
        self.inner.prefetch_signal.notify_one();
        let mut rx = self.inner.prefetch_rx.lock().await;
        tokio::select! {
            biased;
            _ = ctx.cancelled() => None,
            _ = sched_token.cancelled() => None,
            task = rx.recv() => task,
        }
    }
}

async fn prefetch_worker<T: Send + 'static>(inner: Arc<Inner<T>>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = inner.prefetch_signal.notified() => {}
        }

        loop {
            let headroom = inner.prefetch_tx.capacity();
            let state = BufferState::new(inner.prefetch_cap.saturating_sub(headroom), inner.prefetch_cap);
            let count = inner.policy.prefetch(state);
            if count == 0 {
                break;
            }

            match inner.queue.dequeue(count, &inner.prefetch_tx).await {
                Ok(0) => break,
                Ok(_) => continue,
                Err(e) => {
                    // TODO(frontier-sched): add bounded exponential backoff
                    // before re-issuing `queue.dequeue` on repeated errors,
                    // instead of breaking out until the next signal.
                    tracing::warn!(target: "frontier::sched", error = %e, "prefetch dequeue error");
                    break;
                }
            }
        }
    }
}

async fn flush_worker<T: Send + 'static>(inner: Arc<Inner<T>>, cancel: CancellationToken) {
    let mut rx = inner.flush_rx.lock().await;
    let mut wait_until: Option<tokio::time::Instant> = None;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                drain_and_enqueue_all(&inner, &mut rx).await;
                return;
            }
            _ = inner.flush_signal.notified() => {
                run_flush_decision(&inner, &mut rx, &mut wait_until).await;
            }
            _ = wait_timer(&wait_until) => {
                run_flush_decision(&inner, &mut rx, &mut wait_until).await;
            }
        }
    }
}

async fn wait_timer(at: &Option<tokio::time::Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(*at).await,
        None => std::future::pending().await,
    }
}

async fn run_flush_decision<T: Send + 'static>(
    inner: &Arc<Inner<T>>,
    rx: &mut mpsc::Receiver<ScoredTask<T>>,
    wait_until: &mut Option<tokio::time::Instant>,
) {
    let headroom = inner.flush_tx.capacity();
    let state = BufferState::new(inner.flush_cap.saturating_sub(headroom), inner.flush_cap);
    let (count, wait) = inner.policy.flush(state);

    if count == 0 {
        *wait_until = if wait > Duration::ZERO {
            std::time::Duration::try_from(wait).ok().map(|d| tokio::time::Instant::now() + d)
        } else {
            None
        };
        return;
    }
    *wait_until = None;

    let mut batch = Vec::with_capacity(count.min(inner.flush_cap));
    while batch.len() < count {
        match rx.try_recv() {
            Ok(task) => batch.push(task),
            Err(_) => break,
        }
    }
    if batch.is_empty() {
        return;
    }

    let batch_len = batch.len();
    if let Err(e) = inner.queue.enqueue(batch).await {
        tracing::error!(
            target: "frontier::sched",
            error = %e,
            batch_len,
            "flush enqueue failed; residual batch was logged, not silently dropped"
        );
    }
}

async fn drain_and_enqueue_all<T: Send + 'static>(inner: &Arc<Inner<T>>, rx: &mut mpsc::Receiver<ScoredTask<T>>) {
    let mut batch = Vec::new();
    while let Ok(task) = rx.try_recv() {
        batch.push(task);
    }
    if batch.is_empty() {
        return;
    }
    let batch_len = batch.len();
    if let Err(e) = inner.queue.enqueue(batch).await {
        tracing::error!(
            target: "frontier::sched",
            error = %e,
            batch_len,
            "shutdown drain: flush enqueue failed; residual batch logged"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{DefaultPolicy, ThresholdPolicy};
    use frontier_primitives::Task;
    use frontier_queue::InMemoryQueue;
    use frontier_time::Clock;
    use url::Url;

    fn scored(clock: &Clock, url: &str, score: f64) -> ScoredTask<()> {
        ScoredTask::new(Task::new(Url::parse(url).unwrap(), clock.now(), ()), score)
    }

    #[tokio::test]
    async fn prefetch_refill_after_first_dequeue() {
        let queue = Arc::new(InMemoryQueue::new());
        let clock = Clock::real();
        // seed 10 tasks, scores 10..1 descending
        let seed: Vec<_> = (1..=10).map(|i| scored(&clock, &format!("https://a.example/{i}"), i as f64)).collect();
        queue.enqueue(seed).await.unwrap();

        let sched = BufferedScheduler::new(queue, Arc::new(DefaultPolicy::new()), 4, 8);
        let root = CancellationToken::new();
        sched.start(&root).await.unwrap();
        let ctx = CancellationToken::new();

        let mut scores = Vec::new();
        for _ in 0..5 {
            let t = tokio::time::timeout(std::time::Duration::from_secs(1), sched.dequeue(&ctx))
                .await
                .unwrap()
                .unwrap();
            scores.push(t.score());
        }
        assert_eq!(scores, vec![10.0, 9.0, 8.0, 7.0, 6.0]);

        sched.stop().await.unwrap();
    }

    #[tokio::test]
    async fn flush_batches_at_threshold() {
        let queue = Arc::new(InMemoryQueue::new());
        let policy = Arc::new(ThresholdPolicy::new(0.5, 0.75));
        let sched = BufferedScheduler::new(queue.clone(), policy, 4, 8);
        let root = CancellationToken::new();
        sched.start(&root).await.unwrap();
        let ctx = CancellationToken::new();
        let clock = Clock::real();

        for i in 0..6 {
            sched.enqueue(&ctx, scored(&clock, &format!("https://a.example/{i}"), i as f64)).await.unwrap();
        }

        // Give the flush worker a moment to react to the signal.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(queue.len().await, 6);

        sched.stop().await.unwrap();
    }

    #[tokio::test]
    async fn enqueue_backpressure_returns_context_cancelled() {
        let queue = Arc::new(InMemoryQueue::new());
        // A policy that never flushes, so the flush buffer stays full once
        // filled — the producer must block then observe cancellation.
        struct NeverFlush;
        impl BufferPolicy for NeverFlush {
            fn prefetch(&self, _state: BufferState) -> usize {
                0
            }
            fn flush(&self, _state: BufferState) -> (usize, Duration) {
                (0, Duration::ZERO)
            }
        }
        let sched = BufferedScheduler::new(queue.clone(), Arc::new(NeverFlush), 4, 2);
        let root = CancellationToken::new();
        sched.start(&root).await.unwrap();
        let clock = Clock::real();

        let ctx = CancellationToken::new();
        sched.enqueue(&ctx, scored(&clock, "https://a.example/1", 1.0)).await.unwrap();
        sched.enqueue(&ctx, scored(&clock, "https://a.example/2", 2.0)).await.unwrap();

        let blocked_ctx = CancellationToken::new();
        let blocked_ctx_clone = blocked_ctx.clone();
        let sched_inner = &sched;
        let enqueue_fut = async { sched_inner.enqueue(&blocked_ctx_clone, scored(&clock, "https://a.example/3", 3.0)).await };
        tokio::pin!(enqueue_fut);

        tokio::select! {
            _ = &mut enqueue_fut => panic!("enqueue should have blocked"),
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {}
        }

        blocked_ctx.cancel();
        let result = enqueue_fut.await;
        assert!(matches!(result, Err(SchedError::ContextCancelled)));
        assert_eq!(queue.len().await, 0);

        sched.stop().await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_drains_flush_buffer_to_backend() {
        let queue = Arc::new(InMemoryQueue::new());
        struct NeverFlush;
        impl BufferPolicy for NeverFlush {
            fn prefetch(&self, _state: BufferState) -> usize {
                0
            }
            fn flush(&self, _state: BufferState) -> (usize, Duration) {
                (0, Duration::ZERO)
            }
        }
        let sched = BufferedScheduler::new(queue.clone(), Arc::new(NeverFlush), 4, 8);
        let root = CancellationToken::new();
        sched.start(&root).await.unwrap();
        let ctx = CancellationToken::new();
        let clock = Clock::real();

        for i in 0..5 {
            sched.enqueue(&ctx, scored(&clock, &format!("https://a.example/{i}"), i as f64)).await.unwrap();
        }

        sched.stop().await.unwrap();
        assert_eq!(queue.len().await, 5);

        assert!(matches!(sched.enqueue(&ctx, scored(&clock, "https://a.example/x", 1.0)).await, Err(SchedError::ContextCancelled)));
        assert_eq!(sched.dequeue(&ctx).await, None);
    }

    #[tokio::test]
    async fn enqueue_before_start_is_not_started() {
        let queue = Arc::new(InMemoryQueue::new());
        let sched = BufferedScheduler::new(queue, Arc::new(DefaultPolicy::new()), 4, 8);
        let ctx = CancellationToken::new();
        let clock = Clock::real();
        let err = sched.enqueue(&ctx, scored(&clock, "https://a.example/1", 1.0)).await.unwrap_err();
        assert!(matches!(err, SchedError::NotStarted));
    }
}
