use crate::{Queue, QueueError};
use frontier_primitives::ScoredTask;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tokio::sync::mpsc;

/// Heap entry: orders by score, then by *lower* sequence number first, so
/// that `BinaryHeap::pop` (a max-heap) returns the highest score and, among
/// equal scores, the one inserted earliest — matching the frontier's
/// "descending score, FIFO within a tie" ordering invariant.
struct Entry<T> {
    task: ScoredTask<T>,
    seq: u64,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.task.score() == other.task.score() && self.seq == other.seq
    }
}
impl<T> Eq for Entry<T> {}
impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.task.cmp(&other.task).then_with(|| other.seq.cmp(&self.seq))
    }
}

struct Inner<T> {
    heap: BinaryHeap<Entry<T>>,
    next_seq: u64,
}

/// The default, in-memory [`Queue`] backend. An integrator that needs
/// durability across restarts swaps this for a disk-backed implementation
/// of the same trait; the scheduler is indifferent to which one it holds.
pub struct InMemoryQueue<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> Default for InMemoryQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InMemoryQueue<T> {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner { heap: BinaryHeap::new(), next_seq: 0 }) }
    }
}

#[async_trait::async_trait]
impl<T: Send + 'static> Queue<T> for InMemoryQueue<T> {
    async fn enqueue(&self, items: Vec<ScoredTask<T>>) -> Result<(), QueueError> {
        let mut inner = self.inner.lock();
        for task in items {
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.heap.push(Entry { task, seq });
        }
        Ok(())
    }

    async fn dequeue(&self, n: usize, out: &mpsc::Sender<ScoredTask<T>>) -> Result<usize, QueueError> {
        let mut popped = Vec::with_capacity(n.min(64));
        {
            let mut inner = self.inner.lock();
            for _ in 0..n {
                match inner.heap.pop() {
                    Some(entry) => popped.push(entry.task),
                    None => break,
                }
            }
        }

        let mut delivered = 0;
        let mut undelivered = Vec::new();
        for task in popped {
            match out.try_send(task) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(task)) => {
                    // `out` has no more headroom; stop rather than block,
                    // and put back what we already popped so it isn't lost.
                    undelivered.push(task);
                }
                Err(mpsc::error::TrySendError::Closed(task)) => {
                    undelivered.push(task);
                    break;
                }
            }
        }

        if !undelivered.is_empty() {
            tracing::trace!(target: "frontier::queue", restored = undelivered.len(), "out had no headroom; restoring undelivered items");
            let mut inner = self.inner.lock();
            for task in undelivered {
                let seq = inner.next_seq;
                inner.next_seq += 1;
                inner.heap.push(Entry { task, seq });
            }
        }

        Ok(delivered)
    }

    async fn len(&self) -> usize {
        self.inner.lock().heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontier_primitives::Task;
    use frontier_time::Clock;
    use url::Url;

    fn scored(clock: &Clock, url: &str, score: f64) -> ScoredTask<()> {
        ScoredTask::new(Task::new(Url::parse(url).unwrap(), clock.now(), ()), score)
    }

    #[tokio::test]
    async fn dequeue_returns_highest_scores_first() {
        let clock = Clock::real();
        let q = InMemoryQueue::new();
        q.enqueue(vec![
            scored(&clock, "https://a.example/1", 1.0),
            scored(&clock, "https://a.example/2", 9.0),
            scored(&clock, "https://a.example/3", 5.0),
        ])
        .await
        .unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let n = q.dequeue(3, &tx).await.unwrap();
        assert_eq!(n, 3);
        drop(tx);

        let mut scores = Vec::new();
        while let Some(t) = rx.recv().await {
            scores.push(t.score());
        }
        assert_eq!(scores, vec![9.0, 5.0, 1.0]);
    }

    #[tokio::test]
    async fn ties_are_broken_by_insertion_order() {
        let clock = Clock::real();
        let q = InMemoryQueue::new();
        q.enqueue(vec![scored(&clock, "https://a.example/first", 5.0)]).await.unwrap();
        q.enqueue(vec![scored(&clock, "https://a.example/second", 5.0)]).await.unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        q.dequeue(2, &tx).await.unwrap();
        drop(tx);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.task.url.path(), "/first");
        let second = rx.recv().await.unwrap();
        assert_eq!(second.task.url.path(), "/second");
    }

    #[tokio::test]
    async fn dequeue_on_empty_queue_returns_zero_without_blocking() {
        let q: InMemoryQueue<()> = InMemoryQueue::new();
        let (tx, _rx) = mpsc::channel(8);
        let n = q.dequeue(5, &tx).await.unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn dequeue_never_drops_items_it_fails_to_deliver() {
        let clock = Clock::real();
        let q = InMemoryQueue::new();
        q.enqueue(vec![
            scored(&clock, "https://a.example/1", 1.0),
            scored(&clock, "https://a.example/2", 2.0),
            scored(&clock, "https://a.example/3", 3.0),
        ])
        .await
        .unwrap();

        // Capacity 1: only the top-scored item can be delivered, the rest
        // must be restored to the backend rather than lost.
        let (tx, mut rx) = mpsc::channel(1);
        let delivered = q.dequeue(3, &tx).await.unwrap();
        assert_eq!(delivered, 1);
        assert_eq!(rx.recv().await.unwrap().score(), 3.0);
        assert_eq!(q.len().await, 2);
    }

    #[tokio::test]
    async fn len_reflects_pending_count() {
        let clock = Clock::real();
        let q = InMemoryQueue::new();
        assert_eq!(q.len().await, 0);
        q.enqueue(vec![scored(&clock, "https://a.example/1", 1.0)]).await.unwrap();
        assert_eq!(q.len().await, 1);
    }
}
