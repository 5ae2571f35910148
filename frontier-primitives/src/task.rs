use frontier_time::Instant;
use std::cmp::Ordering;
use url::Url;

/// A unit of crawl work.
///
/// `T` is an opaque per-deployment payload (referrer, depth, fingerprint,
/// ...). The frontier never inspects `metadata`; it only carries it between
/// the producer that created the task and whichever consumer eventually
/// dequeues it.
#[derive(Debug, Clone)]
pub struct Task<T> {
    pub url: Url,
    pub execute_at: Instant,
    pub metadata: T,
}

impl<T> Task<T> {
    pub fn new(url: Url, execute_at: Instant, metadata: T) -> Self {
        Self { url, execute_at, metadata }
    }

    /// `scheme://host[:port]` — the cache key used by the robots resolver.
    pub fn origin(&self) -> Option<String> {
        origin_of(&self.url)
    }
}

/// `scheme://host[:port]`, or `None` for URLs without a host (e.g. `data:`).
pub fn origin_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// A [`Task`] paired with an immutable priority score. Higher score means
/// higher priority. The score is assigned by an external scoring function
/// (see `frontier-score`) before the task is enqueued and never changes
/// afterwards.
///
/// `ScoredTask` only orders by score; it does not carry an insertion
/// sequence. The FIFO tie-break required by the frontier's ordering
/// invariant ("ties are broken by insertion order") is a property of *a
/// particular queue backend's* insertion history, not of the task itself —
/// see `frontier_queue::InMemoryQueue`, which assigns the sequence number
/// at the moment a batch is accepted.
#[derive(Debug, Clone)]
pub struct ScoredTask<T> {
    pub task: Task<T>,
    score: f64,
}

impl<T> ScoredTask<T> {
    pub fn new(task: Task<T>, score: f64) -> Self {
        assert!(!score.is_nan(), "task score must not be NaN");
        Self { task, score }
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}

impl<T> PartialEq for ScoredTask<T> {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score
    }
}
impl<T> Eq for ScoredTask<T> {}

impl<T> PartialOrd for ScoredTask<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Higher score sorts first. Construction rejects `NaN`, so this total
/// order is safe to rely on for a `BinaryHeap`.
impl<T> Ord for ScoredTask<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.partial_cmp(&other.score).unwrap_or(Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn task(clock: &frontier_time::Clock, s: &str) -> Task<()> {
        Task::new(url(s), clock.now(), ())
    }

    #[test]
    fn origin_includes_port_when_nonstandard() {
        assert_eq!(origin_of(&url("https://a.example:8443/x")).unwrap(), "https://a.example:8443");
        assert_eq!(origin_of(&url("https://a.example/x")).unwrap(), "https://a.example");
    }

    #[test]
    fn origin_is_none_without_a_host() {
        assert!(origin_of(&url("data:text/plain,hi")).is_none());
    }

    #[test]
    fn higher_score_sorts_greater() {
        let clock = frontier_time::Clock::real();
        let low = ScoredTask::new(task(&clock, "https://a.example/1"), 1.0);
        let high = ScoredTask::new(task(&clock, "https://a.example/2"), 9.0);
        assert!(high > low);
    }

    #[test]
    #[should_panic(expected = "NaN")]
    fn nan_score_panics_at_construction() {
        let clock = frontier_time::Clock::real();
        ScoredTask::new(task(&clock, "https://a.example/1"), f64::NAN);
    }
}
