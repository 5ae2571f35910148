//! Umbrella crate: re-exports every subsystem and wires them into one
//! [`Frontier`] given a [`FrontierConfig`] and a caller-supplied
//! [`frontier_queue::Queue`] backend.

pub use frontier_cache::{Cache, CacheError, InMemoryCache};
pub use frontier_lifecycle::{Lifecycle, LifecycleError};
pub use frontier_primitives::{origin_of, BufferState, ScoredTask, Task};
pub use frontier_queue::{InMemoryQueue, Queue, QueueError};
pub use frontier_robots::{RobotsConfig, RobotsEntry, RobotsError, RobotsFetcher, RobotsResolver};
pub use frontier_sched::{BufferedScheduler, DefaultPolicy, SchedError, Scheduler, ThresholdPolicy, UnbufferedScheduler};
pub use frontier_score::{ConstantScore, Score, ScoreError};
pub use frontier_time::{Clock, Duration, Instant};

use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;

/// Configuration for one [`Frontier`] instance: buffer sizing, the
/// threshold policy's thresholds, and the robots resolver's identity/TTL.
///
/// Mirrors the corpus's plain `serde`-derived config structs (e.g.
/// `core/chain-configs`'s `ClientConfig`) rather than pulling in the
/// schema-generation machinery those structs optionally support — nothing
/// here needs a JSON schema.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FrontierConfig {
    /// Capacity of the scheduler's prefetch buffer.
    pub prefetch_capacity: usize,
    /// Capacity of the scheduler's flush buffer.
    pub flush_capacity: usize,
    /// Fraction of prefetch capacity, at or below which a refill triggers.
    pub min_prefetch_threshold: f64,
    /// Fraction of flush capacity, at or above which a flush triggers.
    pub max_flush_threshold: f64,
    /// `User-agent` this deployment crawls under; also the name the robots
    /// resolver matches against `User-agent` groups.
    pub robots_user_agent: String,
    /// How long a resolved robots.txt policy is cached per origin.
    pub robots_ttl_secs: u64,
    /// Bounded number of origins the robots cache remembers at once.
    pub robots_cache_capacity: usize,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            prefetch_capacity: 256,
            flush_capacity: 256,
            min_prefetch_threshold: 0.25,
            max_flush_threshold: 0.75,
            robots_user_agent: "frontierbot".to_string(),
            robots_ttl_secs: 3600,
            robots_cache_capacity: 4096,
        }
    }
}

impl FrontierConfig {
    pub fn validate(&self) -> Result<(), FrontierError> {
        if self.prefetch_capacity == 0 || self.flush_capacity == 0 || self.robots_cache_capacity == 0 {
            return Err(FrontierError::InvalidConfig("buffer and cache capacities must be nonzero"));
        }
        if !(0.0..=1.0).contains(&self.min_prefetch_threshold) || !(0.0..=1.0).contains(&self.max_flush_threshold) {
            return Err(FrontierError::InvalidConfig("thresholds must be within [0, 1]"));
        }
        if self.robots_ttl_secs == 0 {
            return Err(FrontierError::InvalidTtl);
        }
        if self.robots_user_agent.trim().is_empty() {
            return Err(FrontierError::InvalidConfig("robots_user_agent must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum FrontierError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("invalid ttl")]
    InvalidTtl,
    #[error(transparent)]
    Robots(#[from] RobotsError),
    #[error(transparent)]
    Fetcher(#[from] anyhow::Error),
}

/// The frontier's two wired-up components: a scheduler sitting over the
/// caller's queue backend, and a robots resolver with an in-memory TTL
/// cache and the default HTTP fetcher.
pub struct Frontier<T: Send + 'static> {
    pub scheduler: Arc<dyn Scheduler<T>>,
    pub robots: Arc<RobotsResolver>,
}

impl<T: Send + 'static> Frontier<T> {
    /// Builds a buffered scheduler and a robots resolver per `config`,
    /// over the given queue backend. Callers own the queue's lifetime;
    /// everything else needed to run is constructed here.
    pub fn build(config: &FrontierConfig, queue: Arc<dyn Queue<T>>) -> Result<Self, FrontierError> {
        config.validate()?;

        let policy = Arc::new(ThresholdPolicy::new(config.min_prefetch_threshold, config.max_flush_threshold));
        let scheduler: Arc<dyn Scheduler<T>> =
            Arc::new(BufferedScheduler::new(queue, policy, config.prefetch_capacity, config.flush_capacity));

        let fetcher: Arc<dyn RobotsFetcher> = Arc::new(frontier_robots::ReqwestFetcher::new()?);
        let cache_capacity =
            NonZeroUsize::new(config.robots_cache_capacity).expect("validated nonzero above");
        let cache: Arc<dyn Cache<Arc<RobotsEntry>>> = Arc::new(InMemoryCache::new(cache_capacity));
        let robots_config =
            RobotsConfig::new(config.robots_user_agent.clone(), Duration::seconds(config.robots_ttl_secs as i64))?;
        let robots = Arc::new(RobotsResolver::new(robots_config, fetcher, cache)?);

        Ok(Self { scheduler, robots })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontier_queue::InMemoryQueue;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn default_config_validates() {
        assert!(FrontierConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut cfg = FrontierConfig::default();
        cfg.prefetch_capacity = 0;
        assert!(matches!(cfg.validate(), Err(FrontierError::InvalidConfig(_))));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut cfg = FrontierConfig::default();
        cfg.max_flush_threshold = 1.5;
        assert!(matches!(cfg.validate(), Err(FrontierError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn build_wires_a_usable_scheduler_and_resolver() {
        let config = FrontierConfig::default();
        let queue: Arc<dyn Queue<()>> = Arc::new(InMemoryQueue::new());
        let frontier = Frontier::build(&config, queue).unwrap();

        let root = CancellationToken::new();
        frontier.scheduler.start(&root).await.unwrap();
        frontier.scheduler.stop().await.unwrap();
    }
}
