use crate::fetch::{FetchOutcome, RobotsFetcher};
use crate::parse;
use crate::types::{Policy, RobotsEntry};
use crate::{RobotsConfig, RobotsError};
use frontier_cache::{Cache, CacheError};
use frontier_time::Clock;
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// Per-origin politeness oracle: cache-then-singleflight-then-fetch, with
/// negative results (fetch failures) never cached — only a definitive
/// policy (rules, unrestricted, or disallow-all) is worth remembering.
///
/// Concurrent resolves for the same origin coalesce into a single fetch:
/// cache read, acquire a per-origin lock from a
/// `parking_lot::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>`
/// table, double-checked cache read inside the critical section, fetch,
/// cache write.
pub struct RobotsResolver {
    fetcher: Arc<dyn RobotsFetcher>,
    cache: Arc<dyn Cache<Arc<RobotsEntry>>>,
    clock: Clock,
    config: RobotsConfig,
    inflight: SyncMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl RobotsResolver {
    pub fn new(config: RobotsConfig, fetcher: Arc<dyn RobotsFetcher>, cache: Arc<dyn Cache<Arc<RobotsEntry>>>) -> Result<Self, RobotsError> {
        config.validate()?;
        Ok(Self { fetcher, cache, clock: Clock::real(), config, inflight: SyncMutex::new(HashMap::new()) })
    }

    pub fn with_clock(config: RobotsConfig, fetcher: Arc<dyn RobotsFetcher>, cache: Arc<dyn Cache<Arc<RobotsEntry>>>, clock: Clock) -> Result<Self, RobotsError> {
        config.validate()?;
        Ok(Self { fetcher, cache, clock, config, inflight: SyncMutex::new(HashMap::new()) })
    }

    /// Resolves the robots.txt policy for `origin` (`scheme://host[:port]`),
    /// using the configured default TTL.
    #[tracing::instrument(target = "frontier::robots", level = "debug", skip(self), fields(origin = %origin))]
    pub async fn resolve(&self, origin: &str) -> Result<Arc<RobotsEntry>, RobotsError> {
        self.resolve_with_ttl(origin, self.config.ttl).await
    }

    /// As [`Self::resolve`], but caches the result under a caller-supplied
    /// TTL instead of the resolver's configured default.
    pub async fn resolve_with_ttl(&self, origin: &str, ttl: frontier_time::Duration) -> Result<Arc<RobotsEntry>, RobotsError> {
        if ttl <= frontier_time::Duration::ZERO {
            return Err(RobotsError::InvalidTtl);
        }

        if let Some(entry) = self.cache_get(origin).await? {
            return Ok(entry);
        }

        let lock = self.lock_for(origin);
        let _guard = lock.lock().await;

        // Another caller may have populated the cache while we waited for
        // the per-origin lock; check again before doing any work.
        if let Some(entry) = self.cache_get(origin).await? {
            self.forget_lock(origin, &lock);
            return Ok(entry);
        }

        let result = self.fetch_and_build(origin).await;
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                self.forget_lock(origin, &lock);
                return Err(e);
            }
        };

        self.cache.set(origin, entry.clone(), ttl).await?;
        self.forget_lock(origin, &lock);
        Ok(entry)
    }

    async fn cache_get(&self, origin: &str) -> Result<Option<Arc<RobotsEntry>>, RobotsError> {
        match self.cache.get(origin).await {
            Ok(entry) => Ok(Some(entry)),
            Err(CacheError::Miss) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn lock_for(&self, origin: &str) -> Arc<AsyncMutex<()>> {
        self.inflight.lock().entry(origin.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    /// Drops the per-origin lock entry from the table once this resolution
    /// has completed, but only if nobody replaced it with a fresh lock in
    /// the meantime (compared by pointer identity).
    fn forget_lock(&self, origin: &str, lock: &Arc<AsyncMutex<()>>) {
        let mut inflight = self.inflight.lock();
        if let Some(current) = inflight.get(origin) {
            if Arc::ptr_eq(current, lock) {
                inflight.remove(origin);
            }
        }
    }

    async fn fetch_and_build(&self, origin: &str) -> Result<Arc<RobotsEntry>, RobotsError> {
        let outcome = self.fetcher.fetch(origin).await?;
        let policy = match outcome {
            FetchOutcome::ClientError => Policy::Unrestricted,
            FetchOutcome::ServerError => Policy::DisallowAll,
            FetchOutcome::Success(body) => {
                let body = String::from_utf8_lossy(&body);
                match parse::find_group(&body, &self.config.user_agent) {
                    Some(group) => Policy::Rules(group),
                    None => Policy::Unrestricted,
                }
            }
        };
        Ok(Arc::new(RobotsEntry::new(policy, self.clock.now())))
    }
}
