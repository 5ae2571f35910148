use crate::{Cache, CacheError};
use frontier_time::{Clock, Duration, Instant};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Process-local [`Cache`] backed by an `lru::LruCache` so a deployment
/// with many distinct origins doesn't grow the cache unboundedly; TTL
/// expiry is checked lazily on `get` rather than via a background sweeper,
/// matching the "entries expiring by wall-clock produce a miss on
/// subsequent Get" wording in the contract (no sweeper is required for
/// that to hold).
pub struct InMemoryCache<V> {
    inner: Mutex<LruCache<String, Entry<V>>>,
    clock: Clock,
}

impl<V> InMemoryCache<V> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self::with_clock(capacity, Clock::real())
    }

    pub fn with_clock(capacity: NonZeroUsize, clock: Clock) -> Self {
        Self { inner: Mutex::new(LruCache::new(capacity)), clock }
    }
}

#[async_trait::async_trait]
impl<V: Clone + Send + Sync + 'static> Cache<V> for InMemoryCache<V> {
    async fn get(&self, key: &str) -> Result<V, CacheError> {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.get(key) else {
            return Err(CacheError::Miss);
        };
        if self.clock.now() >= entry.expires_at {
            inner.pop(key);
            return Err(CacheError::Miss);
        }
        Ok(entry.value.clone())
    }

    async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = self
            .clock
            .now()
            .checked_add(ttl)
            .ok_or_else(|| CacheError::Backend(anyhow::anyhow!("ttl overflowed clock range")))?;
        self.inner.lock().put(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner.lock().pop(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with_fake_clock() -> (InMemoryCache<u32>, frontier_time::FakeClock) {
        let (clock, fake) = Clock::fake();
        (InMemoryCache::with_clock(NonZeroUsize::new(16).unwrap(), clock), fake)
    }

    #[tokio::test]
    async fn get_before_set_is_a_miss() {
        let (cache, _fake) = cache_with_fake_clock();
        assert!(matches!(cache.get("x").await, Err(CacheError::Miss)));
    }

    #[tokio::test]
    async fn set_then_get_within_ttl_hits() {
        let (cache, fake) = cache_with_fake_clock();
        cache.set("x", 42, Duration::milliseconds(100)).await.unwrap();
        fake.advance(Duration::milliseconds(50));
        assert_eq!(cache.get("x").await.unwrap(), 42);
    }

    #[tokio::test]
    async fn get_past_ttl_is_a_miss() {
        let (cache, fake) = cache_with_fake_clock();
        cache.set("x", 42, Duration::milliseconds(100)).await.unwrap();
        fake.advance(Duration::milliseconds(200));
        assert!(matches!(cache.get("x").await, Err(CacheError::Miss)));
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let (cache, _fake) = cache_with_fake_clock();
        cache.set("x", 42, Duration::milliseconds(100)).await.unwrap();
        cache.delete("x").await.unwrap();
        assert!(matches!(cache.get("x").await, Err(CacheError::Miss)));
    }

    #[tokio::test]
    async fn set_replaces_existing_entry() {
        let (cache, _fake) = cache_with_fake_clock();
        cache.set("x", 1, Duration::milliseconds(100)).await.unwrap();
        cache.set("x", 2, Duration::milliseconds(100)).await.unwrap();
        assert_eq!(cache.get("x").await.unwrap(), 2);
    }
}
