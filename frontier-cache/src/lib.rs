//! A generic `(key, value, ttl)` store. The core does not assume
//! single-process semantics — implementations may be process-local (the
//! [`InMemoryCache`] here) or networked.

mod memory;

pub use memory::InMemoryCache;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache miss")]
    Miss,
    #[error("cache backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// `Get` returns the entry or [`CacheError::Miss`]; `Set` inserts or
/// replaces; entries past their TTL produce a miss on the next `Get`
/// regardless of whether anything has actively swept them.
#[async_trait::async_trait]
pub trait Cache<V: Clone + Send + Sync + 'static>: Send + Sync {
    async fn get(&self, key: &str) -> Result<V, CacheError>;
    async fn set(&self, key: &str, value: V, ttl: frontier_time::Duration) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
