//! Per-origin robots.txt politeness resolver: cache-then-singleflight-
//! then-fetch, with a small hand-written parser for the robots.txt
//! grammar (see `DESIGN.md` for why this stays in-tree rather than
//! pulling in a dependency).

mod fetch;
mod parse;
mod resolver;
mod types;

pub use fetch::{FetchOutcome, ReqwestFetcher, RobotsFetcher};
pub use resolver::RobotsResolver;
pub use types::{RobotsEntry, RobotsGroup};

use frontier_time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RobotsError {
    #[error("robots user agent must not be empty")]
    InvalidConfig,
    #[error("robots cache ttl must be positive")]
    InvalidTtl,
    #[error("robots fetch failed: {0}")]
    Fetch(#[from] anyhow::Error),
    #[error("robots cache backend error: {0}")]
    Cache(#[from] frontier_cache::CacheError),
}

/// Configuration for a [`RobotsResolver`].
#[derive(Debug, Clone)]
pub struct RobotsConfig {
    pub user_agent: String,
    pub ttl: Duration,
}

impl RobotsConfig {
    pub fn new(user_agent: impl Into<String>, ttl: Duration) -> Result<Self, RobotsError> {
        let config = Self { user_agent: user_agent.into(), ttl };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RobotsError> {
        if self.user_agent.trim().is_empty() {
            return Err(RobotsError::InvalidConfig);
        }
        if self.ttl <= Duration::ZERO {
            return Err(RobotsError::InvalidTtl);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_user_agent_is_rejected() {
        assert!(matches!(RobotsConfig::new("", Duration::seconds(60)), Err(RobotsError::InvalidConfig)));
        assert!(matches!(RobotsConfig::new("   ", Duration::seconds(60)), Err(RobotsError::InvalidConfig)));
    }

    #[test]
    fn non_positive_ttl_is_rejected() {
        assert!(matches!(RobotsConfig::new("frontierbot", Duration::ZERO), Err(RobotsError::InvalidTtl)));
        assert!(matches!(RobotsConfig::new("frontierbot", Duration::seconds(-1)), Err(RobotsError::InvalidTtl)));
    }

    #[test]
    fn valid_config_is_accepted() {
        assert!(RobotsConfig::new("frontierbot", Duration::seconds(3600)).is_ok());
    }
}
