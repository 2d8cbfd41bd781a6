//! Cache configuration types

use std::time::Duration;

use crate::Error;
use crate::constants::{DEFAULT_CACHE_TTL_MINUTES, DEFAULT_MAX_CACHE_SIZE};

/// Validated cache store configuration.
///
/// Zero TTL or zero capacity is rejected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    ttl: Duration,
    max_size: usize,
}

impl CacheConfig {
    pub fn new(ttl: Duration, max_size: usize) -> crate::Result<Self> {
        if ttl.is_zero() {
            return Err(Error::Config("cache TTL must be positive".into()));
        }
        if max_size == 0 {
            return Err(Error::Config("cache max_size must be positive".into()));
        }
        Ok(Self { ttl, max_size })
    }

    pub fn from_minutes(ttl_minutes: u64, max_size: usize) -> crate::Result<Self> {
        Self::new(Duration::from_secs(ttl_minutes.saturating_mul(60)), max_size)
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub const fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_MINUTES * 60),
            max_size: DEFAULT_MAX_CACHE_SIZE,
        }
    }
}
