//! Rate limiting for mutating Stump calls
//!
//! Metadata updates and cover uploads share one limiter so a bulk metadata
//! refresh in the host cannot flood the server.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use tracing::debug;

/// Configuration for rate limiting
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Permits admitted per interval
    pub permits: u32,
    /// Rolling interval the permits are spread over
    pub interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            permits: 120,
            interval: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// Quota replenishing one permit every `interval / permits`, bursting up to `permits`.
    pub fn quota(&self) -> Quota {
        let permits = NonZeroU32::new(self.permits).unwrap_or(NonZeroU32::MIN);
        let period = self.interval / permits.get();
        Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(permits)
    }
}

/// Shared limiter consulted before every mutating call
#[derive(Clone)]
pub struct WriteRateLimiter {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    name: String,
}

impl WriteRateLimiter {
    pub fn new(name: &str, config: RateLimitConfig) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(config.quota())),
            name: name.to_string(),
        }
    }

    /// Limiter for Stump metadata and cover writes (120 per minute)
    pub fn for_stump_updates() -> Self {
        Self::new("stump-updates", RateLimitConfig::default())
    }

    /// Wait for a rate limit permit
    pub async fn wait_for_permit(&self) {
        self.limiter.until_ready().await;
        debug!(limiter = %self.name, "Write permit granted");
    }

    /// Take a permit without waiting; false when the limiter is exhausted.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl std::fmt::Debug for WriteRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteRateLimiter")
            .field("name", &self.name)
            .finish()
    }
}
