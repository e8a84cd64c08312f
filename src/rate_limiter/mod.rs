use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::{RateLimitConfig, RateLimiterType};

mod sharded;
mod standard;

pub use sharded::*;
pub use standard::*;

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// The hint is always the full window, not the time until the oldest entry expires.
    Rejected { retry_after_seconds: u64 },
}

impl Admission {
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

// Sliding-window limiter keyed by client identity.
//
// `admit` prunes, checks and records as one atomic step per client.
pub trait RateLimiter: Clone {
    async fn admit(&self, client_id: &str) -> Admission;

    /// Drops clients with no timestamps left inside the window. Returns how many were removed.
    async fn sweep(&self) -> usize;
}

// Keeps only timestamps strictly younger than the window.
fn prune_expired(timestamps: &mut Vec<DateTime<Utc>>, now: DateTime<Utc>, window: Duration) {
    timestamps.retain(|&time| now.signed_duration_since(time) < window);
}

#[derive(Clone)]
pub enum RateLimiterEnum {
    Standard(SlidingWindowRateLimiter),
    Sharded(ShardedSlidingWindowRateLimiter),
}

impl RateLimiterEnum {
    pub fn new(kind: RateLimiterType, config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        match kind {
            RateLimiterType::Standard => Self::Standard(SlidingWindowRateLimiter::new(config, clock)),
            RateLimiterType::Sharded => {
                Self::Sharded(ShardedSlidingWindowRateLimiter::new(config, clock))
            }
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        match self {
            Self::Standard(limiter) => limiter.config(),
            Self::Sharded(limiter) => limiter.config(),
        }
    }

    pub async fn admit(&self, client_id: &str) -> Admission {
        match self {
            Self::Standard(limiter) => limiter.admit(client_id).await,
            Self::Sharded(limiter) => limiter.admit(client_id).await,
        }
    }

    pub async fn sweep(&self) -> usize {
        match self {
            Self::Standard(limiter) => limiter.sweep().await,
            Self::Sharded(limiter) => limiter.sweep().await,
        }
    }
}
