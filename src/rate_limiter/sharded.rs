use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use super::{Admission, RateLimiter, prune_expired};
use crate::clock::Clock;
use crate::config::RateLimitConfig;

// Same window semantics as the standard limiter, but the map is sharded so
// only clients hashing to the same shard contend. The entry guard is held for
// the whole prune/check/record step.
#[derive(Clone)]
pub struct ShardedSlidingWindowRateLimiter {
    requests: Arc<DashMap<String, Vec<DateTime<Utc>>>>,
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
}

impl ShardedSlidingWindowRateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            requests: Arc::new(DashMap::new()),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}

impl RateLimiter for ShardedSlidingWindowRateLimiter {
    async fn admit(&self, client_id: &str) -> Admission {
        let mut timestamps = self.requests.entry(client_id.to_string()).or_default();
        let now = self.clock.now();

        prune_expired(&mut timestamps, now, self.config.window());

        if timestamps.len() >= self.config.max_requests as usize {
            return Admission::Rejected {
                retry_after_seconds: self.config.window_seconds(),
            };
        }

        timestamps.push(now);
        Admission::Allowed
    }

    async fn sweep(&self) -> usize {
        let now = self.clock.now();
        let window = self.config.window();
        let before = self.requests.len();

        self.requests.retain(|_, timestamps| {
            prune_expired(timestamps, now, window);
            !timestamps.is_empty()
        });

        // New clients may land between len() and retain().
        before.saturating_sub(self.requests.len())
    }
}
