use chrono::{DateTime, Utc};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;

use super::{Admission, RateLimiter, prune_expired};
use crate::clock::Clock;
use crate::config::RateLimitConfig;

// Sliding window over a single map; one lock covers every client.
#[derive(Clone)]
pub struct SlidingWindowRateLimiter {
    requests: Arc<Mutex<HashMap<String, Vec<DateTime<Utc>>>>>,
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowRateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            requests: Arc::new(Mutex::new(HashMap::new())),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}

impl RateLimiter for SlidingWindowRateLimiter {
    async fn admit(&self, client_id: &str) -> Admission {
        let mut requests = self.requests.lock().await;
        // Read the clock under the lock so timestamps stay ordered per client.
        let now = self.clock.now();
        let window = self.config.window();

        let timestamps = requests.entry(client_id.to_string()).or_default();
        prune_expired(timestamps, now, window);

        if timestamps.len() >= self.config.max_requests as usize {
            return Admission::Rejected {
                retry_after_seconds: self.config.window_seconds(),
            };
        }

        timestamps.push(now);
        Admission::Allowed
    }

    async fn sweep(&self) -> usize {
        let mut requests = self.requests.lock().await;
        let now = self.clock.now();
        let window = self.config.window();
        let before = requests.len();

        requests.retain(|_, timestamps| {
            prune_expired(timestamps, now, window);
            !timestamps.is_empty()
        });

        before - requests.len()
    }
}
