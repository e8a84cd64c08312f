use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_MAX_REQUESTS: u32 = 3;
const DEFAULT_WINDOW_SECONDS: u64 = 60;
const MAX_WINDOW_SECONDS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_SWEEP_SECONDS: u64 = 0; // 0 disables the idle-client sweep
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum RateLimiterType {
    Standard,
    Sharded,
}

impl RateLimiterType {
    pub fn from_env() -> Self {
        Self::parse(env::var("RATE_LIMITER_TYPE").ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("sharded") => Self::Sharded,
            Some("standard") | _ => Self::Standard,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    window_seconds: u64,
    window: chrono::Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_SECONDS)
    }
}

impl RateLimitConfig {
    /// A window outside `1..=MAX_WINDOW_SECONDS` falls back to the default.
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        let (window_seconds, window) = match checked_window(window_seconds) {
            Some(window) => (window_seconds, window),
            None => {
                tracing::warn!(
                    "invalid rate limit window {}s, using {}s",
                    window_seconds,
                    DEFAULT_WINDOW_SECONDS
                );
                (
                    DEFAULT_WINDOW_SECONDS,
                    chrono::Duration::seconds(DEFAULT_WINDOW_SECONDS as i64),
                )
            }
        };

        Self {
            max_requests,
            window_seconds,
            window,
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            env_parse("RATE_LIMIT_MAX_REQUESTS", DEFAULT_MAX_REQUESTS),
            env_parse("RATE_LIMIT_WINDOW_SECONDS", DEFAULT_WINDOW_SECONDS),
        )
    }

    pub fn window_seconds(&self) -> u64 {
        self.window_seconds
    }

    pub fn window(&self) -> chrono::Duration {
        self.window
    }
}

fn checked_window(window_seconds: u64) -> Option<chrono::Duration> {
    if window_seconds == 0 || window_seconds > MAX_WINDOW_SECONDS {
        return None;
    }
    chrono::Duration::try_seconds(i64::try_from(window_seconds).ok()?)
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub trust_forwarded_for: bool,
    /// `None` keeps idle client entries forever.
    pub sweep_interval: Option<Duration>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let default_addr = DEFAULT_BIND_ADDR
            .parse()
            .unwrap_or(SocketAddr::from(([127, 0, 0, 1], 3000)));
        let sweep_seconds = env_parse("RATE_LIMIT_SWEEP_SECONDS", DEFAULT_SWEEP_SECONDS);

        Self {
            bind_addr: env_parse("BIND_ADDR", default_addr),
            trust_forwarded_for: env_parse("TRUST_FORWARDED_FOR", false),
            sweep_interval: (sweep_seconds > 0).then(|| Duration::from_secs(sweep_seconds)),
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    parse_or(env::var(key).ok().as_deref(), default)
}

fn parse_or<T: FromStr>(value: Option<&str>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_comparison_endpoint_limits() {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_requests, 3);
        assert_eq!(config.window_seconds(), 60);
        assert_eq!(config.window(), chrono::Duration::seconds(60));
    }

    #[test]
    fn out_of_range_windows_fall_back_to_default() {
        for bad in [0, MAX_WINDOW_SECONDS + 1, 10_000_000_000_000_000, u64::MAX] {
            let config = RateLimitConfig::new(1, bad);
            assert_eq!(config.window_seconds(), 60, "window {bad}");
            assert_eq!(config.window(), chrono::Duration::seconds(60), "window {bad}");
        }

        let widest = RateLimitConfig::new(1, MAX_WINDOW_SECONDS);
        assert_eq!(widest.window_seconds(), MAX_WINDOW_SECONDS);
        assert_eq!(
            widest.window(),
            chrono::Duration::seconds(MAX_WINDOW_SECONDS as i64)
        );
    }

    #[test]
    fn limiter_type_falls_back_to_standard() {
        assert_eq!(RateLimiterType::parse(Some("sharded")), RateLimiterType::Sharded);
        assert_eq!(RateLimiterType::parse(Some("standard")), RateLimiterType::Standard);
        assert_eq!(RateLimiterType::parse(Some("bogus")), RateLimiterType::Standard);
        assert_eq!(RateLimiterType::parse(None), RateLimiterType::Standard);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        assert_eq!(parse_or::<u32>(Some("abc"), 3), 3);
        assert_eq!(parse_or::<u32>(Some(" 7 "), 3), 7);
        assert_eq!(parse_or::<bool>(None, false), false);
        assert_eq!(
            parse_or::<SocketAddr>(Some("0.0.0.0:8080"), SocketAddr::from(([127, 0, 0, 1], 3000))),
            SocketAddr::from(([0, 0, 0, 0], 8080))
        );
    }
}
