use anyhow::Context;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;

mod clock;
mod comparator;
mod config;
mod error;
mod handlers;
mod identifier;
mod lookup;
mod middleware;
mod rate_limiter;
mod storage;

use clock::SystemClock;
use comparator::UnconfiguredComparator;
use config::{RateLimitConfig, RateLimiterType, ServerConfig};
use handlers::AppState;
use middleware::RateLimitState;
use rate_limiter::RateLimiterEnum;
use storage::InMemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let server_config = ServerConfig::from_env();
    let limit_config = RateLimitConfig::from_env();
    let limiter_type = RateLimiterType::from_env();

    // Lives for the whole process; entries for idle clients are only reclaimed by the sweep.
    let limiter = RateLimiterEnum::new(limiter_type, limit_config, Arc::new(SystemClock));

    match server_config.sweep_interval {
        Some(every) => spawn_sweeper(limiter.clone(), every),
        None => tracing::info!(
            "idle-client sweep disabled; limiter memory grows with distinct clients"
        ),
    }

    let state = AppState {
        store: Arc::new(InMemoryStore::new()),
        comparator: Arc::new(UnconfiguredComparator),
    };
    tracing::info!(
        "rate limit config: {} requests per {} seconds ({:?} limiter)",
        limiter.config().max_requests,
        limiter.config().window_seconds(),
        limiter_type
    );
    let rate_limit = RateLimitState {
        limiter,
        trust_forwarded_for: server_config.trust_forwarded_for,
    };
    let app = handlers::router(state, rate_limit);

    let addr = server_config.bind_addr;
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}

fn spawn_sweeper(limiter: RateLimiterEnum, every: Duration) {
    tracing::info!("sweeping idle rate-limit entries every {:?}", every);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.sweep().await;
            if removed > 0 {
                tracing::debug!("swept {} idle clients", removed);
            }
        }
    });
}
