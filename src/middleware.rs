use axum::{
    Json,
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, Response, StatusCode, header},
    middleware::Next,
    response::IntoResponse,
};
use serde_json::json;
use std::net::SocketAddr;

use crate::rate_limiter::{Admission, RateLimiterEnum};

#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: RateLimiterEnum,
    pub trust_forwarded_for: bool,
}

pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response<Body> {
    let client_id = client_identity(&req, state.trust_forwarded_for);

    let path = req.uri().path();
    tracing::info!("Incoming request - client: {}, path: {}", client_id, path);

    match state.limiter.admit(&client_id).await {
        Admission::Allowed => {
            tracing::info!("Rate limit check passed for client: {}", client_id);
            next.run(req).await
        }
        Admission::Rejected {
            retry_after_seconds,
        } => {
            tracing::warn!("Rate limit exceeded for client: {}", client_id);
            too_many_requests(retry_after_seconds)
        }
    }
}

// Peer address by default; the first x-forwarded-for hop only when that header is trusted.
fn client_identity(req: &Request<Body>, trust_forwarded_for: bool) -> String {
    let forwarded = trust_forwarded_for
        .then(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .flatten();

    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn too_many_requests(retry_after_seconds: u64) -> Response<Body> {
    let detail = format!(
        "Rate limit exceeded. Try again in {} seconds.",
        retry_after_seconds
    );
    let mut response =
        (StatusCode::TOO_MANY_REQUESTS, Json(json!({ "detail": detail }))).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_seconds));
    response
}
