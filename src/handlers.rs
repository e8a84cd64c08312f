use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::comparator::Comparator;
use crate::error::AppError;
use crate::identifier::extract_identifier;
use crate::lookup::find_cached_comparison;
use crate::middleware::{RateLimitState, rate_limit_middleware};
use crate::storage::ComparisonStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ComparisonStore>,
    pub comparator: Arc<dyn Comparator>,
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub product1_url: String,
    pub product2_url: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CompareResponse {
    pub cached: bool,
    pub result: String,
}

/// Builds the router. Only `/compare` sits behind the rate limiter.
pub fn router(state: AppState, rate_limit: RateLimitState) -> Router {
    let limited = Router::new()
        .route("/compare", post(compare))
        .route_layer(ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        )));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(limited)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "Hello": "World" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn compare(
    State(state): State<AppState>,
    Json(req): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, AppError> {
    let cached =
        find_cached_comparison(state.store.as_ref(), &req.product1_url, &req.product2_url).await;
    if let Some(result) = cached.result() {
        return Ok(Json(CompareResponse {
            cached: true,
            result: result.to_string(),
        }));
    }
    if let Some(error) = cached.error() {
        tracing::debug!("computing fresh comparison after cache failure: {}", error);
    }

    let result = state
        .comparator
        .compare(&req.product1_url, &req.product2_url)
        .await?;

    remember(state.store.as_ref(), &req, &result).await;

    Ok(Json(CompareResponse {
        cached: false,
        result,
    }))
}

// Best effort: a failed write only means the next identical request recomputes.
async fn remember(store: &dyn ComparisonStore, req: &CompareRequest, result: &str) {
    let (Some(id1), Some(id2)) = (
        extract_identifier(&req.product1_url),
        extract_identifier(&req.product2_url),
    ) else {
        tracing::debug!("not caching comparison: identifier missing from a URL");
        return;
    };

    let saved = async {
        let product1 = store.upsert_product(&id1).await?;
        let product2 = store.upsert_product(&id2).await?;
        store
            .save_comparison(product1.key, product2.key, result.to_string())
            .await
    }
    .await;

    if let Err(e) = saved {
        tracing::warn!("failed to cache comparison for {} vs {}: {}", id1, id2, e);
    }
}
