use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::comparator::CompareError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Compare(#[from] CompareError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Compare(CompareError::Unconfigured) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Compare(CompareError::Backend(_)) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::error!("request failed with {}: {}", status, self);
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
