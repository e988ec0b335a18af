//! HTTP API handlers for factgate-api

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::services::correction_source::CorrectionSourceError;
use crate::services::resolver::ResolveError;

pub mod health;
pub mod import;
pub mod insights;
pub mod predictions;
pub mod spellcheck;

pub use health::health_routes;
pub use import::import_tasks;
pub use insights::{annotate_insight, get_insights_by_product, get_random_insight};
pub use predictions::{annotate_category, get_prediction_by_product, get_random_prediction};
pub use spellcheck::spellcheck_ingredients;

/// API-level errors, mapped onto HTTP statuses
#[derive(Debug)]
pub enum ApiError {
    /// Referenced task absent (404)
    NotFound(String),
    /// Lost the annotation race; the task is already resolved (409)
    AlreadyAnnotated(String),
    /// Annotation outside {-1, 0, 1} (400)
    InvalidValue(i64),
    /// Correction source failed after retries (502)
    SourceUnavailable(String),
    /// Anything else (500)
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "status": "not_found", "error": msg }),
            ),
            ApiError::AlreadyAnnotated(msg) => (
                StatusCode::CONFLICT,
                json!({ "status": "already_annotated", "error": msg }),
            ),
            ApiError::InvalidValue(value) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "status": "invalid_value",
                    "error": format!("Annotation must be -1, 0 or 1, got {}", value),
                }),
            ),
            ApiError::SourceUnavailable(msg) => (
                StatusCode::BAD_GATEWAY,
                json!({ "status": "source_unavailable", "error": msg }),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "status": "error", "error": msg }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound(id) => ApiError::NotFound(format!("No task with id {id}")),
            ResolveError::AlreadyAnnotated(id) => {
                ApiError::AlreadyAnnotated(format!("Task {id} is already annotated"))
            }
            ResolveError::InvalidValue(value) => ApiError::InvalidValue(value),
            ResolveError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<factgate_common::Error> for ApiError {
    fn from(err: factgate_common::Error) -> Self {
        match err {
            factgate_common::Error::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CorrectionSourceError> for ApiError {
    fn from(err: CorrectionSourceError) -> Self {
        ApiError::SourceUnavailable(err.to_string())
    }
}
