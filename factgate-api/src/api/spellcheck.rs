//! Ingredient spellcheck API

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::ApiError;
use crate::AppState;

/// Spellcheck request body
#[derive(Debug, Deserialize)]
pub struct SpellcheckRequest {
    /// The ingredient list to check
    pub text: String,
    /// Minimum suggestion confidence; the configured default applies when unset
    pub confidence: Option<f64>,
}

/// POST /api/v1/predict/ingredients/spellcheck
pub async fn spellcheck_ingredients(
    State(state): State<AppState>,
    Json(request): Json<SpellcheckRequest>,
) -> Result<Json<Value>, ApiError> {
    let min_confidence = request.confidence.unwrap_or(state.default_min_confidence);
    let outcome = state.spellcheck.check(&request.text, min_confidence).await?;

    Ok(Json(json!({
        "text": outcome.text,
        "corrected": outcome.corrected,
        "corrections": outcome.corrections,
    })))
}
