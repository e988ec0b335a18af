//! Category prediction API
//!
//! Serves pending category predictions to annotators and records their
//! decisions.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use factgate_common::db::{categories, products};
use factgate_common::lang::normalize_lang;
use factgate_common::models::{Task, TaskFilter, TaskKind};

use crate::api::ApiError;
use crate::services::selection;
use crate::AppState;

/// Query parameters for prediction selection
#[derive(Debug, Deserialize)]
pub struct PredictionQuery {
    /// Annotation campaign to draw from
    pub campaign: Option<String>,
    /// Country restriction
    pub country: Option<String>,
    /// Category area restriction
    pub category: Option<String>,
    /// Display language for product and category names
    pub lang: Option<String>,
}

/// GET /api/v1/categories/predictions
///
/// One random pending category prediction matching the filters, with enough
/// product context to render a decision UI. An empty backlog is a normal
/// result, not an error.
pub async fn get_random_prediction(
    State(state): State<AppState>,
    Query(query): Query<PredictionQuery>,
) -> Result<Json<Value>, ApiError> {
    let lang = normalize_lang(query.lang.as_deref());
    let filter = TaskFilter {
        kind: Some(TaskKind::CategoryPrediction),
        campaign: query.campaign,
        country: query.country,
        category: query.category,
        ..TaskFilter::default()
    };

    match selection::select_task(&state.db, &filter).await? {
        None => Ok(Json(json!({ "status": "no_prediction_left" }))),
        Some(task) => Ok(Json(prediction_response(&state, &task, &lang).await?)),
    }
}

/// GET /api/v1/categories/predictions/:barcode
///
/// A pending category prediction for one specific product.
pub async fn get_prediction_by_product(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
    Query(query): Query<PredictionQuery>,
) -> Result<Json<Value>, ApiError> {
    let lang = normalize_lang(query.lang.as_deref());
    let filter = TaskFilter {
        kind: Some(TaskKind::CategoryPrediction),
        subject_id: Some(barcode),
        ..TaskFilter::default()
    };

    match selection::select_task(&state.db, &filter).await? {
        None => Ok(Json(json!({ "status": "no_prediction_left" }))),
        Some(task) => Ok(Json(prediction_response(&state, &task, &lang).await?)),
    }
}

/// Annotation decision for a category prediction
#[derive(Debug, Deserialize)]
pub struct AnnotateRequest {
    pub task_id: Uuid,
    /// -1 reject, 0 neutral, 1 accept
    pub annotation: i64,
    /// Propagate an accepted value as a confirmed fact (default true)
    pub save: Option<bool>,
}

/// POST /api/v1/categories/annotate
pub async fn annotate_category(
    State(state): State<AppState>,
    Json(request): Json<AnnotateRequest>,
) -> Result<Json<Value>, ApiError> {
    let persist = request.save.unwrap_or(true);
    state
        .resolver
        .resolve(request.task_id, request.annotation, persist)
        .await?;

    Ok(Json(json!({ "status": "saved" })))
}

async fn prediction_response(state: &AppState, task: &Task, lang: &str) -> Result<Value, ApiError> {
    let product = products::get_product(&state.db, &task.subject_id)
        .await?
        .map(|data| products::render_product(&task.subject_id, &data, lang));

    let name = categories::category_name(&state.db, &task.predicted_value, lang)
        .await?
        .unwrap_or_else(|| task.predicted_value.clone());

    Ok(json!({
        "task_id": task.id.to_string(),
        "product": product,
        "prediction": {
            "id": task.predicted_value,
            "name": name,
            "confidence": task.confidence,
        },
    }))
}
