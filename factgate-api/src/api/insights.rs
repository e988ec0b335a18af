//! Insight API
//!
//! Serves pending generic insights (labels, brands, ...) and records
//! annotator decisions on them.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use factgate_common::db::tasks;
use factgate_common::models::{Task, TaskFilter, TaskKind};

use crate::api::ApiError;
use crate::services::selection;
use crate::AppState;

/// Query parameters for insight selection
#[derive(Debug, Deserialize)]
pub struct InsightQuery {
    /// Insight type restriction ("label", "brand", ...)
    #[serde(rename = "type")]
    pub insight_type: Option<String>,
    /// Country restriction
    pub country: Option<String>,
}

/// GET /api/v1/insights/random
pub async fn get_random_insight(
    State(state): State<AppState>,
    Query(query): Query<InsightQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = TaskFilter {
        kind: Some(TaskKind::Insight),
        insight_type: query.insight_type,
        country: query.country,
        ..TaskFilter::default()
    };

    match selection::select_task(&state.db, &filter).await? {
        None => Ok(Json(json!({ "status": "no_insights" }))),
        Some(task) => Ok(Json(json!({
            "status": "found",
            "insight": serialize_insight(&task),
        }))),
    }
}

/// GET /api/v1/insights/:barcode
///
/// All pending insights for one product.
pub async fn get_insights_by_product(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let filter = TaskFilter {
        kind: Some(TaskKind::Insight),
        subject_id: Some(barcode),
        ..TaskFilter::default()
    };

    let insights = tasks::find_pending(&state.db, &filter).await?;

    if insights.is_empty() {
        Ok(Json(json!({ "status": "no_insights" })))
    } else {
        let serialized: Vec<Value> = insights.iter().map(serialize_insight).collect();
        Ok(Json(json!({
            "status": "found",
            "insights": serialized,
        })))
    }
}

/// Annotation decision for an insight
#[derive(Debug, Deserialize)]
pub struct AnnotateInsightRequest {
    pub insight_id: Uuid,
    /// -1 reject, 0 neutral, 1 accept
    pub annotation: i64,
    /// Propagate an accepted value as a confirmed fact (default true)
    pub save: Option<bool>,
}

/// POST /api/v1/insights/annotate
pub async fn annotate_insight(
    State(state): State<AppState>,
    Json(request): Json<AnnotateInsightRequest>,
) -> Result<Json<Value>, ApiError> {
    let persist = request.save.unwrap_or(true);
    state
        .resolver
        .resolve(request.insight_id, request.annotation, persist)
        .await?;

    Ok(Json(json!({ "status": "saved" })))
}

fn serialize_insight(task: &Task) -> Value {
    json!({
        "id": task.id.to_string(),
        "type": task.insight_type,
        "barcode": task.subject_id,
        "value": task.predicted_value,
        "confidence": task.confidence,
        "country": task.country,
        "data": task.data,
    })
}
