//! Task intake API
//!
//! Write path for the external prediction pipeline: bulk-inserts pending
//! tasks. Insertion only; existing tasks are never touched here.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use factgate_common::db::tasks;
use factgate_common::models::{Task, TaskKind};

use crate::api::ApiError;
use crate::AppState;

/// One incoming task descriptor
#[derive(Debug, Deserialize)]
pub struct TaskImport {
    pub kind: TaskKind,
    pub subject_id: String,
    pub predicted_value: String,
    pub confidence: f64,
    pub campaign: Option<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    pub insight_type: Option<String>,
    pub data: Option<Value>,
}

/// POST /api/v1/tasks/import
pub async fn import_tasks(
    State(state): State<AppState>,
    Json(items): Json<Vec<TaskImport>>,
) -> Result<Json<Value>, ApiError> {
    let mut task_ids = Vec::with_capacity(items.len());

    for item in items {
        let mut task = Task::new(item.kind, item.subject_id, item.predicted_value, item.confidence);
        task.campaign = item.campaign;
        task.country = item.country;
        task.category = item.category;
        task.insight_type = item.insight_type;
        task.data = item.data;

        tasks::insert_task(&state.db, &task).await?;
        task_ids.push(task.id.to_string());
    }

    tracing::info!(count = task_ids.len(), "Imported pending tasks");

    Ok(Json(json!({
        "status": "imported",
        "count": task_ids.len(),
        "task_ids": task_ids,
    })))
}
