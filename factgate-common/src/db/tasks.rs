//! Annotation task persistence
//!
//! Selection reads are plain queries with no reservation side effect; the
//! single write path is [`atomic_resolve`], a conditional UPDATE that only
//! succeeds while the task is still pending. Concurrent resolution attempts
//! on one task serialize on that condition: exactly one wins.

use crate::models::{Task, TaskFilter, TaskKind, TaskState};
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, kind, subject_id, predicted_value, confidence, campaign, country, \
                            category, insight_type, data, state, annotation, persisted, \
                            created_at, annotated_at";

/// Insert a new task
pub async fn insert_task(pool: &SqlitePool, task: &Task) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO annotation_tasks (
            id, kind, subject_id, predicted_value, confidence,
            campaign, country, category, insight_type, data,
            state, annotation, persisted, annotated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(task.id.to_string())
    .bind(task.kind.as_str())
    .bind(&task.subject_id)
    .bind(&task.predicted_value)
    .bind(task.confidence)
    .bind(&task.campaign)
    .bind(&task.country)
    .bind(&task.category)
    .bind(&task.insight_type)
    .bind(task.data.as_ref().map(|d| d.to_string()))
    .bind(task.state.as_str())
    .bind(task.annotation)
    .bind(task.persisted)
    .bind(&task.annotated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a task by id
pub async fn get_task(pool: &SqlitePool, id: Uuid) -> Result<Option<Task>> {
    let row = sqlx::query(&format!(
        "SELECT {TASK_COLUMNS} FROM annotation_tasks WHERE id = ?"
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(row_to_task(&row)?)),
        None => Ok(None),
    }
}

/// All pending tasks satisfying the filter
///
/// Unset filter fields place no constraint; the state constraint is always
/// applied.
pub async fn find_pending(pool: &SqlitePool, filter: &TaskFilter) -> Result<Vec<Task>> {
    let mut sql = format!("SELECT {TASK_COLUMNS} FROM annotation_tasks WHERE state = ?");
    let mut binds: Vec<String> = vec![TaskState::Pending.as_str().to_string()];

    if let Some(kind) = filter.kind {
        sql.push_str(" AND kind = ?");
        binds.push(kind.as_str().to_string());
    }
    if let Some(campaign) = &filter.campaign {
        sql.push_str(" AND campaign = ?");
        binds.push(campaign.clone());
    }
    if let Some(country) = &filter.country {
        sql.push_str(" AND country = ?");
        binds.push(country.clone());
    }
    if let Some(category) = &filter.category {
        sql.push_str(" AND category = ?");
        binds.push(category.clone());
    }
    if let Some(insight_type) = &filter.insight_type {
        sql.push_str(" AND insight_type = ?");
        binds.push(insight_type.clone());
    }
    if let Some(subject_id) = &filter.subject_id {
        sql.push_str(" AND subject_id = ?");
        binds.push(subject_id.clone());
    }

    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(row_to_task).collect()
}

/// Flip a task from pending to annotated, conditionally
///
/// Returns `false` when the task was no longer pending at the time of the
/// attempt (somebody else annotated it first) or does not exist. The state
/// check and the write are one statement, so racing resolvers cannot both
/// succeed.
pub async fn atomic_resolve(
    pool: &SqlitePool,
    id: Uuid,
    annotation: i64,
    persisted: bool,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE annotation_tasks
        SET state = 'annotated',
            annotation = ?,
            persisted = ?,
            annotated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND state = 'pending'
        "#,
    )
    .bind(annotation)
    .bind(persisted)
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

fn row_to_task(row: &SqliteRow) -> Result<Task> {
    let id_str: String = row.get("id");
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| Error::Internal(format!("Malformed task id {id_str}: {e}")))?;

    let kind_str: String = row.get("kind");
    let kind = TaskKind::parse(&kind_str)
        .ok_or_else(|| Error::Internal(format!("Unknown task kind: {kind_str}")))?;

    let state_str: String = row.get("state");
    let state = TaskState::parse(&state_str)
        .ok_or_else(|| Error::Internal(format!("Unknown task state: {state_str}")))?;

    let data: Option<String> = row.get("data");
    let data = match data {
        Some(raw) => Some(
            serde_json::from_str(&raw)
                .map_err(|e| Error::Internal(format!("Malformed task data: {e}")))?,
        ),
        None => None,
    };

    let persisted: Option<i64> = row.get("persisted");

    Ok(Task {
        id,
        kind,
        subject_id: row.get("subject_id"),
        predicted_value: row.get("predicted_value"),
        confidence: row.get("confidence"),
        campaign: row.get("campaign"),
        country: row.get("country"),
        category: row.get("category"),
        insight_type: row.get("insight_type"),
        data,
        state,
        annotation: row.get("annotation"),
        persisted: persisted.map(|p| p != 0),
        created_at: row.get("created_at"),
        annotated_at: row.get("annotated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_tables;

    async fn setup_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        create_tables(&pool).await.expect("Failed to create schema");
        pool
    }

    fn category_task(subject: &str, campaign: Option<&str>, country: Option<&str>) -> Task {
        let mut task = Task::new(
            TaskKind::CategoryPrediction,
            subject.to_string(),
            "en:orange-juices".to_string(),
            0.87,
        );
        task.campaign = campaign.map(str::to_string);
        task.country = country.map(str::to_string);
        task
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let pool = setup_pool().await;

        let mut task = Task::new(
            TaskKind::Insight,
            "4012345678901".to_string(),
            "en:organic".to_string(),
            0.73,
        );
        task.insight_type = Some("label".to_string());
        task.data = Some(serde_json::json!({"source": "ocr"}));

        insert_task(&pool, &task).await.expect("Failed to insert task");

        let loaded = get_task(&pool, task.id)
            .await
            .expect("Failed to load task")
            .expect("Task not found");

        assert_eq!(loaded.id, task.id);
        assert_eq!(loaded.kind, TaskKind::Insight);
        assert_eq!(loaded.subject_id, "4012345678901");
        assert_eq!(loaded.predicted_value, "en:organic");
        assert_eq!(loaded.insight_type.as_deref(), Some("label"));
        assert_eq!(loaded.data, Some(serde_json::json!({"source": "ocr"})));
        assert_eq!(loaded.state, TaskState::Pending);
        assert!(loaded.created_at.is_some());
    }

    #[tokio::test]
    async fn test_get_missing_task() {
        let pool = setup_pool().await;
        let loaded = get_task(&pool, Uuid::new_v4()).await.expect("Query should succeed");
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_find_pending_applies_all_filters() {
        let pool = setup_pool().await;

        let a = category_task("111", Some("spring"), Some("fr"));
        let b = category_task("222", Some("spring"), Some("de"));
        let c = category_task("333", None, Some("fr"));
        for task in [&a, &b, &c] {
            insert_task(&pool, task).await.unwrap();
        }

        let filter = TaskFilter {
            kind: Some(TaskKind::CategoryPrediction),
            campaign: Some("spring".to_string()),
            country: Some("fr".to_string()),
            ..TaskFilter::default()
        };
        let found = find_pending(&pool, &filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, a.id);

        // No kind constraint, country only
        let filter = TaskFilter {
            country: Some("fr".to_string()),
            ..TaskFilter::default()
        };
        let found = find_pending(&pool, &filter).await.unwrap();
        assert_eq!(found.len(), 2);

        // Conjunction matching nothing is an empty result, not an error
        let filter = TaskFilter {
            campaign: Some("spring".to_string()),
            country: Some("it".to_string()),
            ..TaskFilter::default()
        };
        let found = find_pending(&pool, &filter).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_find_pending_excludes_annotated() {
        let pool = setup_pool().await;

        let task = category_task("111", None, None);
        insert_task(&pool, &task).await.unwrap();
        assert!(atomic_resolve(&pool, task.id, 1, true).await.unwrap());

        let found = find_pending(&pool, &TaskFilter::default()).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_atomic_resolve_wins_once() {
        let pool = setup_pool().await;

        let task = category_task("111", None, None);
        insert_task(&pool, &task).await.unwrap();

        assert!(atomic_resolve(&pool, task.id, 1, true).await.unwrap());
        // Second attempt loses, regardless of value
        assert!(!atomic_resolve(&pool, task.id, -1, false).await.unwrap());

        // Recorded value is the winner's
        let loaded = get_task(&pool, task.id).await.unwrap().unwrap();
        assert_eq!(loaded.state, TaskState::Annotated);
        assert_eq!(loaded.annotation, Some(1));
        assert_eq!(loaded.persisted, Some(true));
        assert!(loaded.annotated_at.is_some());
    }

    #[tokio::test]
    async fn test_atomic_resolve_missing_task() {
        let pool = setup_pool().await;
        assert!(!atomic_resolve(&pool, Uuid::new_v4(), 1, true).await.unwrap());
    }
}
