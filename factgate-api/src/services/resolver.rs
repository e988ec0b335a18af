//! Annotation resolution
//!
//! Applies a human decision to a pending task. Validation happens before any
//! store access; the state flip itself is a conditional UPDATE, so of any
//! number of concurrent resolution attempts on one task exactly one succeeds
//! and the rest observe `AlreadyAnnotated`.

use factgate_common::db::tasks;
use factgate_common::models::AnnotationValue;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::services::fact_sink::FactSink;

/// Annotation resolution errors
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Annotation outside the closed set {-1, 0, 1}
    #[error("Annotation value out of range: {0}")]
    InvalidValue(i64),

    /// Referenced task does not exist
    #[error("Task not found: {0}")]
    NotFound(Uuid),

    /// Somebody else annotated the task first; not a fatal failure
    #[error("Task already annotated: {0}")]
    AlreadyAnnotated(Uuid),

    /// Store failure
    #[error(transparent)]
    Store(#[from] factgate_common::Error),
}

/// Acknowledgement of a successful resolution
#[derive(Debug, Clone)]
pub struct Resolution {
    pub task_id: Uuid,
    pub annotation: i64,
    /// Whether the accepted value was handed to the fact sink
    pub persisted: bool,
}

/// Resolves annotation decisions against the task store
#[derive(Clone)]
pub struct AnnotationResolver {
    db: SqlitePool,
    facts: Arc<dyn FactSink>,
}

impl AnnotationResolver {
    pub fn new(db: SqlitePool, facts: Arc<dyn FactSink>) -> Self {
        Self { db, facts }
    }

    /// Apply `annotation` to the task identified by `task_ref`
    ///
    /// When the decision is accept and `persist` is true, the accepted value
    /// is additionally propagated to the fact sink in the background; sink
    /// failures are logged and do not affect the outcome.
    pub async fn resolve(
        &self,
        task_ref: Uuid,
        annotation: i64,
        persist: bool,
    ) -> Result<Resolution, ResolveError> {
        let value = AnnotationValue::from_i64(annotation)
            .ok_or(ResolveError::InvalidValue(annotation))?;

        let task = tasks::get_task(&self.db, task_ref)
            .await?
            .ok_or(ResolveError::NotFound(task_ref))?;

        let propagate = persist && value == AnnotationValue::Accept;

        let won = tasks::atomic_resolve(&self.db, task_ref, value.as_i64(), propagate).await?;
        if !won {
            return Err(ResolveError::AlreadyAnnotated(task_ref));
        }

        tracing::info!(
            task_id = %task_ref,
            annotation = value.as_i64(),
            propagate,
            "Annotation recorded"
        );

        if propagate {
            let facts = Arc::clone(&self.facts);
            let subject_id = task.subject_id.clone();
            let predicted_value = task.predicted_value.clone();

            tokio::spawn(async move {
                if let Err(e) = facts.confirm(&subject_id, &predicted_value).await {
                    tracing::error!(
                        subject_id = %subject_id,
                        error = %e,
                        "Fact propagation failed; annotation record stands"
                    );
                }
            });
        }

        Ok(Resolution {
            task_id: task_ref,
            annotation: value.as_i64(),
            persisted: propagate,
        })
    }
}
