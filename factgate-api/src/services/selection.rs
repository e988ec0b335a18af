//! Task selection
//!
//! Picks one pending task matching the annotator's filters, uniformly at
//! random among the eligible candidates. Randomization spreads annotator
//! attention across the backlog and makes concurrent annotators unlikely to
//! receive the same task. Selection is a pure read: nothing is reserved, and
//! a task stays selectable until an annotation decision lands.

use factgate_common::db::tasks;
use factgate_common::models::{Task, TaskFilter};
use factgate_common::Result;
use rand::seq::SliceRandom;
use sqlx::SqlitePool;

/// One pending task satisfying `filter`, or `None` when the backlog is empty
pub async fn select_task(pool: &SqlitePool, filter: &TaskFilter) -> Result<Option<Task>> {
    let candidates = tasks::find_pending(pool, filter).await?;

    let mut rng = rand::thread_rng();
    Ok(candidates.choose(&mut rng).cloned())
}
