//! Database initialization
//!
//! Creates the database on first run and brings the schema up to date.
//! All `create_*_table` functions are idempotent and safe to call on every
//! startup.

use crate::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers while one annotator's write commits
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_annotation_tasks_table(pool).await?;
    create_category_names_table(pool).await?;
    create_products_table(pool).await?;
    Ok(())
}

/// Annotation tasks: both task variants share one table, discriminated by
/// `kind`. Variant-specific filter columns are NULL on the other variant.
pub async fn create_annotation_tasks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS annotation_tasks (
            id TEXT PRIMARY KEY NOT NULL,
            kind TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            predicted_value TEXT NOT NULL,
            confidence REAL NOT NULL,
            campaign TEXT,
            country TEXT,
            category TEXT,
            insight_type TEXT,
            data TEXT,
            state TEXT NOT NULL DEFAULT 'pending',
            annotation INTEGER,
            persisted INTEGER,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            annotated_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_annotation_tasks_state_kind
         ON annotation_tasks(state, kind)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_annotation_tasks_subject
         ON annotation_tasks(subject_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Localized category display names
pub async fn create_category_names_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS category_names (
            category_id TEXT NOT NULL,
            lang TEXT NOT NULL,
            name TEXT NOT NULL,
            PRIMARY KEY (category_id, lang)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Product documents, stored as raw JSON keyed by barcode
pub async fn create_products_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            barcode TEXT PRIMARY KEY NOT NULL,
            data TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
