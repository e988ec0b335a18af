//! Localized category display names
//!
//! Thin lookup table; the taxonomy itself is maintained elsewhere.

use crate::lang::DEFAULT_LANG;
use crate::Result;
use sqlx::SqlitePool;

/// Insert or update the display name for a category in one language
pub async fn upsert_category_name(
    pool: &SqlitePool,
    category_id: &str,
    lang: &str,
    name: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO category_names (category_id, lang, name)
        VALUES (?, ?, ?)
        ON CONFLICT(category_id, lang) DO UPDATE SET name = excluded.name
        "#,
    )
    .bind(category_id)
    .bind(lang)
    .bind(name)
    .execute(pool)
    .await?;

    Ok(())
}

/// Display name for a category in the requested language
///
/// Falls back to English when the requested language has no entry. Returns
/// `None` when neither exists; callers display the raw category id then.
pub async fn category_name(
    pool: &SqlitePool,
    category_id: &str,
    lang: &str,
) -> Result<Option<String>> {
    let name: Option<String> = sqlx::query_scalar(
        "SELECT name FROM category_names WHERE category_id = ? AND lang = ?",
    )
    .bind(category_id)
    .bind(lang)
    .fetch_optional(pool)
    .await?;

    if name.is_some() || lang == DEFAULT_LANG {
        return Ok(name);
    }

    let fallback: Option<String> = sqlx::query_scalar(
        "SELECT name FROM category_names WHERE category_id = ? AND lang = ?",
    )
    .bind(category_id)
    .bind(DEFAULT_LANG)
    .fetch_optional(pool)
    .await?;

    Ok(fallback)
}
