//! Product document storage and rendering
//!
//! Products are stored as the raw JSON delivered by the product pipeline.
//! The annotation UI only needs a small shaped subset, localized to the
//! annotator's language.

use crate::Result;
use sqlx::SqlitePool;

/// Insert or replace a product document
pub async fn upsert_product(
    pool: &SqlitePool,
    barcode: &str,
    data: &serde_json::Value,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO products (barcode, data, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(barcode) DO UPDATE SET
            data = excluded.data,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(barcode)
    .bind(data.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the raw product document for a barcode
pub async fn get_product(pool: &SqlitePool, barcode: &str) -> Result<Option<serde_json::Value>> {
    let raw: Option<String> = sqlx::query_scalar("SELECT data FROM products WHERE barcode = ?")
        .bind(barcode)
        .fetch_optional(pool)
        .await?;

    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(&raw).map_err(|e| {
            crate::Error::Internal(format!("Malformed product document for {barcode}: {e}"))
        })?)),
        None => Ok(None),
    }
}

/// Shape a raw product document for the annotation UI
///
/// Picks the localized field (`{field}_{lang}`) and falls back to the
/// unsuffixed field when the language has no value.
pub fn render_product(barcode: &str, data: &serde_json::Value, lang: &str) -> serde_json::Value {
    serde_json::json!({
        "barcode": barcode,
        "product_name": localized_field(data, "product_name", lang),
        "ingredients_text": localized_field(data, "ingredients_text", lang),
        "image_url": data.get("image_url").cloned().unwrap_or(serde_json::Value::Null),
        "brands": data.get("brands").cloned().unwrap_or(serde_json::Value::Null),
    })
}

fn localized_field(data: &serde_json::Value, field: &str, lang: &str) -> serde_json::Value {
    data.get(format!("{field}_{lang}"))
        .filter(|v| !v.is_null())
        .or_else(|| data.get(field))
        .cloned()
        .unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_tables;
    use serde_json::json;

    #[tokio::test]
    async fn test_upsert_and_get_product() {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        create_tables(&pool).await.expect("Failed to create schema");

        let doc = json!({"product_name": "Juice", "brands": "Acme"});
        upsert_product(&pool, "111", &doc).await.unwrap();

        let loaded = get_product(&pool, "111").await.unwrap().unwrap();
        assert_eq!(loaded["product_name"], "Juice");

        // Replacement keeps the latest document
        let doc = json!({"product_name": "Orange Juice"});
        upsert_product(&pool, "111", &doc).await.unwrap();
        let loaded = get_product(&pool, "111").await.unwrap().unwrap();
        assert_eq!(loaded["product_name"], "Orange Juice");

        assert!(get_product(&pool, "999").await.unwrap().is_none());
    }

    #[test]
    fn test_render_prefers_localized_fields() {
        let doc = json!({
            "product_name": "Orange Juice",
            "product_name_fr": "Jus d'orange",
            "ingredients_text": "oranges, water",
            "image_url": "https://img.example/111.jpg",
        });

        let rendered = render_product("111", &doc, "fr");
        assert_eq!(rendered["barcode"], "111");
        assert_eq!(rendered["product_name"], "Jus d'orange");
        // No French ingredients: falls back to the unsuffixed field
        assert_eq!(rendered["ingredients_text"], "oranges, water");
        assert_eq!(rendered["image_url"], "https://img.example/111.jpg");
    }

    #[test]
    fn test_render_missing_fields_are_null() {
        let rendered = render_product("111", &json!({}), "en");
        assert!(rendered["product_name"].is_null());
        assert!(rendered["image_url"].is_null());
    }
}
