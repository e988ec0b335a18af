//! Integration tests for factgate-api endpoints
//!
//! Drives the full router with in-memory collaborators: an in-memory SQLite
//! database, a stub correction source, and a recording fact sink.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt; // for `oneshot` method

use factgate_api::services::correction_source::{CorrectionSource, CorrectionSourceError};
use factgate_api::services::fact_sink::FactSink;
use factgate_api::{build_router, AppState};
use factgate_common::db::init::create_tables;
use factgate_common::db::{categories, products, tasks};
use factgate_common::models::{CorrectionCluster, TaskState, TermCorrection};

/// Suggests "eggs"/"egos" wherever the text contains "egss"
struct StubCorrectionSource;

#[async_trait]
impl CorrectionSource for StubCorrectionSource {
    async fn find(
        &self,
        text: &str,
        min_confidence: f64,
    ) -> Result<Vec<CorrectionCluster>, CorrectionSourceError> {
        let mut clusters = Vec::new();

        if let Some(pos) = text.find("egss") {
            let candidates: Vec<TermCorrection> = [("eggs", 0.9), ("egos", 0.4)]
                .iter()
                .filter(|(_, score)| *score >= min_confidence)
                .map(|(replacement, score)| TermCorrection {
                    original_term: "egss".to_string(),
                    replacement_term: replacement.to_string(),
                    start_offset: pos,
                    end_offset: pos + 4,
                    confidence: *score,
                })
                .collect();

            if !candidates.is_empty() {
                clusters.push(CorrectionCluster::new(candidates));
            }
        }

        Ok(clusters)
    }
}

/// Records confirm calls instead of talking to a real sink
#[derive(Default)]
struct RecordingSink {
    confirmed: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl FactSink for RecordingSink {
    async fn confirm(&self, subject_id: &str, value: &str) -> anyhow::Result<()> {
        self.confirmed
            .lock()
            .unwrap()
            .push((subject_id.to_string(), value.to_string()));
        Ok(())
    }
}

/// Test helper: fresh app over an empty in-memory database
async fn setup_app() -> (axum::Router, SqlitePool, Arc<RecordingSink>) {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    create_tables(&pool).await.expect("Failed to create schema");

    let sink = Arc::new(RecordingSink::default());
    let state = AppState::new(pool.clone(), sink.clone(), Arc::new(StubCorrectionSource), 0.5);
    (build_router(state), pool, sink)
}

/// Test helper: request with empty body
fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: JSON POST request
fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Test helper: import one task over HTTP, returning its id
async fn import_task(app: &axum::Router, descriptor: Value) -> String {
    let response = app
        .clone()
        .oneshot(post_json("/api/v1/tasks/import", json!([descriptor])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "imported");
    body["task_ids"][0].as_str().unwrap().to_string()
}

/// Let fire-and-forget propagation tasks run
async fn drain_spawned() {
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
}

// =============================================================================
// Health endpoint
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _pool, _sink) = setup_app().await;

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "factgate-api");
    assert!(body["version"].is_string());
}

// =============================================================================
// Category prediction selection
// =============================================================================

#[tokio::test]
async fn test_predictions_empty_backlog() {
    let (app, _pool, _sink) = setup_app().await;

    let response = app
        .oneshot(get_request("/api/v1/categories/predictions"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "no_prediction_left");
}

#[tokio::test]
async fn test_prediction_selection_with_context() {
    let (app, pool, _sink) = setup_app().await;

    products::upsert_product(
        &pool,
        "3017620422003",
        &json!({
            "product_name": "Hazelnut spread",
            "product_name_fr": "Pâte à tartiner aux noisettes",
            "ingredients_text": "sugar, hazelnuts",
        }),
    )
    .await
    .unwrap();
    categories::upsert_category_name(&pool, "en:breakfast-spreads", "fr", "Pâtes à tartiner")
        .await
        .unwrap();

    let task_id = import_task(
        &app,
        json!({
            "kind": "category_prediction",
            "subject_id": "3017620422003",
            "predicted_value": "en:breakfast-spreads",
            "confidence": 0.92,
            "campaign": "spring",
            "country": "fr",
        }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(get_request(
            "/api/v1/categories/predictions?campaign=spring&country=fr&lang=fr",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["task_id"], task_id.as_str());
    assert_eq!(body["prediction"]["id"], "en:breakfast-spreads");
    assert_eq!(body["prediction"]["name"], "Pâtes à tartiner");
    assert_eq!(body["prediction"]["confidence"], 0.92);
    assert_eq!(body["product"]["barcode"], "3017620422003");
    assert_eq!(body["product"]["product_name"], "Pâte à tartiner aux noisettes");

    // A disjoint filter finds nothing
    let response = app
        .oneshot(get_request("/api/v1/categories/predictions?country=de"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "no_prediction_left");
}

#[tokio::test]
async fn test_prediction_by_product() {
    let (app, _pool, _sink) = setup_app().await;

    let task_id = import_task(
        &app,
        json!({
            "kind": "category_prediction",
            "subject_id": "111",
            "predicted_value": "en:sodas",
            "confidence": 0.6,
        }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/categories/predictions/111"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["task_id"], task_id.as_str());
    // No localized name registered: falls back to the raw category id
    assert_eq!(body["prediction"]["name"], "en:sodas");

    let response = app
        .oneshot(get_request("/api/v1/categories/predictions/999"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "no_prediction_left");
}

// =============================================================================
// Annotation
// =============================================================================

#[tokio::test]
async fn test_annotate_accept_and_propagate() {
    let (app, pool, sink) = setup_app().await;

    let task_id = import_task(
        &app,
        json!({
            "kind": "category_prediction",
            "subject_id": "111",
            "predicted_value": "en:sodas",
            "confidence": 0.6,
        }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/categories/annotate",
            json!({ "task_id": task_id, "annotation": 1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "saved");

    drain_spawned().await;
    let confirmed = sink.confirmed.lock().unwrap().clone();
    assert_eq!(confirmed, vec![("111".to_string(), "en:sodas".to_string())]);

    let stored = tasks::get_task(&pool, task_id.parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.state, TaskState::Annotated);
    assert_eq!(stored.annotation, Some(1));

    // Second decision on the same task loses the race
    let response = app
        .oneshot(post_json(
            "/api/v1/categories/annotate",
            json!({ "task_id": task_id, "annotation": -1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "already_annotated");

    let stored = tasks::get_task(&pool, task_id.parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.annotation, Some(1));
}

#[tokio::test]
async fn test_annotate_invalid_value() {
    let (app, pool, _sink) = setup_app().await;

    let task_id = import_task(
        &app,
        json!({
            "kind": "category_prediction",
            "subject_id": "111",
            "predicted_value": "en:sodas",
            "confidence": 0.6,
        }),
    )
    .await;

    let response = app
        .oneshot(post_json(
            "/api/v1/categories/annotate",
            json!({ "task_id": task_id, "annotation": 5 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "invalid_value");

    // Task is untouched
    let stored = tasks::get_task(&pool, task_id.parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.state, TaskState::Pending);
}

#[tokio::test]
async fn test_annotate_unknown_task() {
    let (app, _pool, _sink) = setup_app().await;

    let response = app
        .oneshot(post_json(
            "/api/v1/categories/annotate",
            json!({
                "task_id": "00000000-0000-0000-0000-000000000000",
                "annotation": 1,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "not_found");
}

// =============================================================================
// Insights
// =============================================================================

#[tokio::test]
async fn test_random_insight_with_type_filter() {
    let (app, _pool, _sink) = setup_app().await;

    import_task(
        &app,
        json!({
            "kind": "insight",
            "subject_id": "222",
            "predicted_value": "en:organic",
            "confidence": 0.7,
            "insight_type": "label",
            "country": "fr",
        }),
    )
    .await;
    import_task(
        &app,
        json!({
            "kind": "insight",
            "subject_id": "333",
            "predicted_value": "Acme",
            "confidence": 0.8,
            "insight_type": "brand",
        }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/insights/random?type=label"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "found");
    assert_eq!(body["insight"]["type"], "label");
    assert_eq!(body["insight"]["barcode"], "222");
    assert_eq!(body["insight"]["value"], "en:organic");

    let response = app
        .oneshot(get_request("/api/v1/insights/random?type=expiration_date"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "no_insights");
}

#[tokio::test]
async fn test_insights_by_product() {
    let (app, _pool, _sink) = setup_app().await;

    for insight_type in ["label", "brand"] {
        import_task(
            &app,
            json!({
                "kind": "insight",
                "subject_id": "222",
                "predicted_value": "x",
                "confidence": 0.7,
                "insight_type": insight_type,
            }),
        )
        .await;
    }

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/insights/222"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "found");
    assert_eq!(body["insights"].as_array().unwrap().len(), 2);

    let response = app.oneshot(get_request("/api/v1/insights/999")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "no_insights");
}

#[tokio::test]
async fn test_annotate_insight_without_save() {
    let (app, pool, sink) = setup_app().await;

    let insight_id = import_task(
        &app,
        json!({
            "kind": "insight",
            "subject_id": "222",
            "predicted_value": "en:organic",
            "confidence": 0.7,
            "insight_type": "label",
        }),
    )
    .await;

    let response = app
        .oneshot(post_json(
            "/api/v1/insights/annotate",
            json!({ "insight_id": insight_id, "annotation": 1, "save": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    drain_spawned().await;
    // Trial annotation: recorded but never propagated
    assert!(sink.confirmed.lock().unwrap().is_empty());

    let stored = tasks::get_task(&pool, insight_id.parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.state, TaskState::Annotated);
    assert_eq!(stored.persisted, Some(false));
}

// =============================================================================
// Ingredient spellcheck
// =============================================================================

#[tokio::test]
async fn test_spellcheck_corrects_text() {
    let (app, _pool, _sink) = setup_app().await;

    let response = app
        .oneshot(post_json(
            "/api/v1/predict/ingredients/spellcheck",
            json!({ "text": "contains egss and milk" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["text"], "contains egss and milk");
    assert_eq!(body["corrected"], "contains eggs and milk");

    let corrections = body["corrections"].as_array().unwrap();
    assert_eq!(corrections.len(), 1);
    assert_eq!(corrections[0]["original_term"], "egss");
    assert_eq!(corrections[0]["replacement_term"], "eggs");
    assert_eq!(corrections[0]["start_offset"], 9);
    assert_eq!(corrections[0]["end_offset"], 13);
}

#[tokio::test]
async fn test_spellcheck_honors_confidence_threshold() {
    let (app, _pool, _sink) = setup_app().await;

    // Both stub suggestions score below 0.95: nothing is applied
    let response = app
        .oneshot(post_json(
            "/api/v1/predict/ingredients/spellcheck",
            json!({ "text": "contains egss and milk", "confidence": 0.95 }),
        ))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["corrected"], "contains egss and milk");
    assert!(body["corrections"].as_array().unwrap().is_empty());
}
