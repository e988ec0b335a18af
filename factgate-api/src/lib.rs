//! factgate-api library - HTTP surface for the curation service
//!
//! Serves predictions to annotators, records their decisions, and exposes
//! the ingredient spellchecker.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;

pub mod api;
pub mod services;

use services::correction_source::CorrectionSource;
use services::fact_sink::FactSink;
use services::resolver::AnnotationResolver;
use services::spellcheck::SpellcheckService;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Task/product database
    pub db: SqlitePool,
    /// Applies annotation decisions
    pub resolver: AnnotationResolver,
    /// Drives the correction source and composer
    pub spellcheck: SpellcheckService,
    /// Minimum suggestion confidence when a request does not set one
    pub default_min_confidence: f64,
}

impl AppState {
    /// Create new application state with injected collaborators
    pub fn new(
        db: SqlitePool,
        facts: Arc<dyn FactSink>,
        corrections: Arc<dyn CorrectionSource>,
        default_min_confidence: f64,
    ) -> Self {
        Self {
            resolver: AnnotationResolver::new(db.clone(), facts),
            spellcheck: SpellcheckService::new(corrections),
            db,
            default_min_confidence,
        }
    }
}

/// Build application router
///
/// The annotation UI is served from another origin; the API mirrors the
/// original deployment's allow-all CORS policy.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};
    use tower_http::cors::{Any, CorsLayer};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/v1/categories/predictions",
            get(api::get_random_prediction),
        )
        .route(
            "/api/v1/categories/predictions/:barcode",
            get(api::get_prediction_by_product),
        )
        .route("/api/v1/categories/annotate", post(api::annotate_category))
        .route("/api/v1/insights/random", get(api::get_random_insight))
        .route("/api/v1/insights/:barcode", get(api::get_insights_by_product))
        .route("/api/v1/insights/annotate", post(api::annotate_insight))
        .route(
            "/api/v1/predict/ingredients/spellcheck",
            post(api::spellcheck_ingredients),
        )
        .route("/api/v1/tasks/import", post(api::import_tasks))
        .merge(api::health_routes())
        .layer(cors)
        .with_state(state)
}
