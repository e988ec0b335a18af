//! factgate-api - Human-in-the-loop curation of product metadata
//!
//! Serves category/insight predictions to annotators, records accept/reject
//! decisions, propagates accepted values as confirmed facts, and offers an
//! ingredient-list spellchecker backed by a search engine.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use factgate_api::services::correction_source::{CorrectionSource, SuggestCorrectionSource};
use factgate_api::services::fact_sink::{FactSink, HttpFactSink, NullFactSink};
use factgate_api::{build_router, AppState};
use factgate_common::config::{ConfigOverrides, ServiceConfig};
use factgate_common::db::init_database;

/// Command-line / environment overrides; unset values fall back to the
/// config file, then to compiled defaults
#[derive(Debug, Parser)]
#[command(name = "factgate-api", version, about = "Product metadata curation service")]
struct Args {
    /// HTTP listen host
    #[arg(long, env = "FACTGATE_HOST")]
    host: Option<String>,

    /// HTTP listen port
    #[arg(long, env = "FACTGATE_PORT")]
    port: Option<u16>,

    /// SQLite database file path
    #[arg(long, env = "FACTGATE_DB")]
    database: Option<PathBuf>,

    /// Correction-source (search engine) base URL
    #[arg(long, env = "FACTGATE_CORRECTION_URL")]
    correction_url: Option<String>,

    /// Correction-source index name
    #[arg(long, env = "FACTGATE_CORRECTION_INDEX")]
    correction_index: Option<String>,

    /// Fact-sink base URL; propagation is disabled when unset
    #[arg(long, env = "FACTGATE_FACT_SINK_URL")]
    fact_sink_url: Option<String>,

    /// Minimum spellcheck suggestion confidence
    #[arg(long, env = "FACTGATE_MIN_CONFIDENCE")]
    min_confidence: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting factgate-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let config = ServiceConfig::resolve(ConfigOverrides {
        host: args.host,
        port: args.port,
        database_path: args.database,
        correction_url: args.correction_url,
        correction_index: args.correction_index,
        fact_sink_url: args.fact_sink_url,
        spellcheck_min_confidence: args.min_confidence,
    });

    info!("Database path: {}", config.database_path.display());
    let pool = init_database(&config.database_path).await?;

    let corrections: Arc<dyn CorrectionSource> = Arc::new(SuggestCorrectionSource::new(
        config.correction_url.clone(),
        config.correction_index.clone(),
    )?);
    info!(
        "Correction source: {}/{}",
        config.correction_url, config.correction_index
    );

    let facts: Arc<dyn FactSink> = match &config.fact_sink_url {
        Some(url) => {
            info!("Fact sink: {}", url);
            Arc::new(HttpFactSink::new(url.clone())?)
        }
        None => {
            info!("No fact sink configured; accepted annotations are recorded only");
            Arc::new(NullFactSink)
        }
    };

    let state = AppState::new(pool, facts, corrections, config.spellcheck_min_confidence);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("factgate-api listening on http://{}:{}", config.host, config.port);
    info!("Health check: http://{}:{}/health", config.host, config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
