//! Correction source client
//!
//! Queries the configured search engine's term-suggest API for candidate
//! corrections. Each suggest entry is one logical edit (a cluster of
//! alternative proposals for the same source token); downstream composition
//! applies at most one member per cluster.

use async_trait::async_trait;
use factgate_common::models::{CorrectionCluster, TermCorrection};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = "factgate/0.1.0 (https://github.com/factgate/factgate)";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const RETRY_ATTEMPTS: u32 = 3;
const RETRY_INITIAL_BACKOFF_MS: u64 = 100;

/// Correction source errors
#[derive(Debug, Error)]
pub enum CorrectionSourceError {
    /// The source could not be reached or kept failing after retries
    #[error("Correction source unavailable: {0}")]
    Unavailable(String),

    /// The source answered with something we cannot interpret
    #[error("Unexpected correction source response: {0}")]
    Parse(String),
}

/// Source of candidate term corrections for a text
#[async_trait]
pub trait CorrectionSource: Send + Sync {
    /// Candidate corrections for `text`, grouped per logical edit
    ///
    /// Members are filtered to `confidence >= min_confidence`; clusters are
    /// ordered by ascending start offset of their members. Empty clusters
    /// are never returned.
    async fn find(
        &self,
        text: &str,
        min_confidence: f64,
    ) -> Result<Vec<CorrectionCluster>, CorrectionSourceError>;
}

/// Term-suggest client against an Elasticsearch-compatible search endpoint
pub struct SuggestCorrectionSource {
    http_client: reqwest::Client,
    base_url: String,
    index: String,
}

impl SuggestCorrectionSource {
    pub fn new(base_url: String, index: String) -> Result<Self, CorrectionSourceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CorrectionSourceError::Unavailable(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            index,
        })
    }

    /// POST the suggest query, retrying transient failures with backoff
    async fn send_with_retry(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<SearchResponse, CorrectionSourceError> {
        let mut backoff_ms = RETRY_INITIAL_BACKOFF_MS;
        let mut last_error = String::new();

        for attempt in 1..=RETRY_ATTEMPTS {
            match self.http_client.post(url).json(body).send().await {
                Ok(response) if response.status().is_server_error() => {
                    last_error = format!("HTTP {}", response.status());
                }
                Ok(response) if !response.status().is_success() => {
                    // Client errors will not get better on retry
                    return Err(CorrectionSourceError::Unavailable(format!(
                        "HTTP {}",
                        response.status()
                    )));
                }
                Ok(response) => {
                    return response
                        .json::<SearchResponse>()
                        .await
                        .map_err(|e| CorrectionSourceError::Parse(e.to_string()));
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }

            if attempt < RETRY_ATTEMPTS {
                tracing::warn!(
                    attempt,
                    backoff_ms,
                    error = %last_error,
                    "Correction source request failed, will retry"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2;
            }
        }

        Err(CorrectionSourceError::Unavailable(last_error))
    }
}

#[async_trait]
impl CorrectionSource for SuggestCorrectionSource {
    async fn find(
        &self,
        text: &str,
        min_confidence: f64,
    ) -> Result<Vec<CorrectionCluster>, CorrectionSourceError> {
        let url = format!("{}/{}/_search", self.base_url, self.index);
        let body = serde_json::json!({
            "suggest": {
                "text": text,
                "corrections": {
                    "term": {
                        "field": "ingredients_text",
                        "suggest_mode": "missing"
                    }
                }
            }
        });

        tracing::debug!(index = %self.index, text_len = text.len(), "Querying correction source");

        let response = self.send_with_retry(&url, &body).await?;
        Ok(entries_to_clusters(&response.suggest.corrections, min_confidence))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    suggest: SuggestSection,
}

#[derive(Debug, Default, Deserialize)]
struct SuggestSection {
    #[serde(default)]
    corrections: Vec<SuggestEntry>,
}

#[derive(Debug, Deserialize)]
struct SuggestEntry {
    text: String,
    offset: usize,
    length: usize,
    #[serde(default)]
    options: Vec<SuggestOption>,
}

#[derive(Debug, Deserialize)]
struct SuggestOption {
    text: String,
    score: f64,
}

/// Turn suggest entries into confidence-filtered clusters, ascending by offset
fn entries_to_clusters(entries: &[SuggestEntry], min_confidence: f64) -> Vec<CorrectionCluster> {
    let mut clusters: Vec<CorrectionCluster> = entries
        .iter()
        .filter_map(|entry| {
            let candidates: Vec<TermCorrection> = entry
                .options
                .iter()
                .filter(|option| option.score >= min_confidence)
                .map(|option| TermCorrection {
                    original_term: entry.text.clone(),
                    replacement_term: option.text.clone(),
                    start_offset: entry.offset,
                    end_offset: entry.offset + entry.length,
                    confidence: option.score,
                })
                .collect();

            if candidates.is_empty() {
                None
            } else {
                Some(CorrectionCluster::new(candidates))
            }
        })
        .collect();

    clusters.sort_by_key(|cluster| cluster.candidates.first().map(|c| c.start_offset).unwrap_or(0));
    clusters
}
