//! Confirmed-fact propagation
//!
//! An accepted annotation may be propagated to the external fact store as a
//! confirmed fact. Propagation is fire-and-forget: the annotation record is
//! authoritative, sink failures are logged and never unwound.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

const USER_AGENT: &str = "factgate/0.1.0 (https://github.com/factgate/factgate)";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Sink for accepted annotation values
#[async_trait]
pub trait FactSink: Send + Sync {
    /// Record `value` as a confirmed fact about `subject_id`
    async fn confirm(&self, subject_id: &str, value: &str) -> Result<()>;
}

/// HTTP fact sink posting confirmed facts to the product service
pub struct HttpFactSink {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpFactSink {
    pub fn new(base_url: String) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl FactSink for HttpFactSink {
    async fn confirm(&self, subject_id: &str, value: &str) -> Result<()> {
        let url = format!("{}/facts", self.base_url);
        let body = serde_json::json!({
            "subject_id": subject_id,
            "value": value,
        });

        let response = self.http_client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("Fact sink returned HTTP {}", response.status());
        }

        tracing::debug!(subject_id, value, "Confirmed fact propagated");
        Ok(())
    }
}

/// Sink used when no fact-sink URL is configured
///
/// Accepted values stay recorded on the task only.
pub struct NullFactSink;

#[async_trait]
impl FactSink for NullFactSink {
    async fn confirm(&self, subject_id: &str, value: &str) -> Result<()> {
        tracing::debug!(subject_id, value, "Fact sink disabled, keeping annotation record only");
        Ok(())
    }
}
