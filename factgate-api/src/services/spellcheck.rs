//! Spellcheck orchestration
//!
//! Fetches candidate corrections for a text from the correction source and
//! drives the composer to produce the corrected text.

use factgate_common::models::TermCorrection;
use std::sync::Arc;

use crate::services::composer;
use crate::services::correction_source::{CorrectionSource, CorrectionSourceError};

/// Result of spellchecking one text
#[derive(Debug, Clone)]
pub struct SpellcheckOutcome {
    /// The original text, unchanged
    pub text: String,
    /// The corrected text
    pub corrected: String,
    /// Corrections that were applied, in text order
    pub corrections: Vec<TermCorrection>,
}

/// Drives the correction source and the composer
#[derive(Clone)]
pub struct SpellcheckService {
    source: Arc<dyn CorrectionSource>,
}

impl SpellcheckService {
    pub fn new(source: Arc<dyn CorrectionSource>) -> Self {
        Self { source }
    }

    /// Spellcheck `text`, considering suggestions at or above `min_confidence`
    pub async fn check(
        &self,
        text: &str,
        min_confidence: f64,
    ) -> Result<SpellcheckOutcome, CorrectionSourceError> {
        let clusters = self.source.find(text, min_confidence).await?;
        let composed = composer::compose(text, &clusters);

        tracing::debug!(
            clusters = clusters.len(),
            applied = composed.applied.len(),
            "Spellcheck composed"
        );

        Ok(SpellcheckOutcome {
            text: text.to_string(),
            corrected: composed.corrected,
            corrections: composed.applied,
        })
    }
}
