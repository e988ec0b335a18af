//! Correction composition
//!
//! Merges clustered term corrections for one source text into a single
//! corrected text. Pure computation: identical inputs always produce
//! identical output, regardless of candidate ordering within clusters.

use factgate_common::models::{CorrectionCluster, TermCorrection};
use tracing::debug;

/// Result of composing corrections over one text
#[derive(Debug, Clone)]
pub struct ComposedText {
    /// The rebuilt text with all accepted corrections applied
    pub corrected: String,
    /// The corrections that were actually applied, in text order
    pub applied: Vec<TermCorrection>,
}

/// Apply the best candidate of each cluster to `text`
///
/// Per cluster, the winning candidate has the highest confidence; ties break
/// to the smallest start offset, then the lexicographically smallest
/// replacement. Winners are applied in ascending start-offset order; a winner
/// whose span starts before the previously applied span ended is dropped
/// rather than merged. Candidates with offsets that do not address `text`
/// are dropped before selection.
pub fn compose(text: &str, clusters: &[CorrectionCluster]) -> ComposedText {
    let mut selected: Vec<&TermCorrection> = clusters
        .iter()
        .filter_map(|cluster| best_candidate(text, cluster))
        .collect();

    selected.sort_by(|a, b| {
        a.start_offset
            .cmp(&b.start_offset)
            .then(a.end_offset.cmp(&b.end_offset))
            .then(a.replacement_term.cmp(&b.replacement_term))
    });

    let mut corrected = String::with_capacity(text.len());
    let mut applied = Vec::new();
    let mut cursor = 0usize;

    for candidate in selected {
        if candidate.start_offset < cursor {
            debug!(
                original = %candidate.original_term,
                start = candidate.start_offset,
                applied_until = cursor,
                "Dropping correction overlapping an already applied span"
            );
            continue;
        }

        corrected.push_str(&text[cursor..candidate.start_offset]);
        corrected.push_str(&candidate.replacement_term);
        cursor = candidate.end_offset;
        applied.push(candidate.clone());
    }

    corrected.push_str(&text[cursor..]);

    ComposedText { corrected, applied }
}

/// The single winning candidate of a cluster, if any member addresses `text`
fn best_candidate<'a>(text: &str, cluster: &'a CorrectionCluster) -> Option<&'a TermCorrection> {
    let mut best: Option<&TermCorrection> = None;

    for candidate in &cluster.candidates {
        if !addresses_text(text, candidate) {
            debug!(
                original = %candidate.original_term,
                start = candidate.start_offset,
                end = candidate.end_offset,
                "Dropping correction with offsets outside the source text"
            );
            continue;
        }

        best = match best {
            None => Some(candidate),
            Some(current) if beats(candidate, current) => Some(candidate),
            Some(current) => Some(current),
        };
    }

    best
}

/// Fixed candidate ordering: confidence, then start offset, then replacement,
/// then end offset as the final disambiguator
fn beats(a: &TermCorrection, b: &TermCorrection) -> bool {
    if a.confidence != b.confidence {
        return a.confidence > b.confidence;
    }
    if a.start_offset != b.start_offset {
        return a.start_offset < b.start_offset;
    }
    if a.replacement_term != b.replacement_term {
        return a.replacement_term < b.replacement_term;
    }
    a.end_offset < b.end_offset
}

/// Offsets must form a non-empty span inside `text`, on char boundaries
fn addresses_text(text: &str, candidate: &TermCorrection) -> bool {
    candidate.start_offset < candidate.end_offset
        && candidate.end_offset <= text.len()
        && text.is_char_boundary(candidate.start_offset)
        && text.is_char_boundary(candidate.end_offset)
}
