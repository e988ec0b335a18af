//! Domain models for the factgate curation service

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task variant: what kind of prediction is awaiting annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// A predicted product category
    CategoryPrediction,
    /// A generic insight (label, brand, expiration date, ...)
    Insight,
}

impl TaskKind {
    /// Database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::CategoryPrediction => "category_prediction",
            TaskKind::Insight => "insight",
        }
    }

    /// Parse the database string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "category_prediction" => Some(TaskKind::CategoryPrediction),
            "insight" => Some(TaskKind::Insight),
            _ => None,
        }
    }
}

/// Annotation lifecycle state
///
/// A task moves `Pending -> Annotated` exactly once; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Annotated,
}

impl TaskState {
    /// Database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Annotated => "annotated",
        }
    }

    /// Parse the database string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskState::Pending),
            "annotated" => Some(TaskState::Annotated),
            _ => None,
        }
    }
}

/// Human annotation decision
///
/// The wire representation is the closed integer set `{-1, 0, 1}`; anything
/// else is rejected before it can reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationValue {
    /// Prediction rejected
    Reject,
    /// Neutral / skip: recorded, never propagated
    Neutral,
    /// Prediction accepted
    Accept,
}

impl AnnotationValue {
    /// Validate an incoming integer annotation
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            -1 => Some(AnnotationValue::Reject),
            0 => Some(AnnotationValue::Neutral),
            1 => Some(AnnotationValue::Accept),
            _ => None,
        }
    }

    /// Integer representation stored in the database
    pub fn as_i64(&self) -> i64 {
        match self {
            AnnotationValue::Reject => -1,
            AnnotationValue::Neutral => 0,
            AnnotationValue::Accept => 1,
        }
    }
}

/// One prediction awaiting (or having received) a human decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier (UUID)
    pub id: Uuid,
    /// Task variant
    pub kind: TaskKind,
    /// Product barcode the prediction is about
    pub subject_id: String,
    /// The predicted category/attribute/value
    pub predicted_value: String,
    /// Prediction-source confidence score
    pub confidence: f64,
    /// Annotation campaign this task belongs to (category predictions)
    pub campaign: Option<String>,
    /// Country restriction, if any
    pub country: Option<String>,
    /// Category area the campaign targets (category predictions)
    pub category: Option<String>,
    /// Insight type (insight variant: "label", "brand", ...)
    pub insight_type: Option<String>,
    /// Extra JSON payload carried for rendering (insight variant)
    pub data: Option<serde_json::Value>,
    /// Lifecycle state
    pub state: TaskState,
    /// Recorded decision, present once annotated
    pub annotation: Option<i64>,
    /// Whether an accepted value was propagated to the fact sink
    pub persisted: Option<bool>,
    /// ISO 8601 creation timestamp (set by the database)
    pub created_at: Option<String>,
    /// ISO 8601 annotation timestamp
    pub annotated_at: Option<String>,
}

impl Task {
    /// Create a new pending task with a fresh id
    pub fn new(kind: TaskKind, subject_id: String, predicted_value: String, confidence: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            subject_id,
            predicted_value,
            confidence,
            campaign: None,
            country: None,
            category: None,
            insight_type: None,
            data: None,
            state: TaskState::Pending,
            annotation: None,
            persisted: None,
            created_at: None,
            annotated_at: None,
        }
    }
}

/// Selection filter: named optional constraints on pending tasks
///
/// Unset fields place no constraint. `subject_id` backs the per-product
/// lookup endpoints; the remaining fields are the annotator-facing filters.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub kind: Option<TaskKind>,
    pub campaign: Option<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    pub insight_type: Option<String>,
    pub subject_id: Option<String>,
}

impl TaskFilter {
    /// Filter for one task variant, no further constraints
    pub fn for_kind(kind: TaskKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }
}

/// One proposed substring replacement for a spellcheck target text
///
/// Offsets are end-exclusive byte positions into the original text; they are
/// never reinterpreted against partially corrected output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermCorrection {
    /// The substring being replaced
    pub original_term: String,
    /// Its proposed replacement
    pub replacement_term: String,
    /// Start position in the original text (inclusive)
    pub start_offset: usize,
    /// End position in the original text (exclusive)
    pub end_offset: usize,
    /// Source-assigned correction confidence
    pub confidence: f64,
}

/// A group of alternative corrections for the same logical edit
///
/// All members come from one correction "hit"; at most one member is ever
/// applied to the text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrectionCluster {
    pub candidates: Vec<TermCorrection>,
}

impl CorrectionCluster {
    pub fn new(candidates: Vec<TermCorrection>) -> Self {
        Self { candidates }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
