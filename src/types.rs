use serde::{Deserialize, Serialize};
use std::fmt;

/// Index into the dataset owned by the data-loading collaborator.
pub type SampleIndex = usize;

/// Fold number in `[0, K)`.
pub type FoldId = usize;

/// Class label as delivered by the dataset.
pub type ClassLabel = i64;

/// Identifier handed out by the candidate registry at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub usize);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One held-out classification prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub sample_index: SampleIndex,
    pub fold_id: FoldId,
    pub candidate_id: CandidateId,
    pub y_true: ClassLabel,
    pub y_pred: ClassLabel,
    pub y_proba: Option<f64>, // score for the positive label
}

/// One held-out quantile prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileRecord {
    pub sample_index: SampleIndex,
    pub fold_id: FoldId,
    pub candidate_id: CandidateId,
    pub tau: f64,
    pub y_true: f64,
    pub y_pred: f64,
}

/// Outcome of a metric on a single fold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MetricValue {
    Computed(f64),
    /// Denominator was zero and the zero-division policy left it undefined.
    Undefined,
    /// Metric needs a capability the candidate did not declare.
    NotApplicable,
}

impl MetricValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            MetricValue::Computed(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        !matches!(self, MetricValue::NotApplicable)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Computed(v) => write!(f, "{v:.4}"),
            MetricValue::Undefined => write!(f, "undefined"),
            MetricValue::NotApplicable => write!(f, "n/a"),
        }
    }
}
