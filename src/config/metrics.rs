use super::traits::ConfigSection;
use crate::error::QualifyError;
use crate::types::ClassLabel;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub metrics: Vec<MetricKind>,
    pub average: Average,
    pub zero_division: ZeroDivision,
    /// Label treated as positive for binary averaging and for the score-based metrics.
    pub positive_label: ClassLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Accuracy,
    Precision,
    Recall,
    F1,
    RocAuc,
    PrAuc,
}

impl MetricKind {
    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::Accuracy => "accuracy",
            MetricKind::Precision => "precision",
            MetricKind::Recall => "recall",
            MetricKind::F1 => "f1",
            MetricKind::RocAuc => "roc_auc",
            MetricKind::PrAuc => "pr_auc",
        }
    }

    /// Score-based metrics need probability output from the candidate.
    pub fn requires_probability(&self) -> bool {
        matches!(self, MetricKind::RocAuc | MetricKind::PrAuc)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Averaging strategy for the label-based metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Average {
    /// Score the positive label only
    Binary,
    /// Unweighted mean across classes
    Macro,
    /// Mean weighted by per-class support
    Weighted,
    /// Pool TP/FP/FN across classes, then compute
    Micro,
}

/// Resolution applied when a metric denominator is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroDivision {
    Zero,
    One,
    Undefined,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            metrics: vec![
                MetricKind::Accuracy,
                MetricKind::Precision,
                MetricKind::Recall,
                MetricKind::F1,
                MetricKind::RocAuc,
                MetricKind::PrAuc,
            ],
            average: Average::Binary,
            zero_division: ZeroDivision::Zero,
            positive_label: 1,
        }
    }
}

impl ConfigSection for MetricsConfig {
    fn section_name() -> &'static str {
        "metrics"
    }

    fn validate(&self) -> Result<(), QualifyError> {
        if self.metrics.is_empty() {
            return Err(QualifyError::Configuration(
                "At least one metric must be configured".to_string(),
            ));
        }
        Ok(())
    }
}
