use crate::config::MetricKind;
use crate::engines::metrics::FoldScore;
use crate::types::{CandidateId, FoldId, MetricValue};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Applicability {
    Computed,
    /// Candidate lacks a capability the metric needs
    NotApplicable,
    /// No fold produced a value under the zero-division policy
    Undefined,
}

/// A metric reduced across folds. The raw per-fold sequence is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub candidate_id: CandidateId,
    pub metric: MetricKind,
    pub fold_scores: Vec<FoldScore>,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub applicability: Applicability,
}

/// Report-level notes attached to a candidate instead of skipping it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Annotation {
    WeightingNotApplied,
    MetricNotApplicable(MetricKind),
    FoldsFailed(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetrics {
    pub candidate_id: CandidateId,
    pub name: String,
    pub failed: bool,
    pub failed_folds: Vec<FoldId>,
    pub annotations: BTreeSet<Annotation>,
    pub metrics: BTreeMap<MetricKind, MetricResult>,
}

impl CandidateMetrics {
    pub fn mean(&self, metric: MetricKind) -> Option<f64> {
        self.metrics.get(&metric).and_then(|m| m.mean)
    }

    pub fn std(&self, metric: MetricKind) -> Option<f64> {
        self.metrics.get(&metric).and_then(|m| m.std)
    }
}

/// Mean and sample standard deviation (n−1); std is 0 for a single value.
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() == 1 {
        return Some((mean, 0.0));
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some((mean, variance.sqrt()))
}

pub fn aggregate(candidate_id: CandidateId, metric: MetricKind, fold_scores: Vec<FoldScore>) -> MetricResult {
    let values: Vec<f64> = fold_scores.iter().filter_map(|s| s.value.value()).collect();

    let applicability = if !fold_scores.is_empty()
        && fold_scores.iter().all(|s| s.value == MetricValue::NotApplicable)
    {
        Applicability::NotApplicable
    } else if values.is_empty() {
        Applicability::Undefined
    } else {
        Applicability::Computed
    };

    let (mean, std) = match mean_std(&values) {
        Some((m, s)) => (Some(m), Some(s)),
        None => (None, None),
    };

    MetricResult {
        candidate_id,
        metric,
        fold_scores,
        mean,
        std,
        applicability,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: &[MetricValue]) -> Vec<FoldScore> {
        values
            .iter()
            .enumerate()
            .map(|(fold, &value)| FoldScore { fold, value })
            .collect()
    }

    #[test]
    fn test_mean_std_sample() {
        let (mean, std) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(mean, 5.0);
        assert!((std - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(mean_std(&[3.0]), Some((3.0, 0.0)));
        assert_eq!(mean_std(&[]), None);
    }

    #[test]
    fn test_aggregate_skips_undefined_folds() {
        let result = aggregate(
            CandidateId(0),
            MetricKind::Precision,
            scores(&[MetricValue::Computed(0.5), MetricValue::Undefined, MetricValue::Computed(0.7)]),
        );
        assert_eq!(result.applicability, Applicability::Computed);
        assert!((result.mean.unwrap() - 0.6).abs() < 1e-12);
        assert_eq!(result.fold_scores.len(), 3);
    }

    #[test]
    fn test_aggregate_not_applicable() {
        let result = aggregate(
            CandidateId(0),
            MetricKind::RocAuc,
            scores(&[MetricValue::NotApplicable, MetricValue::NotApplicable]),
        );
        assert_eq!(result.applicability, Applicability::NotApplicable);
        assert_eq!(result.mean, None);
    }
}
