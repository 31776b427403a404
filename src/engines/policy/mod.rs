//! Fixed lookup tables mapping class balance and cost ratios to a
//! recommended primary metric or target quantile.

use crate::config::MetricKind;
use crate::error::QualifyError;
use crate::types::ClassLabel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecommendation {
    /// Minority count over majority count
    pub class_ratio: f64,
    pub primary: MetricKind,
    pub alternative: Option<MetricKind>,
    pub enable_weighting: bool,
    pub tune_threshold: bool,
}

struct Band {
    min_ratio: f64,
    primary: MetricKind,
    alternative: Option<MetricKind>,
    enable_weighting: bool,
    tune_threshold: bool,
}

// Checked top to bottom; the first band whose floor the ratio reaches wins.
static METRIC_TABLE: [Band; 3] = [
    Band {
        min_ratio: 0.4,
        primary: MetricKind::RocAuc,
        alternative: Some(MetricKind::F1),
        enable_weighting: false,
        tune_threshold: false,
    },
    Band {
        min_ratio: 0.2,
        primary: MetricKind::PrAuc,
        alternative: None,
        enable_weighting: true,
        tune_threshold: false,
    },
    Band {
        min_ratio: 0.0,
        primary: MetricKind::PrAuc,
        alternative: None,
        enable_weighting: true,
        tune_threshold: true,
    },
];

pub fn recommend_for_ratio(class_ratio: f64) -> MetricRecommendation {
    let band = METRIC_TABLE
        .iter()
        .find(|b| class_ratio >= b.min_ratio)
        .unwrap_or(&METRIC_TABLE[METRIC_TABLE.len() - 1]);

    MetricRecommendation {
        class_ratio,
        primary: band.primary,
        alternative: band.alternative,
        enable_weighting: band.enable_weighting,
        tune_threshold: band.tune_threshold,
    }
}

pub fn recommend_metric(
    class_counts: &BTreeMap<ClassLabel, usize>,
) -> Result<MetricRecommendation, QualifyError> {
    let minority = class_counts.values().copied().min().unwrap_or(0);
    let majority = class_counts.values().copied().max().unwrap_or(0);
    if class_counts.len() < 2 || minority == 0 {
        return Err(QualifyError::Validation(
            "Metric recommendation needs at least two populated classes".to_string(),
        ));
    }
    Ok(recommend_for_ratio(minority as f64 / majority as f64))
}

/// `τ = cost_under / (cost_under + cost_over)`
pub fn recommend_quantile(cost_under: f64, cost_over: f64) -> Result<f64, QualifyError> {
    if !(cost_under > 0.0 && cost_over > 0.0) || !(cost_under + cost_over).is_finite() {
        return Err(QualifyError::Validation(format!(
            "Costs must be positive and finite, got {cost_under}:{cost_over}"
        )));
    }
    Ok(cost_under / (cost_under + cost_over))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_bands() {
        let balanced = recommend_for_ratio(1.0);
        assert_eq!(balanced.primary, MetricKind::RocAuc);
        assert_eq!(balanced.alternative, Some(MetricKind::F1));
        assert!(!balanced.enable_weighting);

        let moderate = recommend_for_ratio(0.3);
        assert_eq!(moderate.primary, MetricKind::PrAuc);
        assert!(moderate.enable_weighting);
        assert!(!moderate.tune_threshold);

        let severe = recommend_for_ratio(0.1);
        assert_eq!(severe.primary, MetricKind::PrAuc);
        assert!(severe.enable_weighting && severe.tune_threshold);

        assert_eq!(recommend_for_ratio(0.4).primary, MetricKind::RocAuc);
        assert!(!recommend_for_ratio(0.2).tune_threshold);
    }

    #[test]
    fn test_recommend_from_counts() {
        let counts: BTreeMap<ClassLabel, usize> = [(0, 900), (1, 100)].into_iter().collect();
        let rec = recommend_metric(&counts).unwrap();
        assert!((rec.class_ratio - 1.0 / 9.0).abs() < 1e-12);
        assert!(rec.tune_threshold);

        let single: BTreeMap<ClassLabel, usize> = [(0, 10)].into_iter().collect();
        assert!(recommend_metric(&single).is_err());
    }

    #[test]
    fn test_quantile_from_costs() {
        assert!((recommend_quantile(9.0, 1.0).unwrap() - 0.9).abs() < 1e-12);
        assert_eq!(recommend_quantile(1.0, 1.0).unwrap(), 0.5);
        assert!(recommend_quantile(0.0, 1.0).is_err());
        assert!(recommend_quantile(-1.0, 2.0).is_err());
    }
}
