use super::classification::{accuracy, label_metric, LabelMetric};
use super::confusion::ConfusionMatrix;
use super::scores::{average_precision, roc_auc};
use crate::config::{MetricKind, MetricsConfig};
use crate::engines::candidates::CapabilityFlags;
use crate::types::{FoldId, MetricValue, PredictionRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Score of one metric on one fold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoldScore {
    pub fold: FoldId,
    pub value: MetricValue,
}

pub struct MetricsEngine {
    config: MetricsConfig,
}

impl MetricsEngine {
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Every configured metric for the records of a single (candidate, fold) unit.
    pub fn score_fold(
        &self,
        records: &[&PredictionRecord],
        capabilities: &CapabilityFlags,
    ) -> BTreeMap<MetricKind, MetricValue> {
        let cm = ConfusionMatrix::from_pairs(records.iter().map(|r| (r.y_true, r.y_pred)));
        let policy = self.config.zero_division;

        self.config
            .metrics
            .iter()
            .map(|&kind| {
                let value = match kind {
                    MetricKind::Accuracy => accuracy(&cm, policy),
                    MetricKind::Precision => self.label(&cm, LabelMetric::Precision),
                    MetricKind::Recall => self.label(&cm, LabelMetric::Recall),
                    MetricKind::F1 => self.label(&cm, LabelMetric::F1),
                    MetricKind::RocAuc | MetricKind::PrAuc => {
                        self.score_based(kind, records, capabilities)
                    }
                };
                (kind, value)
            })
            .collect()
    }

    /// Per-fold sequences for one candidate, in fold order. Only `folds`
    /// (the units that succeeded) are scored.
    pub fn score_by_fold(
        &self,
        records: &[PredictionRecord],
        folds: &[FoldId],
        capabilities: &CapabilityFlags,
    ) -> BTreeMap<MetricKind, Vec<FoldScore>> {
        let mut by_fold: BTreeMap<FoldId, Vec<&PredictionRecord>> =
            folds.iter().map(|&f| (f, Vec::new())).collect();
        for record in records {
            if let Some(bucket) = by_fold.get_mut(&record.fold_id) {
                bucket.push(record);
            }
        }

        let mut sequences: BTreeMap<MetricKind, Vec<FoldScore>> = BTreeMap::new();
        for (fold, fold_records) in by_fold {
            for (kind, value) in self.score_fold(&fold_records, capabilities) {
                sequences.entry(kind).or_default().push(FoldScore { fold, value });
            }
        }
        sequences
    }

    fn label(&self, cm: &ConfusionMatrix, metric: LabelMetric) -> MetricValue {
        label_metric(
            cm,
            metric,
            self.config.average,
            self.config.positive_label,
            self.config.zero_division,
        )
    }

    fn score_based(
        &self,
        kind: MetricKind,
        records: &[&PredictionRecord],
        capabilities: &CapabilityFlags,
    ) -> MetricValue {
        if !capabilities.supports_probability {
            return MetricValue::NotApplicable;
        }

        let scores: Option<Vec<f64>> = records.iter().map(|r| r.y_proba).collect();
        let Some(scores) = scores else {
            return MetricValue::Undefined;
        };
        let is_positive: Vec<bool> = records
            .iter()
            .map(|r| r.y_true == self.config.positive_label)
            .collect();

        match kind {
            MetricKind::RocAuc => roc_auc(&is_positive, &scores, self.config.zero_division),
            _ => average_precision(&is_positive, &scores, self.config.zero_division),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CandidateId;

    fn record(sample: usize, fold: FoldId, y_true: i64, y_pred: i64, proba: Option<f64>) -> PredictionRecord {
        PredictionRecord {
            sample_index: sample,
            fold_id: fold,
            candidate_id: CandidateId(0),
            y_true,
            y_pred,
            y_proba: proba,
        }
    }

    #[test]
    fn test_score_metrics_not_applicable_without_probability() {
        let engine = MetricsEngine::new(MetricsConfig::default());
        let records = vec![record(0, 0, 1, 1, None), record(1, 0, 0, 0, None)];
        let refs: Vec<&PredictionRecord> = records.iter().collect();

        let scores = engine.score_fold(&refs, &CapabilityFlags::new());
        assert_eq!(scores[&MetricKind::RocAuc], MetricValue::NotApplicable);
        assert_eq!(scores[&MetricKind::PrAuc], MetricValue::NotApplicable);
        assert_eq!(scores[&MetricKind::Precision], MetricValue::Computed(1.0));
        assert_eq!(scores[&MetricKind::Accuracy], MetricValue::Computed(1.0));
    }

    #[test]
    fn test_score_by_fold_skips_failed_folds() {
        let engine = MetricsEngine::new(MetricsConfig::default());
        let records = vec![
            record(0, 0, 1, 1, Some(0.9)),
            record(1, 0, 0, 0, Some(0.1)),
            record(2, 1, 1, 0, Some(0.4)),
            record(3, 1, 0, 0, Some(0.3)),
        ];
        let caps = CapabilityFlags::new().with_probability();

        let sequences = engine.score_by_fold(&records, &[0], &caps);
        let recall = &sequences[&MetricKind::Recall];
        assert_eq!(recall.len(), 1);
        assert_eq!(recall[0].fold, 0);
        assert_eq!(recall[0].value, MetricValue::Computed(1.0));

        let sequences = engine.score_by_fold(&records, &[0, 1], &caps);
        assert_eq!(sequences[&MetricKind::RocAuc][1].value, MetricValue::Computed(1.0));
        assert_eq!(sequences[&MetricKind::Recall][1].value, MetricValue::Computed(0.0));
    }
}
