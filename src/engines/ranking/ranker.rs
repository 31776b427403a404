use super::aggregator::CandidateMetrics;
use crate::config::{MetricKind, RankingConfig};
use crate::types::CandidateId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Automatically detected mismatch between metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedFlag {
    /// Primary metric high while recall is low
    ThresholdMismatch,
    /// Precision high while recall is low
    OverConservative,
    /// Recall high while precision is low
    OverAggressive,
    /// Primary metric std above the instability threshold
    Unstable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub rank: usize,
    pub candidate_id: CandidateId,
    pub name: String,
    pub primary_metric: MetricKind,
    pub primary_metric_value: Option<f64>,
    pub stability: Option<f64>,
    pub red_flags: BTreeSet<RedFlag>,
}

pub struct Ranker {
    config: RankingConfig,
}

impl Ranker {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    /// Rank candidates by primary metric, descending.
    ///
    /// Among candidates within `tie_break_epsilon` of the best remaining mean,
    /// the one with the lowest std goes first. Failed candidates are left out;
    /// candidates without a primary value trail in registration order.
    pub fn rank(&self, candidates: &[CandidateMetrics]) -> Vec<RankingEntry> {
        let primary = self.config.primary_metric;
        let eps = self.config.tie_break_epsilon;

        let (mut scored, mut unscored): (Vec<&CandidateMetrics>, Vec<&CandidateMetrics>) = candidates
            .iter()
            .filter(|c| !c.failed)
            .partition(|c| c.mean(primary).is_some());

        scored.sort_by(|a, b| by_mean_desc(a, b, primary));

        let mut ordered = Vec::with_capacity(candidates.len());
        while !scored.is_empty() {
            let best_mean = scored[0].mean(primary).unwrap_or(f64::NEG_INFINITY);
            let pick = scored
                .iter()
                .enumerate()
                .take_while(|(_, c)| c.mean(primary).unwrap_or(f64::NEG_INFINITY) >= best_mean - eps)
                .min_by(|(_, a), (_, b)| {
                    let std_a = a.std(primary).unwrap_or(0.0);
                    let std_b = b.std(primary).unwrap_or(0.0);
                    std_a.total_cmp(&std_b).then_with(|| by_mean_desc(a, b, primary))
                })
                .map(|(i, _)| i)
                .unwrap_or(0);
            ordered.push(scored.remove(pick));
        }

        unscored.sort_by_key(|c| c.candidate_id);
        ordered.extend(unscored);

        ordered
            .into_iter()
            .enumerate()
            .map(|(i, c)| RankingEntry {
                rank: i + 1,
                candidate_id: c.candidate_id,
                name: c.name.clone(),
                primary_metric: primary,
                primary_metric_value: c.mean(primary),
                stability: c.std(primary),
                red_flags: self.red_flags(c),
            })
            .collect()
    }

    pub fn red_flags(&self, candidate: &CandidateMetrics) -> BTreeSet<RedFlag> {
        let thresholds = &self.config.red_flags;
        let primary = self.config.primary_metric;
        let mut flags = BTreeSet::new();

        let primary_value = candidate.mean(primary);
        let precision = candidate.mean(MetricKind::Precision);
        let recall = candidate.mean(MetricKind::Recall);

        if let (Some(p), Some(r)) = (primary_value, recall) {
            if primary != MetricKind::Recall && p >= thresholds.high_primary && r < thresholds.low_recall {
                flags.insert(RedFlag::ThresholdMismatch);
            }
        }
        if let (Some(p), Some(r)) = (precision, recall) {
            if p >= thresholds.high_precision && r < thresholds.low_recall {
                flags.insert(RedFlag::OverConservative);
            }
            if r >= thresholds.high_recall && p < thresholds.low_precision {
                flags.insert(RedFlag::OverAggressive);
            }
        }
        if let Some(std) = candidate.std(primary) {
            if std > self.config.instability_threshold {
                flags.insert(RedFlag::Unstable);
            }
        }

        if !flags.is_empty() {
            log::warn!("Candidate {} raised red flags {:?}", candidate.name, flags);
        }
        flags
    }
}

fn by_mean_desc(a: &CandidateMetrics, b: &CandidateMetrics, metric: MetricKind) -> Ordering {
    let ma = a.mean(metric).unwrap_or(f64::NEG_INFINITY);
    let mb = b.mean(metric).unwrap_or(f64::NEG_INFINITY);
    mb.total_cmp(&ma).then_with(|| a.candidate_id.cmp(&b.candidate_id))
}
