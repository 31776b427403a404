use super::state::RunState;
use super::unit::UnitFailure;
use crate::config::MetricKind;
use crate::engines::candidates::CandidateDescriptor;
use crate::engines::policy::MetricRecommendation;
use crate::engines::quantile::QuantileEvaluation;
use crate::engines::ranking::{Applicability, CandidateMetrics, MetricResult, RankingEntry};
use crate::engines::weighting::WeightTable;
use crate::error::QualifyError;
use crate::types::{CandidateId, ClassLabel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Quantile calibration for one (candidate, τ), scored on pooled out-of-fold predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileReport {
    pub candidate_id: CandidateId,
    pub name: String,
    pub tau: f64,
    pub failed: bool,
    pub evaluation: Option<QuantileEvaluation>,
    /// Per-fold pinball loss reduced to mean/std
    pub fold_pinball: Option<MetricSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub std: f64,
}

/// Non-fatal findings attached to the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityWarning {
    Miscalibration {
        candidate_id: CandidateId,
        tau: f64,
        coverage: f64,
        calibration_gap: f64,
    },
    CandidateFailed {
        candidate_id: CandidateId,
        failed_folds: usize,
        total_folds: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: String,
    pub state: RunState,
    pub history: Vec<RunState>,
    pub n_samples: usize,
    pub n_folds: usize,
    pub fold_sizes: Vec<usize>,
    pub class_counts: BTreeMap<ClassLabel, usize>,
    pub weight_table: Option<WeightTable>,
    pub recommendation: Option<MetricRecommendation>,
    pub candidates: Vec<CandidateDescriptor>,
    pub metrics: Vec<CandidateMetrics>,
    pub ranking: Vec<RankingEntry>,
    pub quantiles: Vec<QuantileReport>,
    pub unit_failures: Vec<UnitFailure>,
    pub warnings: Vec<QualityWarning>,
}

impl RunReport {
    pub fn best(&self) -> Option<&RankingEntry> {
        self.ranking.first()
    }

    pub fn candidate(&self, id: CandidateId) -> Option<&CandidateMetrics> {
        self.metrics.iter().find(|c| c.candidate_id == id)
    }

    pub fn metric(&self, id: CandidateId, metric: MetricKind) -> Option<&MetricResult> {
        self.candidate(id).and_then(|c| c.metrics.get(&metric))
    }

    pub fn quantile(&self, id: CandidateId, tau: f64) -> Option<&QuantileReport> {
        self.quantiles
            .iter()
            .find(|q| q.candidate_id == id && q.tau == tau)
    }

    pub fn to_json(&self) -> Result<String, QualifyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Leaderboard of ranked candidates with `mean ± std` per metric.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let metrics: Vec<MetricKind> = self
            .metrics
            .first()
            .map(|c| c.metrics.keys().copied().collect())
            .unwrap_or_default();

        md.push_str("| Rank | Candidate |");
        for metric in &metrics {
            let _ = write!(md, " {metric} |");
        }
        md.push_str(" Red flags |\n|------|-----------|");
        for _ in &metrics {
            md.push_str("----------|");
        }
        md.push_str("-----------|\n");

        for entry in &self.ranking {
            let _ = write!(md, "| {} | {} |", entry.rank, entry.name);
            for metric in &metrics {
                let cell = match self.metric(entry.candidate_id, *metric) {
                    Some(m) if m.applicability == Applicability::NotApplicable => "n/a".to_string(),
                    Some(MetricResult {
                        mean: Some(mean),
                        std: Some(std),
                        ..
                    }) => format!("{mean:.4} ± {std:.4}"),
                    _ => "undefined".to_string(),
                };
                let _ = write!(md, " {cell} |");
            }
            let flags: Vec<String> = entry.red_flags.iter().map(|f| format!("{f:?}")).collect();
            let _ = writeln!(md, " {} |", flags.join(", "));
        }

        for warning in &self.warnings {
            if let QualityWarning::Miscalibration {
                candidate_id,
                tau,
                coverage,
                calibration_gap,
            } = warning
            {
                let _ = writeln!(
                    md,
                    "\n> Miscalibration: candidate {candidate_id} at τ={tau}: coverage {coverage:.3} (gap {calibration_gap:.3})"
                );
            }
        }

        md
    }
}
