use super::metrics::MetricKind;
use super::traits::{ensure_non_negative, ConfigSection};
use crate::error::QualifyError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub primary_metric: MetricKind,
    pub tie_break_epsilon: f64,
    pub instability_threshold: f64,
    pub red_flags: RedFlagThresholds,
}

/// Cut-offs used by the metric-mismatch red flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedFlagThresholds {
    pub high_primary: f64,
    pub high_precision: f64,
    pub high_recall: f64,
    pub low_precision: f64,
    pub low_recall: f64,
}

impl Default for RedFlagThresholds {
    fn default() -> Self {
        Self {
            high_primary: 0.6,
            high_precision: 0.6,
            high_recall: 0.6,
            low_precision: 0.2,
            low_recall: 0.2,
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            primary_metric: MetricKind::F1,
            tie_break_epsilon: 0.02,
            instability_threshold: 0.05,
            red_flags: RedFlagThresholds::default(),
        }
    }
}

impl ConfigSection for RankingConfig {
    fn section_name() -> &'static str {
        "ranking"
    }

    fn validate(&self) -> Result<(), QualifyError> {
        ensure_non_negative("ranking", "tie_break_epsilon", self.tie_break_epsilon)?;
        ensure_non_negative("ranking", "instability_threshold", self.instability_threshold)?;
        let flags = &self.red_flags;
        for (field, value) in [
            ("red_flags.high_primary", flags.high_primary),
            ("red_flags.high_precision", flags.high_precision),
            ("red_flags.high_recall", flags.high_recall),
            ("red_flags.low_precision", flags.low_precision),
            ("red_flags.low_recall", flags.low_recall),
        ] {
            ensure_non_negative("ranking", field, value)?;
        }
        Ok(())
    }
}
