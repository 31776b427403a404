use super::traits::{ensure_non_negative, ConfigSection};
use crate::error::QualifyError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantileConfig {
    pub quantiles: Vec<f64>,
    pub high_value: HighValueThreshold,
    pub calibration_tolerance: f64,
}

/// Cut-off selecting the samples that enter `Bias_High`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum HighValueThreshold {
    /// Percentile (0-100] of the observed true values
    Percentile(f64),
    /// Fixed value in target units
    Absolute(f64),
}

impl Default for QuantileConfig {
    fn default() -> Self {
        Self {
            quantiles: vec![0.9],
            high_value: HighValueThreshold::Percentile(90.0),
            calibration_tolerance: 0.05,
        }
    }
}

impl ConfigSection for QuantileConfig {
    fn section_name() -> &'static str {
        "quantile"
    }

    fn validate(&self) -> Result<(), QualifyError> {
        if let Some(tau) = self.quantiles.iter().find(|t| !(**t > 0.0 && **t < 1.0)) {
            return Err(QualifyError::Configuration(format!(
                "Quantile {tau} must lie strictly between 0 and 1"
            )));
        }
        for (i, tau) in self.quantiles.iter().enumerate() {
            if self.quantiles[..i].contains(tau) {
                return Err(QualifyError::Configuration(format!(
                    "Quantile {tau} is listed more than once"
                )));
            }
        }
        if let HighValueThreshold::Percentile(p) = self.high_value {
            if !(p > 0.0 && p <= 100.0) {
                return Err(QualifyError::Configuration(format!(
                    "High-value percentile {p} must be in (0, 100]"
                )));
            }
        }
        ensure_non_negative("quantile", "calibration_tolerance", self.calibration_tolerance)
    }
}
