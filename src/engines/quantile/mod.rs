//! Quantile-regression scoring: pinball loss, MAE, high-value bias and
//! coverage calibration against the target quantile.

use crate::config::{HighValueThreshold, QuantileConfig};
use crate::error::QualifyError;
use serde::{Deserialize, Serialize};

/// `τ·max(y−ŷ, 0) + (1−τ)·max(ŷ−y, 0)`
pub fn pinball_loss(tau: f64, y: f64, y_hat: f64) -> f64 {
    tau * (y - y_hat).max(0.0) + (1.0 - tau) * (y_hat - y).max(0.0)
}

pub fn mean_pinball_loss(tau: f64, y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred)
        .map(|(&y, &y_hat)| pinball_loss(tau, y, y_hat))
        .sum::<f64>()
        / y_true.len() as f64
}

/// Percentile `p` in [0, 100] with linear interpolation between order statistics.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileEvaluation {
    pub tau: f64,
    pub n_samples: usize,
    pub pinball_loss: f64,
    pub mae: f64,
    /// Mean of `ŷ − y` over samples at or above the high-value threshold.
    /// Negative: the model underpredicts high values. Positive: it overestimates them.
    pub bias_high: Option<f64>,
    pub high_value_threshold: f64,
    pub n_high: usize,
    /// Fraction of samples with `y ≤ ŷ`
    pub coverage: f64,
    pub calibration_gap: f64,
    pub miscalibrated: bool,
}

pub struct QuantileEvaluator {
    config: QuantileConfig,
}

impl QuantileEvaluator {
    pub fn new(config: QuantileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QuantileConfig {
        &self.config
    }

    pub fn evaluate(
        &self,
        tau: f64,
        y_true: &[f64],
        y_pred: &[f64],
    ) -> Result<QuantileEvaluation, QualifyError> {
        if !(tau > 0.0 && tau < 1.0) {
            return Err(QualifyError::Validation(format!(
                "Quantile {tau} must lie strictly between 0 and 1"
            )));
        }
        if y_true.len() != y_pred.len() {
            return Err(QualifyError::Validation(format!(
                "Truth ({}) and predictions ({}) differ in length",
                y_true.len(),
                y_pred.len()
            )));
        }
        if y_true.is_empty() {
            return Err(QualifyError::Validation(
                "Cannot evaluate an empty prediction set".to_string(),
            ));
        }
        if y_true.iter().chain(y_pred).any(|v| !v.is_finite()) {
            return Err(QualifyError::Validation(
                "Quantile evaluation needs finite values".to_string(),
            ));
        }

        let n = y_true.len() as f64;
        let pinball_loss = mean_pinball_loss(tau, y_true, y_pred);
        let mae = y_true
            .iter()
            .zip(y_pred)
            .map(|(y, y_hat)| (y - y_hat).abs())
            .sum::<f64>()
            / n;

        let high_value_threshold = match self.config.high_value {
            HighValueThreshold::Percentile(p) => percentile(y_true, p).unwrap_or(f64::INFINITY),
            HighValueThreshold::Absolute(v) => v,
        };
        let high: Vec<f64> = y_true
            .iter()
            .zip(y_pred)
            .filter(|(&y, _)| y >= high_value_threshold)
            .map(|(&y, &y_hat)| y_hat - y)
            .collect();
        let bias_high = if high.is_empty() {
            None
        } else {
            Some(high.iter().sum::<f64>() / high.len() as f64)
        };

        let covered = y_true.iter().zip(y_pred).filter(|(y, y_hat)| y <= y_hat).count();
        let coverage = covered as f64 / n;
        let calibration_gap = (coverage - tau).abs();
        let miscalibrated = calibration_gap > self.config.calibration_tolerance;

        if miscalibrated {
            log::warn!(
                "Quantile {tau}: coverage {coverage:.3} misses target by {calibration_gap:.3}"
            );
        }

        Ok(QuantileEvaluation {
            tau,
            n_samples: y_true.len(),
            pinball_loss,
            mae,
            bias_high,
            high_value_threshold,
            n_high: high.len(),
            coverage,
            calibration_gap,
            miscalibrated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinball_is_half_absolute_error_at_median() {
        let pairs = [(3.0, 1.0), (1.0, 3.0), (-2.5, 0.75), (7.125, 7.125), (1e6, -3.0)];
        for (y, y_hat) in pairs {
            assert_eq!(pinball_loss(0.5, y, y_hat), 0.5 * (y - y_hat).abs());
        }
    }

    #[test]
    fn test_pinball_asymmetry() {
        // Underprediction by 1 at τ=0.9 costs 0.9, overprediction costs 0.1
        assert!((pinball_loss(0.9, 2.0, 1.0) - 0.9).abs() < 1e-12);
        assert!((pinball_loss(0.9, 1.0, 2.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&values, 50.0), Some(3.0));
        assert_eq!(percentile(&values, 100.0), Some(5.0));
        assert!((percentile(&values, 90.0).unwrap() - 4.6).abs() < 1e-12);
        assert_eq!(percentile(&[], 90.0), None);
    }

    #[test]
    fn test_bias_high_and_coverage() {
        let evaluator = QuantileEvaluator::new(QuantileConfig {
            high_value: HighValueThreshold::Absolute(10.0),
            ..QuantileConfig::default()
        });
        let y_true = [1.0, 2.0, 10.0, 20.0];
        let y_pred = [2.0, 2.0, 8.0, 16.0];
        let eval = evaluator.evaluate(0.5, &y_true, &y_pred).unwrap();

        assert_eq!(eval.n_high, 2);
        assert_eq!(eval.bias_high, Some(-3.0));
        assert_eq!(eval.coverage, 0.5);
        assert_eq!(eval.calibration_gap, 0.0);
        assert!(!eval.miscalibrated);
        assert!((eval.mae - 1.75).abs() < 1e-12);
        assert!((eval.pinball_loss - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_underprediction_gives_negative_bias_high() {
        let evaluator = QuantileEvaluator::new(QuantileConfig {
            high_value: HighValueThreshold::Absolute(10.0),
            ..QuantileConfig::default()
        });
        let y_true = [1.0, 2.0, 20.0, 30.0];

        let under = evaluator.evaluate(0.9, &y_true, &[1.0, 2.0, 15.0, 25.0]).unwrap();
        assert_eq!(under.bias_high, Some(-5.0));

        let over = evaluator.evaluate(0.9, &y_true, &[1.0, 2.0, 24.0, 34.0]).unwrap();
        assert_eq!(over.bias_high, Some(4.0));
    }

    #[test]
    fn test_miscalibration_flagged() {
        let evaluator = QuantileEvaluator::new(QuantileConfig::default());
        let y_true = [1.0, 2.0, 3.0, 4.0];
        let y_pred = [0.0, 0.0, 0.0, 5.0];
        let eval = evaluator.evaluate(0.9, &y_true, &y_pred).unwrap();
        assert_eq!(eval.coverage, 0.25);
        assert!(eval.miscalibrated);
    }

    #[test]
    fn test_rejects_bad_input() {
        let evaluator = QuantileEvaluator::new(QuantileConfig::default());
        assert!(evaluator.evaluate(1.0, &[1.0], &[1.0]).is_err());
        assert!(evaluator.evaluate(0.5, &[1.0, 2.0], &[1.0]).is_err());
        assert!(evaluator.evaluate(0.5, &[], &[]).is_err());
        assert!(evaluator.evaluate(0.5, &[f64::NAN], &[1.0]).is_err());
    }
}
