use super::traits::{ensure_non_negative, ConfigSection};
use crate::error::QualifyError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Run the unit matrix on the rayon pool
    pub parallel: bool,
    /// Per-unit bound on fit + predict in milliseconds; `0` waits indefinitely
    pub unit_timeout_ms: u64,
    /// Fraction of failed folds a candidate tolerates before it is marked failed
    pub max_failed_fold_fraction: f64,
    /// How often a waiting unit checks for cancellation
    pub poll_interval_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            unit_timeout_ms: 300_000,
            max_failed_fold_fraction: 0.0,
            poll_interval_ms: 10,
        }
    }
}

impl ConfigSection for ExecutionConfig {
    fn section_name() -> &'static str {
        "execution"
    }

    fn validate(&self) -> Result<(), QualifyError> {
        ensure_non_negative("execution", "max_failed_fold_fraction", self.max_failed_fold_fraction)?;
        if self.max_failed_fold_fraction > 1.0 {
            return Err(QualifyError::Configuration(
                "Failed fold fraction must be between 0 and 1".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(QualifyError::Configuration(
                "Poll interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl ExecutionConfig {
    pub fn unit_timeout(&self) -> Option<Duration> {
        (self.unit_timeout_ms > 0).then(|| Duration::from_millis(self.unit_timeout_ms))
    }
}
