use crate::engines::weighting::TrainingWeights;
use crate::types::{ClassLabel, SampleIndex};
use anyhow::Result;

/// Read-only indexed view of the data owned by the loading collaborator.
pub trait Dataset: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Class label used for stratification and classification scoring.
    fn label(&self, index: SampleIndex) -> ClassLabel;

    fn features(&self, index: SampleIndex) -> &[f64];

    /// Continuous target for quantile regression, if the dataset has one.
    fn target(&self, index: SampleIndex) -> Option<f64> {
        let _ = index;
        None
    }

    fn labels(&self) -> Vec<ClassLabel> {
        (0..self.len()).map(|i| self.label(i)).collect()
    }
}

/// A classification candidate. Fitting yields an independent state object,
/// so the same candidate can be fitted on several folds concurrently.
pub trait Classifier: Send + Sync {
    /// Runs on a dedicated unit thread. A unit that times out or is cancelled
    /// is not interrupted here: the run stops waiting and skips `predict`,
    /// but the fit itself keeps going, so iterative fits should bound their
    /// own work.
    fn fit(
        &self,
        dataset: &dyn Dataset,
        train: &[SampleIndex],
        weights: Option<&TrainingWeights>,
    ) -> Result<Box<dyn FittedClassifier>>;
}

pub trait FittedClassifier: Send {
    /// One label per holdout index, in the same order.
    fn predict(&self, dataset: &dyn Dataset, holdout: &[SampleIndex]) -> Result<Vec<ClassLabel>>;

    /// Score for the positive label per holdout index. Only called when the
    /// candidate was registered with `supports_probability`.
    fn predict_probability(
        &self,
        _dataset: &dyn Dataset,
        _holdout: &[SampleIndex],
    ) -> Result<Vec<f64>> {
        anyhow::bail!("probability output is not implemented")
    }
}

/// A regression candidate predicting the τ-th conditional quantile.
pub trait QuantileRegressor: Send + Sync {
    /// Same abandonment rules as [`Classifier::fit`].
    fn fit(
        &self,
        dataset: &dyn Dataset,
        train: &[SampleIndex],
        tau: f64,
    ) -> Result<Box<dyn FittedRegressor>>;
}

pub trait FittedRegressor: Send {
    fn predict(&self, dataset: &dyn Dataset, holdout: &[SampleIndex]) -> Result<Vec<f64>>;
}
