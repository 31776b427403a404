//! Cross-validated qualification of candidate models.
//!
//! A run partitions a labelled dataset into stratified folds, fits every
//! registered candidate on each training split, scores the held-out
//! predictions and ranks candidates by mean and stability of a primary
//! metric. Quantile regressors are assessed for calibration alongside.

pub mod config;
pub mod engines;
pub mod error;
pub mod types;

pub use config::{ConfigManager, RunConfig};
pub use engines::candidates::{
    CandidateRegistry, CapabilityFlags, Classifier, Dataset, FittedClassifier, FittedRegressor,
    InMemoryDataset, QuantileRegressor, WeightingMode,
};
pub use engines::validation::{
    CancellationToken, EvaluationOrchestrator, RunOutcome, RunReport, RunState,
};
pub use error::QualifyError;
pub use types::{CandidateId, ClassLabel, FoldId, MetricValue, SampleIndex};
