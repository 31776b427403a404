use crate::types::{CandidateId, ClassLabel, FoldId, SampleIndex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QualifyError {
    #[error("Insufficient samples: class {class} has {count} samples but {folds} folds were requested")]
    InsufficientSamples {
        class: ClassLabel,
        count: usize,
        folds: usize,
    },

    #[error("Class {0} has no samples")]
    EmptyClass(ClassLabel),

    #[error("Candidate {candidate} does not support {capability}")]
    UnsupportedCapability {
        candidate: String,
        capability: &'static str,
    },

    #[error("Fit failed for candidate {candidate} on fold {fold}: {reason}")]
    ConvergenceFailure {
        candidate: CandidateId,
        fold: FoldId,
        reason: String,
    },

    #[error("Candidate {candidate} exceeded {timeout_ms}ms on fold {fold}")]
    Timeout {
        candidate: CandidateId,
        fold: FoldId,
        timeout_ms: u64,
    },

    #[error("Prediction for sample {sample} already recorded for candidate {candidate}")]
    DuplicateRecord {
        sample: SampleIndex,
        candidate: CandidateId,
    },

    #[error("Invalid candidate output: {0}")]
    InvalidOutput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Config source error: {0}")]
    Source(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, QualifyError>;
