use super::traits::ConfigSection;
use crate::error::QualifyError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    pub strategy: PartitionStrategy,
    pub n_folds: usize,
    pub shuffle: bool,
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    Stratified, // Per-class round-robin
    Plain,      // Contiguous blocks of the (shuffled) index order
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            strategy: PartitionStrategy::Stratified,
            n_folds: 5,
            shuffle: true,
            seed: 42,
        }
    }
}

impl ConfigSection for PartitionConfig {
    fn section_name() -> &'static str {
        "partition"
    }

    fn validate(&self) -> Result<(), QualifyError> {
        if self.n_folds < 2 {
            return Err(QualifyError::Configuration(
                "Fold count must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}
