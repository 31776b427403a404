use super::base::Partitioner;
use super::types::FoldAssignment;
use crate::config::{PartitionConfig, PartitionStrategy};
use crate::error::QualifyError;
use crate::types::{ClassLabel, SampleIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Unstratified K-fold over contiguous blocks of the index order.
pub struct KFoldPartitioner {
    config: PartitionConfig,
}

impl KFoldPartitioner {
    pub fn new(n_folds: usize, shuffle: bool, seed: u64) -> Self {
        Self {
            config: PartitionConfig {
                strategy: PartitionStrategy::Plain,
                n_folds,
                shuffle,
                seed,
            },
        }
    }
}

impl Partitioner for KFoldPartitioner {
    fn partition(&self, labels: &[ClassLabel]) -> Result<FoldAssignment, QualifyError> {
        let n_samples = labels.len();
        let k = self.config.n_folds;
        if k < 2 {
            return Err(QualifyError::Configuration(
                "Fold count must be at least 2".to_string(),
            ));
        }
        if n_samples < k {
            return Err(QualifyError::Validation(format!(
                "Cannot split {n_samples} samples into {k} folds"
            )));
        }

        let mut order: Vec<SampleIndex> = (0..n_samples).collect();
        if self.config.shuffle {
            order.shuffle(&mut StdRng::seed_from_u64(self.config.seed));
        }

        let fold_size = n_samples / k;
        let remainder = n_samples % k;

        let mut fold_of = vec![0; n_samples];
        let mut start = 0;
        for fold in 0..k {
            let end = start + fold_size + usize::from(fold < remainder);
            for &idx in &order[start..end] {
                fold_of[idx] = fold;
            }
            start = end;
        }

        Ok(FoldAssignment::new(fold_of, k))
    }

    fn config(&self) -> &PartitionConfig {
        &self.config
    }
}
