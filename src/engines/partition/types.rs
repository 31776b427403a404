use crate::types::{FoldId, SampleIndex};
use serde::{Deserialize, Serialize};

/// Mapping from sample index to fold number. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldAssignment {
    fold_of: Vec<FoldId>,
    n_folds: usize,
}

impl FoldAssignment {
    pub(crate) fn new(fold_of: Vec<FoldId>, n_folds: usize) -> Self {
        debug_assert!(fold_of.iter().all(|&f| f < n_folds));
        Self { fold_of, n_folds }
    }

    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    pub fn n_samples(&self) -> usize {
        self.fold_of.len()
    }

    pub fn fold_of(&self, sample: SampleIndex) -> Option<FoldId> {
        self.fold_of.get(sample).copied()
    }

    /// Samples held out when evaluating `fold`, in ascending index order.
    pub fn held_out(&self, fold: FoldId) -> Vec<SampleIndex> {
        self.fold_of
            .iter()
            .enumerate()
            .filter(|(_, &f)| f == fold)
            .map(|(i, _)| i)
            .collect()
    }

    /// Union of every fold except `fold`.
    pub fn training(&self, fold: FoldId) -> Vec<SampleIndex> {
        self.fold_of
            .iter()
            .enumerate()
            .filter(|(_, &f)| f != fold)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn fold_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_folds];
        for &f in &self.fold_of {
            sizes[f] += 1;
        }
        sizes
    }
}
