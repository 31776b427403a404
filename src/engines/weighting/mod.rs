//! Imbalance-aware class weighting.
//!
//! Two modes are offered: a balanced per-class table
//! (`weight(c) = N / (C * n_c)`) and, for binary problems, the
//! negative/positive ratio consumed by boosted-tree style learners.
//! Which one a candidate receives is decided by its declared capabilities.

use crate::error::QualifyError;
use crate::types::{ClassLabel, SampleIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    weights: BTreeMap<ClassLabel, f64>,
    counts: BTreeMap<ClassLabel, usize>,
    total: usize,
}

impl WeightTable {
    /// Balanced weights over the classes present in `labels`.
    pub fn balanced(labels: &[ClassLabel]) -> Result<Self, QualifyError> {
        Self::from_counts(&class_counts(labels.iter().copied()))
    }

    /// Balanced weights over a declared class set. A declared class absent
    /// from `labels` is an error rather than a zero weight.
    pub fn balanced_over<I>(labels: I, classes: &[ClassLabel]) -> Result<Self, QualifyError>
    where
        I: IntoIterator<Item = ClassLabel>,
    {
        let mut counts: BTreeMap<ClassLabel, usize> = classes.iter().map(|&c| (c, 0)).collect();
        for label in labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        Self::from_counts(&counts)
    }

    pub fn from_counts(counts: &BTreeMap<ClassLabel, usize>) -> Result<Self, QualifyError> {
        if counts.is_empty() {
            return Err(QualifyError::Validation(
                "Cannot weight an empty label set".to_string(),
            ));
        }
        if let Some((&class, _)) = counts.iter().find(|(_, &n)| n == 0) {
            return Err(QualifyError::EmptyClass(class));
        }

        let total: usize = counts.values().sum();
        let n_classes = counts.len() as f64;
        let weights = counts
            .iter()
            .map(|(&class, &n)| (class, total as f64 / (n_classes * n as f64)))
            .collect();

        Ok(Self {
            weights,
            counts: counts.clone(),
            total,
        })
    }

    pub fn weight_for(&self, class: ClassLabel) -> Option<f64> {
        self.weights.get(&class).copied()
    }

    pub fn weights(&self) -> &BTreeMap<ClassLabel, f64> {
        &self.weights
    }

    pub fn counts(&self) -> &BTreeMap<ClassLabel, usize> {
        &self.counts
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Per-sample weights for `indices`, looked up through `label_of`.
    /// Classes outside the table get weight 1.
    pub fn sample_weights<F>(&self, indices: &[SampleIndex], label_of: F) -> Vec<f64>
    where
        F: Fn(SampleIndex) -> ClassLabel,
    {
        indices
            .iter()
            .map(|&i| self.weight_for(label_of(i)).unwrap_or(1.0))
            .collect()
    }
}

/// `n_negative / n_positive` for a binary label set.
pub fn positive_ratio(labels: &[ClassLabel], positive: ClassLabel) -> Result<f64, QualifyError> {
    let counts = class_counts(labels.iter().copied());
    if counts.len() != 2 || !counts.contains_key(&positive) {
        return Err(QualifyError::Validation(format!(
            "Ratio weighting needs a binary label set containing {positive}, found classes {:?}",
            counts.keys().collect::<Vec<_>>()
        )));
    }
    let n_pos = counts[&positive];
    let n_neg: usize = counts
        .iter()
        .filter(|(&c, _)| c != positive)
        .map(|(_, &n)| n)
        .sum();
    Ok(n_neg as f64 / n_pos as f64)
}

pub fn class_counts<I>(labels: I) -> BTreeMap<ClassLabel, usize>
where
    I: IntoIterator<Item = ClassLabel>,
{
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Weighting handed to a candidate's `fit`, already resolved for one fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrainingWeights {
    ClassTable(WeightTable),
    PositiveRatio { positive_label: ClassLabel, ratio: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_weights_reweight_to_n() {
        let labels: Vec<ClassLabel> = [vec![0; 900], vec![1; 100]].concat();
        let table = WeightTable::balanced(&labels).unwrap();

        assert!((table.weight_for(0).unwrap() - 1000.0 / 1800.0).abs() < 1e-12);
        assert!((table.weight_for(1).unwrap() - 5.0).abs() < 1e-12);

        let effective: f64 = table
            .counts()
            .iter()
            .map(|(c, &n)| table.weight_for(*c).unwrap() * n as f64)
            .sum();
        assert!((effective - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_declared_class_without_samples_is_error() {
        let err = WeightTable::balanced_over(vec![0, 0, 1], &[0, 1, 2]).unwrap_err();
        assert!(matches!(err, QualifyError::EmptyClass(2)));
    }

    #[test]
    fn test_positive_ratio() {
        let labels: Vec<ClassLabel> = [vec![0; 90], vec![1; 10]].concat();
        assert_eq!(positive_ratio(&labels, 1).unwrap(), 9.0);
        assert!(positive_ratio(&[0, 1, 2], 1).is_err());
        assert!(positive_ratio(&[0, 0, 0], 1).is_err());
    }
}
