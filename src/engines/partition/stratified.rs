use super::base::Partitioner;
use super::types::FoldAssignment;
use crate::config::{PartitionConfig, PartitionStrategy};
use crate::error::QualifyError;
use crate::types::{ClassLabel, SampleIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{BTreeMap, VecDeque};

/// Stratified K-fold: every fold receives each class in proportion to its size.
pub struct StratifiedPartitioner {
    config: PartitionConfig,
}

impl StratifiedPartitioner {
    pub fn new(n_folds: usize, shuffle: bool, seed: u64) -> Self {
        Self {
            config: PartitionConfig {
                strategy: PartitionStrategy::Stratified,
                n_folds,
                shuffle,
                seed,
            },
        }
    }
}

impl Partitioner for StratifiedPartitioner {
    fn partition(&self, labels: &[ClassLabel]) -> Result<FoldAssignment, QualifyError> {
        let k = self.config.n_folds;
        if k < 2 {
            return Err(QualifyError::Configuration(
                "Fold count must be at least 2".to_string(),
            ));
        }

        if labels.is_empty() {
            return Err(QualifyError::Validation("Cannot partition an empty dataset".to_string()));
        }

        // BTreeMap keeps class order, and therefore the RNG stream, stable.
        let mut groups: BTreeMap<ClassLabel, Vec<SampleIndex>> = BTreeMap::new();
        for (idx, &label) in labels.iter().enumerate() {
            groups.entry(label).or_default().push(idx);
        }

        if let Some((&class, members)) = groups.iter().find(|(_, m)| m.len() < k) {
            return Err(QualifyError::InsufficientSamples {
                class,
                count: members.len(),
                folds: k,
            });
        }

        let n = labels.len();
        let fold_sizes: Vec<usize> = (0..k).map(|f| n / k + usize::from(f < n % k)).collect();
        let class_sizes: Vec<usize> = groups.values().map(Vec::len).collect();
        let allocation = allocate(&fold_sizes, &class_sizes);

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut fold_of = vec![0; n];
        for (class_idx, members) in groups.values_mut().enumerate() {
            if self.config.shuffle {
                members.shuffle(&mut rng);
            }
            let mut members = members.iter();
            for (fold, row) in allocation.iter().enumerate() {
                for &idx in members.by_ref().take(row[class_idx]) {
                    fold_of[idx] = fold;
                }
            }
        }

        log::debug!(
            "Stratified {} samples over {} classes into folds of {:?}",
            n,
            groups.len(),
            fold_sizes
        );

        Ok(FoldAssignment::new(fold_of, k))
    }

    fn config(&self) -> &PartitionConfig {
        &self.config
    }
}

/// Per-fold, per-class sample counts.
///
/// Each entry is the floor or the ceiling of `n_c · size_f / N`; rows sum to
/// the fold sizes and columns to the class sizes. Floors are taken first and
/// the remainders handed out one at a time along augmenting paths, so a fold
/// may trade a class it already holds an extra of for one still in demand.
fn allocate(fold_sizes: &[usize], class_sizes: &[usize]) -> Vec<Vec<usize>> {
    let n: usize = class_sizes.iter().sum();
    let (k, c) = (fold_sizes.len(), class_sizes.len());

    let mut counts = vec![vec![0; c]; k];
    let mut fractional = vec![vec![false; c]; k];
    for f in 0..k {
        for j in 0..c {
            let exact = class_sizes[j] * fold_sizes[f];
            counts[f][j] = exact / n;
            fractional[f][j] = exact % n != 0;
        }
    }
    let mut fold_left: Vec<usize> = (0..k)
        .map(|f| fold_sizes[f] - counts[f].iter().sum::<usize>())
        .collect();
    let mut class_left: Vec<usize> = (0..c)
        .map(|j| class_sizes[j] - counts.iter().map(|row| row[j]).sum::<usize>())
        .collect();

    let mut extra = vec![vec![false; c]; k];
    while let Some(start) = (0..k).find(|&f| fold_left[f] > 0) {
        let mut class_from: Vec<Option<usize>> = vec![None; c];
        let mut fold_from: Vec<Option<usize>> = vec![None; k];
        let mut fold_seen = vec![false; k];
        fold_seen[start] = true;

        let mut queue = VecDeque::from([start]);
        let mut end = None;
        'search: while let Some(f) = queue.pop_front() {
            for j in 0..c {
                if !fractional[f][j] || extra[f][j] || class_from[j].is_some() {
                    continue;
                }
                class_from[j] = Some(f);
                if class_left[j] > 0 {
                    end = Some(j);
                    break 'search;
                }
                for g in 0..k {
                    if extra[g][j] && !fold_seen[g] {
                        fold_seen[g] = true;
                        fold_from[g] = Some(j);
                        queue.push_back(g);
                    }
                }
            }
        }

        // Unreachable for integral row and column sums.
        let Some(end) = end else { break };

        let mut j = end;
        while let Some(f) = class_from[j] {
            extra[f][j] = true;
            match fold_from[f] {
                Some(previous) if f != start => {
                    extra[f][previous] = false;
                    j = previous;
                }
                _ => break,
            }
        }
        fold_left[start] -= 1;
        class_left[end] -= 1;
    }

    for f in 0..k {
        for j in 0..c {
            counts[f][j] += usize::from(extra[f][j]);
        }
    }
    counts
}
