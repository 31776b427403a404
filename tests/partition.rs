use qualify::config::{PartitionConfig, PartitionStrategy};
use qualify::engines::partition::{self, KFoldPartitioner, Partitioner, StratifiedPartitioner};
use qualify::engines::weighting::{class_counts, WeightTable};
use qualify::{ClassLabel, QualifyError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

fn imbalanced_labels(n_neg: usize, n_pos: usize) -> Vec<ClassLabel> {
    let mut labels = vec![0; n_neg];
    labels.extend(vec![1; n_pos]);
    labels
}

fn random_labels(n: usize, n_classes: i64, seed: u64) -> Vec<ClassLabel> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(0..n_classes)).collect()
}

#[test]
fn test_scenario_a_fold_composition() {
    let labels = imbalanced_labels(900, 100);
    let assignment = StratifiedPartitioner::new(5, true, 42).partition(&labels).unwrap();

    for fold in 0..5 {
        let held_out = assignment.held_out(fold);
        let positives = held_out.iter().filter(|&&i| labels[i] == 1).count();
        let negatives = held_out.len() - positives;
        assert!((179..=181).contains(&negatives), "fold {fold}: {negatives} negatives");
        assert!((19..=21).contains(&positives), "fold {fold}: {positives} positives");
    }
}

#[test]
fn test_folds_are_disjoint_and_cover_all_samples() {
    for (seed, n) in [(1u64, 97usize), (2, 250), (3, 1003)] {
        let labels = random_labels(n, 3, seed);
        let assignment = StratifiedPartitioner::new(5, true, seed).partition(&labels).unwrap();

        let mut seen = BTreeSet::new();
        for fold in 0..assignment.n_folds() {
            for idx in assignment.held_out(fold) {
                assert!(seen.insert(idx), "sample {idx} held out twice");
            }
            let training: BTreeSet<_> = assignment.training(fold).into_iter().collect();
            assert!(assignment.held_out(fold).iter().all(|i| !training.contains(i)));
            assert_eq!(training.len() + assignment.held_out(fold).len(), n);
        }
        assert_eq!(seen, (0..n).collect::<BTreeSet<_>>());

        let sizes = assignment.fold_sizes();
        let (min, max) = (sizes.iter().min().unwrap(), sizes.iter().max().unwrap());
        assert!(max - min <= 1, "fold sizes {sizes:?}");
    }
}

#[test]
fn test_class_proportions_track_global() {
    let labels = random_labels(1200, 4, 9);
    let k = 6;
    let assignment = StratifiedPartitioner::new(k, true, 9).partition(&labels).unwrap();
    let global = class_counts(labels.iter().copied());

    for fold in 0..k {
        let held_out = assignment.held_out(fold);
        let fold_size = held_out.len() as f64;
        let local = class_counts(held_out.iter().map(|&i| labels[i]));
        for (class, &n_c) in &global {
            let global_share = n_c as f64 / labels.len() as f64;
            let fold_share = *local.get(class).unwrap_or(&0) as f64 / fold_size;
            assert!(
                (fold_share - global_share).abs() <= 1.0 / fold_size + 1e-12,
                "class {class} fold {fold}: {fold_share} vs {global_share}"
            );
        }
    }
}

#[test]
fn test_same_seed_gives_identical_assignment() {
    let labels = random_labels(500, 2, 5);
    let config = PartitionConfig {
        seed: 1234,
        ..PartitionConfig::default()
    };
    let first = partition::from_config(&config).partition(&labels).unwrap();
    let second = partition::from_config(&config).partition(&labels).unwrap();
    assert_eq!(first, second);

    let other = partition::from_config(&PartitionConfig { seed: 99, ..config })
        .partition(&labels)
        .unwrap();
    assert_ne!(first, other);
}

#[test]
fn test_unshuffled_partition_ignores_seed() {
    let labels = random_labels(100, 2, 7);
    let a = StratifiedPartitioner::new(4, false, 1).partition(&labels).unwrap();
    let b = StratifiedPartitioner::new(4, false, 2).partition(&labels).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_small_class_aborts_partitioning() {
    let labels = imbalanced_labels(50, 3);
    match StratifiedPartitioner::new(5, true, 42).partition(&labels) {
        Err(QualifyError::InsufficientSamples { class, count, folds }) => {
            assert_eq!((class, count, folds), (1, 3, 5));
        }
        other => panic!("expected InsufficientSamples, got {other:?}"),
    }
}

#[test]
fn test_plain_kfold_sizes() {
    let labels = imbalanced_labels(10, 3);
    let config = PartitionConfig {
        strategy: PartitionStrategy::Plain,
        n_folds: 4,
        ..PartitionConfig::default()
    };
    let assignment = partition::from_config(&config).partition(&labels).unwrap();
    assert_eq!(assignment.fold_sizes(), vec![4, 3, 3, 3]);

    assert!(KFoldPartitioner::new(5, false, 0).partition(&[0, 1, 0]).is_err());
}

#[test]
fn test_weight_table_rebalances_to_n() {
    let labels = random_labels(777, 3, 11);
    let table = WeightTable::balanced(&labels).unwrap();
    let effective: f64 = table
        .counts()
        .iter()
        .map(|(class, &n_c)| table.weight_for(*class).unwrap() * n_c as f64)
        .sum();
    assert!((effective - labels.len() as f64).abs() < 1e-9);
}
