use anyhow::{Context, Result};
use qualify::engines::candidates::{FittedClassifier, FittedRegressor};
use qualify::engines::quantile::percentile;
use qualify::engines::weighting::TrainingWeights;
use qualify::{
    CancellationToken, CandidateRegistry, CapabilityFlags, ClassLabel, Classifier, ConfigManager,
    Dataset, EvaluationOrchestrator, InMemoryDataset, QuantileRegressor, RunOutcome, SampleIndex,
    WeightingMode,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Splits on feature 0 at the midpoint of the two class means.
struct MidpointClassifier {
    positive: ClassLabel,
}

struct FittedMidpoint {
    positive: ClassLabel,
    negative: ClassLabel,
    threshold: f64,
}

impl Classifier for MidpointClassifier {
    fn fit(
        &self,
        dataset: &dyn Dataset,
        train: &[SampleIndex],
        weights: Option<&TrainingWeights>,
    ) -> Result<Box<dyn FittedClassifier>> {
        let (mut pos_sum, mut pos_n, mut neg_sum, mut neg_n) = (0.0, 0usize, 0.0, 0usize);
        let mut negative = None;
        for &i in train {
            let x = dataset.features(i)[0];
            if dataset.label(i) == self.positive {
                pos_sum += x;
                pos_n += 1;
            } else {
                neg_sum += x;
                neg_n += 1;
                negative.get_or_insert(dataset.label(i));
            }
        }
        anyhow::ensure!(pos_n > 0 && neg_n > 0, "training split lacks one of the classes");

        let (pos_mean, neg_mean) = (pos_sum / pos_n as f64, neg_sum / neg_n as f64);
        // Weighting moves the cut towards the majority class mean.
        let pull = match weights {
            Some(TrainingWeights::PositiveRatio { ratio, .. }) => ratio / (1.0 + ratio),
            _ => 0.5,
        };
        Ok(Box::new(FittedMidpoint {
            positive: self.positive,
            negative: negative.unwrap_or(0),
            threshold: pos_mean + (neg_mean - pos_mean) * pull,
        }))
    }
}

impl FittedClassifier for FittedMidpoint {
    fn predict(&self, dataset: &dyn Dataset, holdout: &[SampleIndex]) -> Result<Vec<ClassLabel>> {
        Ok(holdout
            .iter()
            .map(|&i| {
                if dataset.features(i)[0] > self.threshold {
                    self.positive
                } else {
                    self.negative
                }
            })
            .collect())
    }

    fn predict_probability(&self, dataset: &dyn Dataset, holdout: &[SampleIndex]) -> Result<Vec<f64>> {
        Ok(holdout
            .iter()
            .map(|&i| 1.0 / (1.0 + (self.threshold - dataset.features(i)[0]).exp()))
            .collect())
    }
}

/// Always predicts the most frequent training label.
struct MajorityClassifier;

struct FittedMajority(ClassLabel);

impl Classifier for MajorityClassifier {
    fn fit(
        &self,
        dataset: &dyn Dataset,
        train: &[SampleIndex],
        _weights: Option<&TrainingWeights>,
    ) -> Result<Box<dyn FittedClassifier>> {
        let counts = qualify::engines::weighting::class_counts(train.iter().map(|&i| dataset.label(i)));
        let majority = counts
            .into_iter()
            .max_by_key(|&(_, n)| n)
            .map(|(label, _)| label)
            .context("empty training split")?;
        Ok(Box::new(FittedMajority(majority)))
    }
}

impl FittedClassifier for FittedMajority {
    fn predict(&self, _dataset: &dyn Dataset, holdout: &[SampleIndex]) -> Result<Vec<ClassLabel>> {
        Ok(vec![self.0; holdout.len()])
    }
}

/// Predicts the unconditional τ-quantile of the training targets.
struct EmpiricalQuantile;

struct FittedConstant(f64);

impl QuantileRegressor for EmpiricalQuantile {
    fn fit(&self, dataset: &dyn Dataset, train: &[SampleIndex], tau: f64) -> Result<Box<dyn FittedRegressor>> {
        let targets: Vec<f64> = train.iter().filter_map(|&i| dataset.target(i)).collect();
        let value = percentile(&targets, tau * 100.0).context("no training targets")?;
        Ok(Box::new(FittedConstant(value)))
    }
}

impl FittedRegressor for FittedConstant {
    fn predict(&self, _dataset: &dyn Dataset, holdout: &[SampleIndex]) -> Result<Vec<f64>> {
        Ok(vec![self.0; holdout.len()])
    }
}

fn synthetic_dataset(n: usize, positive_rate: f64, seed: u64) -> Result<InMemoryDataset> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    let mut targets = Vec::with_capacity(n);

    for _ in 0..n {
        let label: ClassLabel = if rng.gen_bool(positive_rate) { 1 } else { 0 };
        let x = label as f64 * 1.5 + gaussian(&mut rng);
        features.push(vec![x]);
        labels.push(label);
        targets.push(2.0 * x + gaussian(&mut rng));
    }

    Ok(InMemoryDataset::new(features, labels)?.with_targets(targets)?)
}

fn gaussian(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn main() -> Result<()> {
    env_logger::init();

    let manager = ConfigManager::new();
    if let Some(path) = std::env::args().nth(1) {
        manager
            .load_layered(&path)
            .with_context(|| format!("loading config from {path}"))?;
    }
    let config = manager.get();

    let mut registry = CandidateRegistry::new();
    registry.register_classifier(
        "midpoint",
        CapabilityFlags::new().with_probability(),
        Arc::new(MidpointClassifier { positive: 1 }),
    )?;
    registry.register_classifier(
        "midpoint_weighted",
        CapabilityFlags::new()
            .with_probability()
            .with_weighting(WeightingMode::PositiveRatio),
        Arc::new(MidpointClassifier { positive: 1 }),
    )?;
    registry.register_classifier("majority", CapabilityFlags::new(), Arc::new(MajorityClassifier))?;
    registry.register_regressor("empirical_quantile", Arc::new(EmpiricalQuantile))?;

    let dataset = Arc::new(synthetic_dataset(2000, 0.1, config.partition.seed)?);
    let orchestrator = EvaluationOrchestrator::new(config, registry)?;

    match orchestrator.run(dataset, &CancellationToken::new()) {
        RunOutcome::Completed(report) => {
            println!("{}", report.to_markdown());
            if let Some(best) = report.best() {
                println!("Selected: {} ({})", best.name, best.candidate_id);
            }
        }
        RunOutcome::PartitionFailed { reason, .. } => anyhow::bail!("partitioning failed: {reason}"),
        RunOutcome::Cancelled { .. } => anyhow::bail!("run cancelled"),
    }
    Ok(())
}
