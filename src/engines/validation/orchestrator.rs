use super::cancel::CancellationToken;
use super::progress::{LogObserver, RunObserver};
use super::report::{MetricSummary, QualityWarning, QuantileReport, RunReport};
use super::state::{RunState, StateTracker};
use super::store::RecordStore;
use super::unit::{
    run_bounded, Bounded, FailureKind, UnitFailure, UnitKey, UnitOutcome, UnitStatus, WorkError,
};
use crate::config::{MetricKind, RunConfig};
use crate::engines::candidates::registry::CandidateModel;
use crate::engines::candidates::{
    CandidateDescriptor, CandidateRegistry, Classifier, Dataset, QuantileRegressor,
    RegisteredCandidate, WeightingMode,
};
use crate::engines::metrics::MetricsEngine;
use crate::engines::partition::{self, FoldAssignment};
use crate::engines::policy;
use crate::engines::quantile::{pinball_loss, QuantileEvaluator};
use crate::engines::ranking::{
    aggregate, mean_std, Annotation, Applicability, CandidateMetrics, Ranker,
};
use crate::engines::weighting::{class_counts, positive_ratio, TrainingWeights, WeightTable};
use crate::error::QualifyError;
use crate::types::{ClassLabel, FoldId, PredictionRecord, QuantileRecord, SampleIndex};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Terminal result of a run. Only a completed run carries a report.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(Box<RunReport>),
    PartitionFailed { reason: String, history: Vec<RunState> },
    Cancelled { history: Vec<RunState> },
}

impl RunOutcome {
    pub fn state(&self) -> RunState {
        match self {
            RunOutcome::Completed(report) => report.state,
            RunOutcome::PartitionFailed { .. } => RunState::PartitionFailed,
            RunOutcome::Cancelled { .. } => RunState::Cancelled,
        }
    }

    pub fn report(&self) -> Option<&RunReport> {
        match self {
            RunOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }

    pub fn into_report(self) -> Option<RunReport> {
        match self {
            RunOutcome::Completed(report) => Some(*report),
            _ => None,
        }
    }
}

/// Read-only inputs for evaluating one held-out fold.
struct FoldPlan {
    held_out: Arc<[SampleIndex]>,
    training: Arc<[SampleIndex]>,
    class_table: Option<WeightTable>,
    positive_ratio: Option<f64>,
}

struct RunContext<'a> {
    dataset: Arc<dyn Dataset>,
    folds: Vec<FoldPlan>,
    predictions: RecordStore<PredictionRecord>,
    quantile_records: RecordStore<QuantileRecord>,
    cancel: &'a CancellationToken,
    completed: AtomicUsize,
    total: usize,
}

enum UnitTask<'a> {
    Classify {
        candidate: &'a RegisteredCandidate,
        model: Arc<dyn Classifier>,
        fold: FoldId,
    },
    Quantile {
        candidate: &'a RegisteredCandidate,
        model: Arc<dyn QuantileRegressor>,
        tau: f64,
        fold: FoldId,
    },
}

/// Drives fit/predict over the candidate × fold matrix and assembles the report.
pub struct EvaluationOrchestrator {
    config: RunConfig,
    registry: CandidateRegistry,
    observer: Arc<dyn RunObserver>,
}

impl EvaluationOrchestrator {
    pub fn new(config: RunConfig, registry: CandidateRegistry) -> Result<Self, QualifyError> {
        config.validate()?;
        Ok(Self {
            config,
            registry,
            observer: Arc::new(LogObserver),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn registry(&self) -> &CandidateRegistry {
        &self.registry
    }

    pub fn run(&self, dataset: Arc<dyn Dataset>, cancel: &CancellationToken) -> RunOutcome {
        let mut tracker = StateTracker::new(self.observer.as_ref());

        tracker.advance(RunState::Partitioning);
        let labels = dataset.labels();
        let assignment = match partition::from_config(&self.config.partition).partition(&labels) {
            Ok(assignment) => assignment,
            Err(e) => {
                log::error!("Partitioning failed: {e}");
                tracker.advance(RunState::PartitionFailed);
                return RunOutcome::PartitionFailed {
                    reason: e.to_string(),
                    history: tracker.history().to_vec(),
                };
            }
        };
        if cancel.is_cancelled() {
            return cancelled(&mut tracker);
        }

        tracker.advance(RunState::Evaluating);
        let tasks = self.plan_units(assignment.n_folds());
        let ctx = self.prepare(dataset, &labels, &assignment, cancel, tasks.len());
        log::info!(
            "Evaluating {} units over {} candidates and {} folds",
            tasks.len(),
            self.registry.len(),
            assignment.n_folds()
        );

        // Collecting is the barrier: every unit is terminal before aggregation.
        let outcomes: Vec<UnitOutcome> = if self.config.execution.parallel {
            tasks
                .into_par_iter()
                .map(|task| self.run_unit(&ctx, task))
                .collect()
        } else {
            tasks
                .into_iter()
                .map(|task| self.run_unit(&ctx, task))
                .collect()
        };

        if cancel.is_cancelled()
            || outcomes
                .iter()
                .any(|o| matches!(o.status, UnitStatus::Cancelled))
        {
            return cancelled(&mut tracker);
        }

        tracker.advance(RunState::Aggregating);
        let mut warnings = Vec::new();
        let candidate_metrics = self.aggregate_classifiers(&ctx, &outcomes, assignment.n_folds(), &mut warnings);
        let quantiles = self.aggregate_quantiles(&ctx, &outcomes, assignment.n_folds(), &mut warnings);
        if cancel.is_cancelled() {
            return cancelled(&mut tracker);
        }

        let ranking = Ranker::new(self.config.ranking.clone()).rank(&candidate_metrics);
        tracker.advance(RunState::Ranked);
        if let Some(best) = ranking.first() {
            log::info!(
                "Top candidate {} with {} = {:?}",
                best.name,
                best.primary_metric,
                best.primary_metric_value
            );
        }
        if cancel.is_cancelled() {
            return cancelled(&mut tracker);
        }

        let counts = class_counts(labels.iter().copied());
        let unit_failures: Vec<UnitFailure> = outcomes
            .into_iter()
            .filter_map(|o| match o.status {
                UnitStatus::Failed(failure) => Some(failure),
                _ => None,
            })
            .collect();

        tracker.advance(RunState::Done);
        RunOutcome::Completed(Box::new(RunReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            state: tracker.current(),
            history: tracker.history().to_vec(),
            n_samples: labels.len(),
            n_folds: assignment.n_folds(),
            fold_sizes: assignment.fold_sizes(),
            weight_table: WeightTable::balanced(&labels).ok(),
            recommendation: policy::recommend_metric(&counts).ok(),
            class_counts: counts,
            candidates: self.registry.descriptors(),
            metrics: candidate_metrics,
            ranking,
            quantiles,
            unit_failures,
            warnings,
        }))
    }

    /// Per-fold plans with weighting computed from the training indices only.
    fn prepare<'a>(
        &self,
        dataset: Arc<dyn Dataset>,
        labels: &[ClassLabel],
        assignment: &FoldAssignment,
        cancel: &'a CancellationToken,
        total: usize,
    ) -> RunContext<'a> {
        let classes: Vec<ClassLabel> = class_counts(labels.iter().copied()).into_keys().collect();
        let positive_label = self.config.metrics.positive_label;

        let folds = (0..assignment.n_folds())
            .map(|fold| {
                let training = assignment.training(fold);
                let training_labels: Vec<ClassLabel> = training.iter().map(|&i| labels[i]).collect();

                let class_table = match WeightTable::balanced_over(training_labels.iter().copied(), &classes) {
                    Ok(table) => Some(table),
                    Err(e) => {
                        log::warn!("No class weight table for fold {fold}: {e}");
                        None
                    }
                };

                FoldPlan {
                    held_out: assignment.held_out(fold).into(),
                    training: training.into(),
                    class_table,
                    positive_ratio: positive_ratio(&training_labels, positive_label).ok(),
                }
            })
            .collect();

        RunContext {
            dataset,
            folds,
            predictions: RecordStore::new(),
            quantile_records: RecordStore::new(),
            cancel,
            completed: AtomicUsize::new(0),
            total,
        }
    }

    fn plan_units(&self, n_folds: usize) -> Vec<UnitTask<'_>> {
        let mut tasks = Vec::new();
        for candidate in self.registry.iter() {
            match candidate.model() {
                CandidateModel::Classifier(model) => {
                    for fold in 0..n_folds {
                        tasks.push(UnitTask::Classify {
                            candidate,
                            model: Arc::clone(model),
                            fold,
                        });
                    }
                }
                CandidateModel::Regressor(model) => {
                    for &tau in &self.config.quantile.quantiles {
                        for fold in 0..n_folds {
                            tasks.push(UnitTask::Quantile {
                                candidate,
                                model: Arc::clone(model),
                                tau,
                                fold,
                            });
                        }
                    }
                }
            }
        }
        tasks
    }

    fn run_unit(&self, ctx: &RunContext<'_>, task: UnitTask<'_>) -> UnitOutcome {
        let outcome = match task {
            UnitTask::Classify {
                candidate,
                model,
                fold,
            } => self.run_classifier_unit(ctx, candidate.descriptor(), model, fold),
            UnitTask::Quantile {
                candidate,
                model,
                tau,
                fold,
            } => self.run_quantile_unit(ctx, candidate.descriptor(), model, tau, fold),
        };
        let completed = ctx.completed.fetch_add(1, Ordering::SeqCst) + 1;
        self.observer.on_unit_complete(&outcome, completed, ctx.total);
        outcome
    }

    fn run_classifier_unit(
        &self,
        ctx: &RunContext<'_>,
        descriptor: &CandidateDescriptor,
        model: Arc<dyn Classifier>,
        fold: FoldId,
    ) -> UnitOutcome {
        let key = UnitKey {
            candidate_id: descriptor.id,
            fold,
            tau: None,
        };
        let plan = &ctx.folds[fold];
        let weights = self.resolve_weights(descriptor, plan);
        let weighting_applied = weights.is_some();

        let dataset = Arc::clone(&ctx.dataset);
        let training = Arc::clone(&plan.training);
        let holdout = Arc::clone(&plan.held_out);
        let wants_proba = descriptor.capabilities.supports_probability;

        let work = move |unit: &CancellationToken| -> Result<(Vec<ClassLabel>, Option<Vec<f64>>), WorkError> {
            let fitted = model
                .fit(dataset.as_ref(), &training, weights.as_ref())
                .map_err(|e| (FailureKind::ConvergenceFailure, format!("{e:#}")))?;
            skip_if_abandoned(unit)?;
            let labels = fitted
                .predict(dataset.as_ref(), &holdout)
                .map_err(|e| (FailureKind::PredictFailure, format!("{e:#}")))?;
            let proba = if wants_proba {
                Some(
                    fitted
                        .predict_probability(dataset.as_ref(), &holdout)
                        .map_err(|e| (FailureKind::PredictFailure, format!("{e:#}")))?,
                )
            } else {
                None
            };
            Ok((labels, proba))
        };

        let status = match run_bounded(
            format!("{}-fold{}", descriptor.name, fold),
            work,
            self.timeout(),
            self.poll_interval(),
            ctx.cancel,
        ) {
            Bounded::Cancelled => UnitStatus::Cancelled,
            Bounded::TimedOut => self.timeout_failure(descriptor, &key),
            Bounded::Finished(Err((kind, reason))) => failure(descriptor, &key, kind, reason),
            Bounded::Finished(Ok((labels, proba))) => {
                match record_predictions(ctx, descriptor, fold, &plan.held_out, labels, proba) {
                    Ok(()) => UnitStatus::Succeeded,
                    Err((kind, reason)) => failure(descriptor, &key, kind, reason),
                }
            }
        };

        UnitOutcome {
            key,
            status,
            weighting_applied,
        }
    }

    fn run_quantile_unit(
        &self,
        ctx: &RunContext<'_>,
        descriptor: &CandidateDescriptor,
        model: Arc<dyn QuantileRegressor>,
        tau: f64,
        fold: FoldId,
    ) -> UnitOutcome {
        let key = UnitKey {
            candidate_id: descriptor.id,
            fold,
            tau: Some(tau),
        };
        let plan = &ctx.folds[fold];

        let truth: Option<Vec<f64>> = plan.held_out.iter().map(|&i| ctx.dataset.target(i)).collect();
        let status = match truth {
            None => failure(
                descriptor,
                &key,
                FailureKind::InvalidOutput,
                "dataset has no continuous target for the held-out samples".to_string(),
            ),
            Some(truth) => {
                let dataset = Arc::clone(&ctx.dataset);
                let training = Arc::clone(&plan.training);
                let holdout = Arc::clone(&plan.held_out);

                let work = move |unit: &CancellationToken| -> Result<Vec<f64>, WorkError> {
                    let fitted = model
                        .fit(dataset.as_ref(), &training, tau)
                        .map_err(|e| (FailureKind::ConvergenceFailure, format!("{e:#}")))?;
                    skip_if_abandoned(unit)?;
                    fitted
                        .predict(dataset.as_ref(), &holdout)
                        .map_err(|e| (FailureKind::PredictFailure, format!("{e:#}")))
                };

                match run_bounded(
                    format!("{}-q{}-fold{}", descriptor.name, tau, fold),
                    work,
                    self.timeout(),
                    self.poll_interval(),
                    ctx.cancel,
                ) {
                    Bounded::Cancelled => UnitStatus::Cancelled,
                    Bounded::TimedOut => self.timeout_failure(descriptor, &key),
                    Bounded::Finished(Err((kind, reason))) => failure(descriptor, &key, kind, reason),
                    Bounded::Finished(Ok(predicted)) => {
                        match record_quantiles(ctx, descriptor, tau, fold, &plan.held_out, truth, predicted) {
                            Ok(()) => UnitStatus::Succeeded,
                            Err((kind, reason)) => failure(descriptor, &key, kind, reason),
                        }
                    }
                }
            }
        };

        UnitOutcome {
            key,
            status,
            weighting_applied: false,
        }
    }

    fn resolve_weights(&self, descriptor: &CandidateDescriptor, plan: &FoldPlan) -> Option<TrainingWeights> {
        let resolved = match descriptor.capabilities.native_weighting? {
            WeightingMode::ClassTable => plan.class_table.clone().map(TrainingWeights::ClassTable),
            WeightingMode::PositiveRatio => plan.positive_ratio.map(|ratio| TrainingWeights::PositiveRatio {
                positive_label: self.config.metrics.positive_label,
                ratio,
            }),
        };
        if resolved.is_none() {
            log::warn!(
                "Candidate {} declares native weighting but none is available for this fold",
                descriptor.name
            );
        }
        resolved
    }

    fn exceeds_failure_policy(&self, failed: usize, total: usize) -> bool {
        if failed == 0 || total == 0 {
            return false;
        }
        failed as f64 / total as f64 > self.config.execution.max_failed_fold_fraction
    }

    fn aggregate_classifiers(
        &self,
        ctx: &RunContext<'_>,
        outcomes: &[UnitOutcome],
        n_folds: usize,
        warnings: &mut Vec<QualityWarning>,
    ) -> Vec<CandidateMetrics> {
        let engine = MetricsEngine::new(self.config.metrics.clone());
        let mut results = Vec::new();

        for candidate in self.registry.iter() {
            let descriptor = candidate.descriptor();
            if !matches!(candidate.model(), CandidateModel::Classifier(_)) {
                continue;
            }

            let units: Vec<&UnitOutcome> = outcomes
                .iter()
                .filter(|o| o.key.candidate_id == descriptor.id)
                .collect();
            let (succeeded, failed_folds) = split_folds(&units);
            let failed = self.exceeds_failure_policy(failed_folds.len(), n_folds);

            let records = ctx.predictions.for_candidate(descriptor.id);
            let caps = descriptor.capabilities;
            let mut sequences = engine.score_by_fold(&records, &succeeded, &caps);

            let mut annotations = BTreeSet::new();
            if units.iter().any(|u| !u.weighting_applied) {
                annotations.insert(Annotation::WeightingNotApplied);
            }
            if !failed_folds.is_empty() {
                annotations.insert(Annotation::FoldsFailed(failed_folds.len()));
            }

            let metrics: BTreeMap<MetricKind, _> = self
                .config
                .metrics
                .metrics
                .iter()
                .map(|&kind| {
                    let mut result = aggregate(descriptor.id, kind, sequences.remove(&kind).unwrap_or_default());
                    if kind.requires_probability() && !caps.supports_probability {
                        result.applicability = Applicability::NotApplicable;
                        annotations.insert(Annotation::MetricNotApplicable(kind));
                        log::info!(
                            "{}",
                            QualifyError::UnsupportedCapability {
                                candidate: descriptor.name.clone(),
                                capability: "probability output",
                            }
                        );
                    }
                    (kind, result)
                })
                .collect();

            if failed {
                log::warn!(
                    "Candidate {} failed {}/{} folds and is excluded from ranking",
                    descriptor.name,
                    failed_folds.len(),
                    n_folds
                );
                warnings.push(QualityWarning::CandidateFailed {
                    candidate_id: descriptor.id,
                    failed_folds: failed_folds.len(),
                    total_folds: n_folds,
                });
            }

            results.push(CandidateMetrics {
                candidate_id: descriptor.id,
                name: descriptor.name.clone(),
                failed,
                failed_folds,
                annotations,
                metrics,
            });
        }

        results
    }

    fn aggregate_quantiles(
        &self,
        ctx: &RunContext<'_>,
        outcomes: &[UnitOutcome],
        n_folds: usize,
        warnings: &mut Vec<QualityWarning>,
    ) -> Vec<QuantileReport> {
        let evaluator = QuantileEvaluator::new(self.config.quantile.clone());
        let mut reports = Vec::new();

        for candidate in self.registry.iter() {
            let descriptor = candidate.descriptor();
            if !matches!(candidate.model(), CandidateModel::Regressor(_)) {
                continue;
            }
            let records = ctx.quantile_records.for_candidate(descriptor.id);

            for &tau in &self.config.quantile.quantiles {
                let units: Vec<&UnitOutcome> = outcomes
                    .iter()
                    .filter(|o| o.key.candidate_id == descriptor.id && o.key.tau == Some(tau))
                    .collect();
                let (succeeded, failed_folds) = split_folds(&units);
                let failed = self.exceeds_failure_policy(failed_folds.len(), n_folds);

                let pooled: Vec<&QuantileRecord> = records
                    .iter()
                    .filter(|r| r.tau == tau && succeeded.contains(&r.fold_id))
                    .collect();

                let evaluation = if failed || pooled.is_empty() {
                    None
                } else {
                    let y_true: Vec<f64> = pooled.iter().map(|r| r.y_true).collect();
                    let y_pred: Vec<f64> = pooled.iter().map(|r| r.y_pred).collect();
                    match evaluator.evaluate(tau, &y_true, &y_pred) {
                        Ok(evaluation) => Some(evaluation),
                        Err(e) => {
                            log::warn!("Quantile evaluation for {} at {tau} failed: {e}", descriptor.name);
                            None
                        }
                    }
                };

                if let Some(eval) = evaluation.as_ref().filter(|e| e.miscalibrated) {
                    warnings.push(QualityWarning::Miscalibration {
                        candidate_id: descriptor.id,
                        tau,
                        coverage: eval.coverage,
                        calibration_gap: eval.calibration_gap,
                    });
                }
                if failed {
                    warnings.push(QualityWarning::CandidateFailed {
                        candidate_id: descriptor.id,
                        failed_folds: failed_folds.len(),
                        total_folds: n_folds,
                    });
                }

                let fold_losses: Vec<f64> = succeeded
                    .iter()
                    .filter_map(|&fold| {
                        let in_fold: Vec<&&QuantileRecord> = pooled.iter().filter(|r| r.fold_id == fold).collect();
                        if in_fold.is_empty() {
                            return None;
                        }
                        let total: f64 = in_fold.iter().map(|r| pinball_loss(tau, r.y_true, r.y_pred)).sum();
                        Some(total / in_fold.len() as f64)
                    })
                    .collect();

                reports.push(QuantileReport {
                    candidate_id: descriptor.id,
                    name: descriptor.name.clone(),
                    tau,
                    failed,
                    evaluation,
                    fold_pinball: mean_std(&fold_losses).map(|(mean, std)| MetricSummary { mean, std }),
                });
            }
        }

        reports
    }

    fn timeout(&self) -> Option<Duration> {
        self.config.execution.unit_timeout()
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.execution.poll_interval_ms)
    }

    fn timeout_failure(&self, descriptor: &CandidateDescriptor, key: &UnitKey) -> UnitStatus {
        let reason = QualifyError::Timeout {
            candidate: descriptor.id,
            fold: key.fold,
            timeout_ms: self.config.execution.unit_timeout_ms,
        }
        .to_string();
        failure(descriptor, key, FailureKind::Timeout, reason)
    }
}

/// Stops a unit between fit and predict once its wait has been given up.
fn skip_if_abandoned(unit: &CancellationToken) -> Result<(), WorkError> {
    if unit.is_cancelled() {
        return Err((FailureKind::Timeout, "unit abandoned after fit".to_string()));
    }
    Ok(())
}

fn cancelled(tracker: &mut StateTracker<'_>) -> RunOutcome {
    log::warn!("Run cancelled during {}", tracker.current());
    tracker.advance(RunState::Cancelled);
    RunOutcome::Cancelled {
        history: tracker.history().to_vec(),
    }
}

fn failure(descriptor: &CandidateDescriptor, key: &UnitKey, kind: FailureKind, reason: String) -> UnitStatus {
    UnitStatus::Failed(UnitFailure {
        candidate_id: descriptor.id,
        candidate_name: descriptor.name.clone(),
        fold: key.fold,
        tau: key.tau,
        kind,
        reason,
    })
}

/// Succeeded and failed folds of one candidate's units, each ascending.
fn split_folds(units: &[&UnitOutcome]) -> (Vec<FoldId>, Vec<FoldId>) {
    let mut succeeded: Vec<FoldId> = units.iter().filter(|u| u.succeeded()).map(|u| u.key.fold).collect();
    let mut failed: Vec<FoldId> = units.iter().filter(|u| !u.succeeded()).map(|u| u.key.fold).collect();
    succeeded.sort_unstable();
    failed.sort_unstable();
    (succeeded, failed)
}

fn record_predictions(
    ctx: &RunContext<'_>,
    descriptor: &CandidateDescriptor,
    fold: FoldId,
    holdout: &[SampleIndex],
    labels: Vec<ClassLabel>,
    proba: Option<Vec<f64>>,
) -> Result<(), WorkError> {
    if labels.len() != holdout.len() {
        return Err((
            FailureKind::InvalidOutput,
            format!("predict returned {} labels for {} samples", labels.len(), holdout.len()),
        ));
    }
    if let Some(scores) = &proba {
        if scores.len() != holdout.len() {
            return Err((
                FailureKind::InvalidOutput,
                format!("predict_probability returned {} scores for {} samples", scores.len(), holdout.len()),
            ));
        }
        if scores.iter().any(|s| !s.is_finite()) {
            return Err((FailureKind::InvalidOutput, "non-finite probability score".to_string()));
        }
    }

    let batch = holdout
        .iter()
        .zip(labels)
        .enumerate()
        .map(|(i, (&sample, y_pred))| PredictionRecord {
            sample_index: sample,
            fold_id: fold,
            candidate_id: descriptor.id,
            y_true: ctx.dataset.label(sample),
            y_pred,
            y_proba: proba.as_ref().map(|p| p[i]),
        })
        .collect();

    ctx.predictions
        .append_all(batch)
        .map_err(|e| (FailureKind::DuplicateRecord, e.to_string()))
}

fn record_quantiles(
    ctx: &RunContext<'_>,
    descriptor: &CandidateDescriptor,
    tau: f64,
    fold: FoldId,
    holdout: &[SampleIndex],
    truth: Vec<f64>,
    predicted: Vec<f64>,
) -> Result<(), WorkError> {
    if predicted.len() != holdout.len() {
        return Err((
            FailureKind::InvalidOutput,
            format!("predict returned {} values for {} samples", predicted.len(), holdout.len()),
        ));
    }
    if predicted.iter().chain(&truth).any(|v| !v.is_finite()) {
        return Err((FailureKind::InvalidOutput, "non-finite quantile prediction or target".to_string()));
    }

    let batch = holdout
        .iter()
        .zip(truth.into_iter().zip(predicted))
        .map(|(&sample, (y_true, y_pred))| QuantileRecord {
            sample_index: sample,
            fold_id: fold,
            candidate_id: descriptor.id,
            tau,
            y_true,
            y_pred,
        })
        .collect();

    ctx.quantile_records
        .append_all(batch)
        .map_err(|e| (FailureKind::DuplicateRecord, e.to_string()))
}
