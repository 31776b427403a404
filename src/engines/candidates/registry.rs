use super::traits::{Classifier, QuantileRegressor};
use crate::error::QualifyError;
use crate::types::CandidateId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// How a candidate consumes imbalance weighting natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingMode {
    ClassTable,
    PositiveRatio,
}

/// Capabilities declared at registration. Never probed at call time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFlags {
    pub supports_probability: bool,
    pub native_weighting: Option<WeightingMode>,
}

impl CapabilityFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_probability(mut self) -> Self {
        self.supports_probability = true;
        self
    }

    pub fn with_weighting(mut self, mode: WeightingMode) -> Self {
        self.native_weighting = Some(mode);
        self
    }

    pub fn supports_native_weighting(&self) -> bool {
        self.native_weighting.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    Classifier,
    QuantileRegressor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDescriptor {
    pub id: CandidateId,
    pub name: String,
    pub kind: CandidateKind,
    pub capabilities: CapabilityFlags,
}

#[derive(Clone)]
pub(crate) enum CandidateModel {
    Classifier(Arc<dyn Classifier>),
    Regressor(Arc<dyn QuantileRegressor>),
}

#[derive(Clone)]
pub struct RegisteredCandidate {
    descriptor: CandidateDescriptor,
    model: CandidateModel,
}

impl RegisteredCandidate {
    pub fn descriptor(&self) -> &CandidateDescriptor {
        &self.descriptor
    }

    pub(crate) fn model(&self) -> &CandidateModel {
        &self.model
    }
}

/// Candidates for one run. Descriptors are immutable once registered.
#[derive(Default)]
pub struct CandidateRegistry {
    candidates: Vec<RegisteredCandidate>,
    names: HashSet<String>,
}

impl CandidateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_classifier(
        &mut self,
        name: impl Into<String>,
        capabilities: CapabilityFlags,
        model: Arc<dyn Classifier>,
    ) -> Result<CandidateId, QualifyError> {
        self.register(
            name.into(),
            CandidateKind::Classifier,
            capabilities,
            CandidateModel::Classifier(model),
        )
    }

    pub fn register_regressor(
        &mut self,
        name: impl Into<String>,
        model: Arc<dyn QuantileRegressor>,
    ) -> Result<CandidateId, QualifyError> {
        self.register(
            name.into(),
            CandidateKind::QuantileRegressor,
            CapabilityFlags::default(),
            CandidateModel::Regressor(model),
        )
    }

    fn register(
        &mut self,
        name: String,
        kind: CandidateKind,
        capabilities: CapabilityFlags,
        model: CandidateModel,
    ) -> Result<CandidateId, QualifyError> {
        if !self.names.insert(name.clone()) {
            return Err(QualifyError::Configuration(format!(
                "Candidate {name} is already registered"
            )));
        }

        let id = CandidateId(self.candidates.len());
        log::debug!("Registered {kind:?} {name} as {id} with {capabilities:?}");
        self.candidates.push(RegisteredCandidate {
            descriptor: CandidateDescriptor {
                id,
                name,
                kind,
                capabilities,
            },
            model,
        });
        Ok(id)
    }

    pub fn get(&self, id: CandidateId) -> Option<&RegisteredCandidate> {
        self.candidates.get(id.0)
    }

    pub fn descriptor(&self, id: CandidateId) -> Option<&CandidateDescriptor> {
        self.get(id).map(|c| &c.descriptor)
    }

    pub fn descriptors(&self) -> Vec<CandidateDescriptor> {
        self.candidates.iter().map(|c| c.descriptor.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredCandidate> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::candidates::traits::{Dataset, FittedClassifier};
    use crate::engines::weighting::TrainingWeights;
    use crate::types::{ClassLabel, SampleIndex};

    struct Constant;

    struct ConstantState;

    impl Classifier for Constant {
        fn fit(
            &self,
            _dataset: &dyn Dataset,
            _train: &[SampleIndex],
            _weights: Option<&TrainingWeights>,
        ) -> anyhow::Result<Box<dyn FittedClassifier>> {
            Ok(Box::new(ConstantState))
        }
    }

    impl FittedClassifier for ConstantState {
        fn predict(
            &self,
            _dataset: &dyn Dataset,
            holdout: &[SampleIndex],
        ) -> anyhow::Result<Vec<ClassLabel>> {
            Ok(vec![0; holdout.len()])
        }
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let mut registry = CandidateRegistry::new();
        let a = registry
            .register_classifier("a", CapabilityFlags::new(), Arc::new(Constant))
            .unwrap();
        let b = registry
            .register_classifier(
                "b",
                CapabilityFlags::new()
                    .with_probability()
                    .with_weighting(WeightingMode::ClassTable),
                Arc::new(Constant),
            )
            .unwrap();

        assert_eq!(a, CandidateId(0));
        assert_eq!(b, CandidateId(1));
        let flags = registry.descriptor(b).unwrap().capabilities;
        assert!(flags.supports_probability);
        assert!(flags.supports_native_weighting());
        assert!(!registry.descriptor(a).unwrap().capabilities.supports_native_weighting());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = CandidateRegistry::new();
        registry
            .register_classifier("knn", CapabilityFlags::new(), Arc::new(Constant))
            .unwrap();
        assert!(registry
            .register_classifier("knn", CapabilityFlags::new(), Arc::new(Constant))
            .is_err());
        assert_eq!(registry.len(), 1);
    }
}
