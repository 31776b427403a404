use super::traits::Dataset;
use crate::error::QualifyError;
use crate::types::{ClassLabel, SampleIndex};

/// Row-oriented dataset held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    features: Vec<Vec<f64>>,
    labels: Vec<ClassLabel>,
    targets: Option<Vec<f64>>,
}

impl InMemoryDataset {
    pub fn new(features: Vec<Vec<f64>>, labels: Vec<ClassLabel>) -> Result<Self, QualifyError> {
        if features.len() != labels.len() {
            return Err(QualifyError::Validation(format!(
                "Feature rows ({}) and labels ({}) differ in length",
                features.len(),
                labels.len()
            )));
        }
        Ok(Self {
            features,
            labels,
            targets: None,
        })
    }

    pub fn with_targets(mut self, targets: Vec<f64>) -> Result<Self, QualifyError> {
        if targets.len() != self.labels.len() {
            return Err(QualifyError::Validation(format!(
                "Targets ({}) and labels ({}) differ in length",
                targets.len(),
                self.labels.len()
            )));
        }
        self.targets = Some(targets);
        Ok(self)
    }
}

impl Dataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.labels.len()
    }

    fn label(&self, index: SampleIndex) -> ClassLabel {
        self.labels[index]
    }

    fn features(&self, index: SampleIndex) -> &[f64] {
        &self.features[index]
    }

    fn target(&self, index: SampleIndex) -> Option<f64> {
        self.targets.as_ref().map(|t| t[index])
    }

    fn labels(&self) -> Vec<ClassLabel> {
        self.labels.clone()
    }
}
