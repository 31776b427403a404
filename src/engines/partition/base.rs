use super::types::FoldAssignment;
use crate::config::PartitionConfig;
use crate::error::QualifyError;
use crate::types::ClassLabel;

pub trait Partitioner: Send + Sync {
    /// Assign every sample to exactly one fold. Works on labels only, never on features.
    fn partition(&self, labels: &[ClassLabel]) -> Result<FoldAssignment, QualifyError>;

    /// Get partitioner configuration
    fn config(&self) -> &PartitionConfig;
}
