pub mod dataset;
pub mod registry;
pub mod traits;

pub use dataset::InMemoryDataset;
pub use registry::{
    CandidateDescriptor, CandidateKind, CandidateRegistry, CapabilityFlags, RegisteredCandidate,
    WeightingMode,
};
pub use traits::{Classifier, Dataset, FittedClassifier, FittedRegressor, QuantileRegressor};
