pub mod candidates;
pub mod metrics;
pub mod partition;
pub mod policy;
pub mod quantile;
pub mod ranking;
pub mod validation;
pub mod weighting;
