pub mod traits;
pub mod partition;
pub mod metrics;
pub mod quantile;
pub mod ranking;
pub mod execution;
pub mod manager;

pub use manager::{ConfigManager, RunConfig};
pub use partition::{PartitionConfig, PartitionStrategy};
pub use metrics::{Average, MetricKind, MetricsConfig, ZeroDivision};
pub use quantile::{HighValueThreshold, QuantileConfig};
pub use ranking::{RankingConfig, RedFlagThresholds};
pub use execution::ExecutionConfig;
pub use traits::ConfigSection;
