pub mod classification;
pub mod confusion;
pub mod engine;
pub mod scores;

pub use classification::{accuracy, label_metric, ratio, LabelMetric};
pub use confusion::ConfusionMatrix;
pub use engine::{FoldScore, MetricsEngine};
pub use scores::{average_precision, roc_auc};
