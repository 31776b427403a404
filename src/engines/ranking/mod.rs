pub mod aggregator;
pub mod ranker;

pub use aggregator::{
    aggregate, mean_std, Annotation, Applicability, CandidateMetrics, MetricResult,
};
pub use ranker::{Ranker, RankingEntry, RedFlag};
