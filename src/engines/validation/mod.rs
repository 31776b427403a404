pub mod cancel;
pub mod orchestrator;
pub mod progress;
pub mod report;
pub mod state;
pub mod store;
pub mod unit;

pub use cancel::CancellationToken;
pub use orchestrator::{EvaluationOrchestrator, RunOutcome};
pub use progress::{ChannelObserver, LogObserver, RunEvent, RunObserver};
pub use report::{MetricSummary, QualityWarning, QuantileReport, RunReport};
pub use state::RunState;
pub use store::{Keyed, RecordStore};
pub use unit::{FailureKind, UnitFailure, UnitKey, UnitOutcome, UnitStatus};
