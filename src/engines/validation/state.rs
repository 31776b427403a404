use super::progress::RunObserver;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a qualification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Configured,
    Partitioning,
    PartitionFailed,
    Evaluating,
    Aggregating,
    Ranked,
    Done,
    Cancelled,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::PartitionFailed | RunState::Cancelled)
    }

    pub fn can_transition_to(&self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (Configured, Partitioning) => true,
            (Partitioning, PartitionFailed) => true,
            (Partitioning, Evaluating) => true,
            (Evaluating, Aggregating) => true,
            (Aggregating, Ranked) => true,
            (Ranked, Done) => true,
            (current, Cancelled) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Configured => "CONFIGURED",
            RunState::Partitioning => "PARTITIONING",
            RunState::PartitionFailed => "PARTITION_FAILED",
            RunState::Evaluating => "EVALUATING",
            RunState::Aggregating => "AGGREGATING",
            RunState::Ranked => "RANKED",
            RunState::Done => "DONE",
            RunState::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

/// Tracks the current state and the path taken, notifying the observer.
pub(crate) struct StateTracker<'a> {
    current: RunState,
    history: Vec<RunState>,
    observer: &'a dyn RunObserver,
}

impl<'a> StateTracker<'a> {
    pub(crate) fn new(observer: &'a dyn RunObserver) -> Self {
        Self {
            current: RunState::Configured,
            history: vec![RunState::Configured],
            observer,
        }
    }

    pub(crate) fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.current.can_transition_to(next),
            "illegal transition {} -> {}",
            self.current,
            next
        );
        let previous = self.current;
        self.current = next;
        self.history.push(next);
        log::info!("Run state {previous} -> {next}");
        self.observer.on_state_change(previous, next);
    }

    pub(crate) fn current(&self) -> RunState {
        self.current
    }

    pub(crate) fn history(&self) -> &[RunState] {
        &self.history
    }
}
