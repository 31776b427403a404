use super::state::RunState;
use super::unit::{UnitOutcome, UnitStatus};
use std::sync::mpsc::Sender;

/// Hook for run progress. Units finish on worker threads, so methods take `&self`.
pub trait RunObserver: Send + Sync {
    fn on_state_change(&self, from: RunState, to: RunState);
    fn on_unit_complete(&self, outcome: &UnitOutcome, completed: usize, total: usize);
}

/// Forwards progress to the `log` facade.
pub struct LogObserver;

impl RunObserver for LogObserver {
    fn on_state_change(&self, _from: RunState, _to: RunState) {}

    fn on_unit_complete(&self, outcome: &UnitOutcome, completed: usize, total: usize) {
        match &outcome.status {
            UnitStatus::Succeeded => log::debug!(
                "Unit {} fold {} done ({completed}/{total})",
                outcome.key.candidate_id,
                outcome.key.fold
            ),
            UnitStatus::Failed(failure) => log::warn!(
                "Unit {} fold {} failed ({:?}): {}",
                outcome.key.candidate_id,
                outcome.key.fold,
                failure.kind,
                failure.reason
            ),
            UnitStatus::Cancelled => log::debug!(
                "Unit {} fold {} cancelled",
                outcome.key.candidate_id,
                outcome.key.fold
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RunEvent {
    StateChanged { from: RunState, to: RunState },
    UnitComplete { outcome: UnitOutcome, completed: usize, total: usize },
}

/// Sends every event through a channel, for a UI or a test to consume.
pub struct ChannelObserver {
    sender: Sender<RunEvent>,
}

impl ChannelObserver {
    pub fn new(sender: Sender<RunEvent>) -> Self {
        Self { sender }
    }
}

impl RunObserver for ChannelObserver {
    fn on_state_change(&self, from: RunState, to: RunState) {
        let _ = self.sender.send(RunEvent::StateChanged { from, to });
    }

    fn on_unit_complete(&self, outcome: &UnitOutcome, completed: usize, total: usize) {
        let _ = self.sender.send(RunEvent::UnitComplete {
            outcome: outcome.clone(),
            completed,
            total,
        });
    }
}
