use super::cancel::CancellationToken;
use crate::types::{CandidateId, FoldId};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// One cell of the evaluation matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitKey {
    pub candidate_id: CandidateId,
    pub fold: FoldId,
    /// Set for quantile-regression units
    pub tau: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ConvergenceFailure,
    PredictFailure,
    Timeout,
    Panicked,
    InvalidOutput,
    DuplicateRecord,
}

/// A `CANDIDATE_FOLD_FAILED` unit with its captured reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitFailure {
    pub candidate_id: CandidateId,
    pub candidate_name: String,
    pub fold: FoldId,
    pub tau: Option<f64>,
    pub kind: FailureKind,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnitStatus {
    Succeeded,
    Failed(UnitFailure),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitOutcome {
    pub key: UnitKey,
    pub status: UnitStatus,
    pub weighting_applied: bool,
}

impl UnitOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, UnitStatus::Succeeded)
    }
}

pub(crate) type WorkError = (FailureKind, String);

pub(crate) enum Bounded<T> {
    Finished(Result<T, WorkError>),
    TimedOut,
    Cancelled,
}

/// Runs `work` on its own thread and waits for it, bounded by `timeout`
/// and interruptible by `cancel`.
///
/// A unit that times out or is cancelled is abandoned, not killed; its
/// eventual result is dropped with the channel and never recorded. `work`
/// receives a unit-local token that is tripped on abandonment, so it can
/// stop between its own stages.
pub(crate) fn run_bounded<T, F>(
    name: String,
    work: F,
    timeout: Option<Duration>,
    poll: Duration,
    cancel: &CancellationToken,
) -> Bounded<T>
where
    T: Send + 'static,
    F: FnOnce(&CancellationToken) -> Result<T, WorkError> + Send + 'static,
{
    if cancel.is_cancelled() {
        return Bounded::Cancelled;
    }

    let abandoned = CancellationToken::new();
    let worker_token = abandoned.clone();
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new().name(name).spawn(move || {
        let result = panic::catch_unwind(AssertUnwindSafe(move || work(&worker_token)));
        let _ = tx.send(result);
    });
    if let Err(e) = spawned {
        return Bounded::Finished(Err((
            FailureKind::Panicked,
            format!("failed to spawn unit worker: {e}"),
        )));
    }

    let started = Instant::now();
    loop {
        if cancel.is_cancelled() {
            abandoned.cancel();
            return Bounded::Cancelled;
        }

        let wait = match timeout {
            Some(limit) => {
                let elapsed = started.elapsed();
                if elapsed >= limit {
                    abandoned.cancel();
                    return Bounded::TimedOut;
                }
                (limit - elapsed).min(poll)
            }
            None => poll,
        };

        match rx.recv_timeout(wait) {
            Ok(Ok(result)) => return Bounded::Finished(result),
            Ok(Err(payload)) => {
                return Bounded::Finished(Err((FailureKind::Panicked, panic_message(payload))))
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                return Bounded::Finished(Err((
                    FailureKind::Panicked,
                    "unit worker exited without a result".to_string(),
                )))
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLL: Duration = Duration::from_millis(5);

    #[test]
    fn test_finished_result_passes_through() {
        let cancel = CancellationToken::new();
        match run_bounded("ok".into(), |_| Ok(7), None, POLL, &cancel) {
            Bounded::Finished(Ok(v)) => assert_eq!(v, 7),
            _ => panic!("expected a finished unit"),
        }
    }

    #[test]
    fn test_timeout_abandons_slow_work() {
        let cancel = CancellationToken::new();
        let slow = |_: &CancellationToken| {
            thread::sleep(Duration::from_millis(500));
            Ok(())
        };
        let started = Instant::now();
        let outcome = run_bounded("slow".into(), slow, Some(Duration::from_millis(30)), POLL, &cancel);
        assert!(matches!(outcome, Bounded::TimedOut));
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn test_panic_is_captured() {
        let cancel = CancellationToken::new();
        let outcome: Bounded<()> = run_bounded("boom".into(), |_| panic!("diverged"), None, POLL, &cancel);
        match outcome {
            Bounded::Finished(Err((FailureKind::Panicked, reason))) => {
                assert!(reason.contains("diverged"))
            }
            _ => panic!("expected a captured panic"),
        }
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = run_bounded("never".into(), |_| Ok(()), None, POLL, &cancel);
        assert!(matches!(outcome, Bounded::Cancelled));
    }

    #[test]
    fn test_abandoned_worker_sees_its_token_tripped() {
        let cancel = CancellationToken::new();
        let (seen_tx, seen_rx) = mpsc::channel();
        let staged = move |unit: &CancellationToken| {
            thread::sleep(Duration::from_millis(100));
            let _ = seen_tx.send(unit.is_cancelled());
            Ok(())
        };

        let outcome = run_bounded("staged".into(), staged, Some(Duration::from_millis(20)), POLL, &cancel);
        assert!(matches!(outcome, Bounded::TimedOut));
        assert_eq!(seen_rx.recv_timeout(Duration::from_secs(2)), Ok(true));
    }

    #[test]
    fn test_run_cancellation_reaches_worker() {
        let cancel = CancellationToken::new();
        let (seen_tx, seen_rx) = mpsc::channel();
        let waits = move |unit: &CancellationToken| {
            while !unit.is_cancelled() {
                thread::sleep(Duration::from_millis(2));
            }
            let _ = seen_tx.send(());
            Ok(())
        };

        let trigger = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            trigger.cancel();
        });
        let outcome = run_bounded("waits".into(), waits, None, POLL, &cancel);
        canceller.join().unwrap();

        assert!(matches!(outcome, Bounded::Cancelled));
        assert!(seen_rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }
}
