//! Progress events published by the suite scheduler.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::domain::{BuildSlot, CaseResult, PairResult};

/// Work units completed so far out of the expected total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.completed as f64 * 100.0 / self.total as f64
    }
}

/// One notification in a suite run's event stream.
///
/// Completion events from different (case, build) pairs arrive in no
/// particular order. Exactly one terminal event (`AllDone` or `Cancelled`)
/// closes the stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SuiteEvent {
    SuiteStarting {
        total_work_units: usize,
        builds: Vec<BuildSlot>,
        cases: usize,
    },
    CaseCompleted {
        result: CaseResult,
        progress: Progress,
    },
    BuildSimulationsComplete {
        build: BuildSlot,
    },
    EndProcessingCompleted {
        case_id: String,
        build: BuildSlot,
    },
    DiffCompleted {
        case_id: String,
        progress: Progress,
    },
    Log {
        message: String,
    },
    AllDone {
        pair_results: Vec<PairResult>,
    },
    Cancelled {
        case_results: Vec<CaseResult>,
        pair_results: Vec<PairResult>,
    },
}

impl SuiteEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SuiteEvent::AllDone { .. } | SuiteEvent::Cancelled { .. })
    }
}

/// Non-blocking publisher side of the event stream.
///
/// Backed by an unbounded channel so the scheduler never waits on a slow
/// consumer. A dropped receiver is not an error.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<SuiteEvent>>,
}

impl EventSink {
    pub fn channel() -> (Self, UnboundedReceiver<SuiteEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that discards everything.
    pub fn noop() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: SuiteEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    pub fn log(&self, message: impl Into<String>) {
        self.emit(SuiteEvent::Log {
            message: message.into(),
        });
    }
}
