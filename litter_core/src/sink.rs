//! Result sinks: where snapshots go when any exposed value changes.

use crate::types::Snapshot;

/// Receives the full current snapshot each time state, baseline, cat weight
/// or waste weight changes.
pub trait ResultSink {
    fn on_state_change(&mut self, snapshot: &Snapshot);
}

/// Discards every snapshot; for callers that poll `snapshot()` instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ResultSink for NullSink {
    fn on_state_change(&mut self, _snapshot: &Snapshot) {}
}

/// Keeps every snapshot in arrival order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink(pub Vec<Snapshot>);

impl RecordingSink {
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.0
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.0.last()
    }
}

impl ResultSink for RecordingSink {
    fn on_state_change(&mut self, snapshot: &Snapshot) {
        self.0.push(*snapshot);
    }
}

impl<F: FnMut(&Snapshot)> ResultSink for F {
    fn on_state_change(&mut self, snapshot: &Snapshot) {
        self(snapshot);
    }
}
