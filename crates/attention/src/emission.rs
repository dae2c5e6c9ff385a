//! Emission channel
//!
//! One-way, fire-and-forget publication of snapshots and state records
//! to downstream consumers (persistence, live display). A send with no
//! receivers is not an error; the pipeline never blocks on its
//! consumers.

use crate::types::{MetricsSnapshot, StateRecord};
use tokio::sync::broadcast;

/// Default buffered capacity per channel
pub const DEFAULT_CAPACITY: usize = 256;

/// Broadcast bus for pipeline outputs
#[derive(Debug)]
pub struct EmissionBus {
    snapshots: broadcast::Sender<MetricsSnapshot>,
    states: broadcast::Sender<StateRecord>,
}

impl EmissionBus {
    pub fn new(capacity: usize) -> Self {
        let (snapshots, _) = broadcast::channel(capacity);
        let (states, _) = broadcast::channel(capacity);
        Self { snapshots, states }
    }

    /// Publish a per-frame snapshot (live display consumer)
    pub fn publish_snapshot(&self, snapshot: MetricsSnapshot) {
        let _ = self.snapshots.send(snapshot);
    }

    /// Publish a confirmed state record (persistence consumer)
    pub fn publish_state(&self, record: StateRecord) {
        let _ = self.states.send(record);
    }

    /// Subscribe to per-frame snapshots
    pub fn subscribe_snapshots(&self) -> broadcast::Receiver<MetricsSnapshot> {
        self.snapshots.subscribe()
    }

    /// Subscribe to state records
    pub fn subscribe_states(&self) -> broadcast::Receiver<StateRecord> {
        self.states.subscribe()
    }
}

impl Default for EmissionBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
