// ── Snapshot store ──
//
// Single-writer storage for the canonical snapshot with push-based change
// notification. The snapshot and the outcome that produced it travel in
// one `watch` value, so a subscriber woken by a notification always sees
// the data that notification announced.

mod snapshot;

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;

pub use snapshot::Snapshot;

use crate::model::Device;

/// What the most recent refresh attempt produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// Nothing has been fetched yet.
    Initial,
    /// A fresh snapshot was published.
    Refreshed,
    /// The fetch failed; the previous snapshot is still being served.
    Failed {
        message: String,
        consecutive_failures: u32,
    },
}

/// One published state of the store.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Bumped on every publication, success or failure.
    pub seq: u64,
    pub snapshot: Arc<Snapshot>,
    pub outcome: RefreshOutcome,
}

pub(crate) struct SnapshotStore {
    tx: watch::Sender<Notification>,
}

impl SnapshotStore {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(Notification {
            seq: 0,
            snapshot: Arc::new(Snapshot::empty()),
            outcome: RefreshOutcome::Initial,
        });
        Self { tx }
    }

    /// Replace the snapshot with one built from `devices` and notify.
    pub(crate) fn publish(&self, devices: Vec<Device>) -> Arc<Snapshot> {
        let snapshot = Arc::new(Snapshot::build(devices, Utc::now()));
        // `send_modify` updates unconditionally, even with zero receivers.
        self.tx.send_modify(|n| {
            n.seq += 1;
            n.snapshot = Arc::clone(&snapshot);
            n.outcome = RefreshOutcome::Refreshed;
        });
        snapshot
    }

    /// Keep the current snapshot but announce a failed refresh.
    pub(crate) fn publish_failure(&self, message: String) -> u32 {
        let mut failures = 0;
        self.tx.send_modify(|n| {
            failures = match &n.outcome {
                RefreshOutcome::Failed {
                    consecutive_failures,
                    ..
                } => consecutive_failures + 1,
                _ => 1,
            };
            n.seq += 1;
            n.outcome = RefreshOutcome::Failed {
                message,
                consecutive_failures: failures,
            };
        });
        failures
    }

    pub(crate) fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.tx.borrow().snapshot)
    }

    pub(crate) fn latest(&self) -> Notification {
        self.tx.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Notification> {
        self.tx.subscribe()
    }
}
