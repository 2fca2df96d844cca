// ── Optimistic overlay ──
//
// Short-lived local state that masks the polled snapshot right after a
// command, until the gateway's own state catches up or the window closes.

use std::time::Duration;

use tokio::time::Instant;

use crate::command::ControlFields;
use crate::model::{Feature, FeatureValue};

#[derive(Debug, Clone)]
struct OverlayEntry {
    fields: ControlFields,
    written_at: Instant,
}

/// Per-entity overlay: at most one entry, replaced by every new write.
#[derive(Debug, Clone)]
pub struct OptimisticOverlay {
    window: Duration,
    entry: Option<OverlayEntry>,
}

impl OptimisticOverlay {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entry: None,
        }
    }

    /// Record `fields` as the intended state, replacing any prior entry.
    pub fn write(&mut self, fields: ControlFields) {
        self.entry = Some(OverlayEntry {
            fields,
            written_at: Instant::now(),
        });
    }

    /// An entry exists and was written less than one window ago.
    pub fn is_valid(&self) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|e| e.written_at.elapsed() < self.window)
    }

    /// The overlaid value of `feature`, if the entry is valid and set it.
    pub fn read(&self, feature: Feature) -> Option<FeatureValue> {
        if !self.is_valid() {
            return None;
        }
        self.entry.as_ref().and_then(|e| e.fields.get(feature))
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }

    /// Drop the entry if its window has passed. Returns whether it did.
    pub fn clear_if_expired(&mut self) -> bool {
        if self.entry.is_some() && !self.is_valid() {
            self.entry = None;
            true
        } else {
            false
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}
