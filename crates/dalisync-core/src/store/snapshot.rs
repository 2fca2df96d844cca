// ── Canonical snapshot ──
//
// Immutable view of the gateway as of one successful poll: the device list
// and the groups derived from it. Replaced wholesale, never patched.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use crate::aggregate::aggregate;
use crate::model::{Device, EntityId, Group};

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    devices: Vec<Arc<Device>>,
    by_id: HashMap<u32, usize>,
    groups: BTreeMap<u32, Arc<Group>>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// The snapshot before the first successful poll.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from a freshly polled device list, deriving groups.
    pub fn build(devices: Vec<Device>, refreshed_at: DateTime<Utc>) -> Self {
        let groups = aggregate(&devices)
            .into_iter()
            .map(|(id, g)| (id, Arc::new(g)))
            .collect();
        let by_id = devices.iter().enumerate().map(|(i, d)| (d.id, i)).collect();
        Self {
            devices: devices.into_iter().map(Arc::new).collect(),
            by_id,
            groups,
            refreshed_at: Some(refreshed_at),
        }
    }

    pub fn devices(&self) -> &[Arc<Device>] {
        &self.devices
    }

    pub fn groups(&self) -> impl Iterator<Item = &Arc<Group>> {
        self.groups.values()
    }

    /// Point lookup. `None` means "unknown", not "off".
    pub fn device(&self, id: u32) -> Option<&Arc<Device>> {
        self.by_id.get(&id).and_then(|&i| self.devices.get(i))
    }

    /// Point lookup. `None` means "unknown", not "off".
    pub fn group(&self, id: u32) -> Option<&Arc<Group>> {
        self.groups.get(&id)
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        match entity {
            EntityId::Device(id) => self.by_id.contains_key(&id),
            EntityId::Group(id) => self.groups.contains_key(&id),
        }
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// When this data was polled; `None` before the first success.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Age of the data relative to now.
    pub fn data_age(&self) -> Option<TimeDelta> {
        self.refreshed_at.map(|at| Utc::now() - at)
    }
}
