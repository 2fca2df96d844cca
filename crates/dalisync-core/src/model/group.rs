// ── Group domain type ──
//
// Groups are synthetic: derived from the device list on every refresh and
// never fetched or stored on their own.

use serde::Serialize;

use super::device::Features;

/// One device as seen from a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMember {
    /// Bus address of the device, falling back to its gateway id.
    pub id: u32,
    pub device_id: u32,
    pub name: String,
    pub features: Features,
}

/// A DALI group and the devices currently in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub id: u32,
    pub name: String,
    /// In device-list order.
    pub members: Vec<GroupMember>,
    /// Union of member features. Each value comes from the first member
    /// that contributed the feature.
    pub features: Features,
    /// The bus line shared by every member, if they all share one.
    pub line: Option<u32>,
}

impl Group {
    pub fn default_name(id: u32) -> String {
        format!("DALI Group {id}")
    }

    pub fn contains_device(&self, device_id: u32) -> bool {
        self.members.iter().any(|m| m.device_id == device_id)
    }
}
