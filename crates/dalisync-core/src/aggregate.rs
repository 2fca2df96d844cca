// ── Group aggregation ──
//
// Pure derivation of the group map from a flat device list.

use std::collections::BTreeMap;

use crate::model::{Device, Features, Group, GroupMember};

/// Derive every group referenced by `devices`.
///
/// Members keep device-list order. A group's feature values come from the
/// first member contributing each feature; later members never overwrite
/// them. Groups that end up with no members are not returned.
pub fn aggregate(devices: &[Device]) -> BTreeMap<u32, Group> {
    let mut groups: BTreeMap<u32, Group> = BTreeMap::new();
    // Per group: the common line so far, or `None` once members disagree.
    let mut lines: BTreeMap<u32, Option<Option<u32>>> = BTreeMap::new();

    for device in devices {
        for &group_id in &device.groups {
            let group = groups.entry(group_id).or_insert_with(|| Group {
                id: group_id,
                name: Group::default_name(group_id),
                members: Vec::new(),
                features: Features::default(),
                line: None,
            });

            // A device listing the same group twice is still one member.
            if group.contains_device(device.id) {
                continue;
            }

            group.members.push(GroupMember {
                id: device.address.unwrap_or(device.id),
                device_id: device.id,
                name: device.name.clone(),
                features: device.features.clone(),
            });
            group.features.merge_missing(&device.features);

            lines
                .entry(group_id)
                .and_modify(|common| {
                    if *common != Some(device.line) {
                        *common = None;
                    }
                })
                .or_insert(Some(device.line));
        }
    }

    groups.retain(|_, g| !g.members.is_empty());
    for (id, group) in &mut groups {
        group.line = lines.get(id).copied().flatten().flatten();
    }
    groups
}
