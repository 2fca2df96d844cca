// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The
// coordinator's command processor validates each one against the current
// snapshot and routes it to the remote client.

use serde::Serialize;

use crate::error::CoreError;
use crate::model::{EntityId, Feature, FeatureValue, Rgb, ScanProgress};

/// Longest fade the gateway accepts, in seconds.
pub const MAX_FADE_SECONDS: f64 = 60.0;

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

// ── Control fields ───────────────────────────────────────────────────

/// Feature values to apply, in the gateway's internal units. `None`
/// fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ControlFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    /// 0.0–100.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgb: Option<Rgb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_temp_kelvin: Option<u16>,
}

impl ControlFields {
    pub fn is_empty(&self) -> bool {
        self.on.is_none()
            && self.brightness.is_none()
            && self.rgb.is_none()
            && self.color_temp_kelvin.is_none()
    }

    pub fn get(&self, feature: Feature) -> Option<FeatureValue> {
        match feature {
            Feature::Switchable => self.on.map(FeatureValue::Switch),
            Feature::Dimmable => self.brightness.map(FeatureValue::Level),
            Feature::ColorRgb => self.rgb.map(FeatureValue::Rgb),
            Feature::ColorKelvin => self.color_temp_kelvin.map(FeatureValue::Kelvin),
        }
    }
}

// ── Fade time ────────────────────────────────────────────────────────

/// A validated fade time (0.0–60.0 seconds).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FadeTime(f64);

impl FadeTime {
    pub fn new(seconds: f64) -> Result<Self, CoreError> {
        if seconds.is_finite() && (0.0..=MAX_FADE_SECONDS).contains(&seconds) {
            Ok(Self(seconds))
        } else {
            Err(CoreError::validation(format!(
                "fade time must be between 0 and {MAX_FADE_SECONDS} seconds, got {seconds}"
            )))
        }
    }

    pub fn seconds(self) -> f64 {
        self.0
    }
}

// ── Command ──────────────────────────────────────────────────────────

/// All write operations against a gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Apply feature values to a device or group.
    Control {
        target: EntityId,
        fields: ControlFields,
        /// Transition in seconds.
        fade: Option<f64>,
    },
    /// Set the fade time of a device or group.
    SetFadeTime { target: EntityId, seconds: f64 },

    // ── Group membership ─────────────────────────────────────────────
    AddToGroup { device_id: u32, group_id: u32 },
    RemoveFromGroup { device_id: u32, group_id: u32 },
    /// Replace every membership of a device.
    SetDeviceGroups { device_id: u32, groups: Vec<u32> },

    // ── Bus maintenance ──────────────────────────────────────────────
    StartScan { new_installation: bool },
    ScanStatus,
}

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    Ok,
    /// Membership command that changed nothing; no request was sent.
    Unchanged,
    Scan(ScanProgress),
}

/// Collapse duplicate group ids, keeping first-seen order.
pub(crate) fn dedup_groups(groups: &[u32]) -> Vec<u32> {
    let mut out: Vec<u32> = Vec::with_capacity(groups.len());
    for &g in groups {
        if !out.contains(&g) {
            out.push(g);
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fade_time_bounds() {
        assert!(FadeTime::new(0.0).is_ok());
        assert!(FadeTime::new(60.0).is_ok());
        assert!(FadeTime::new(60.01).unwrap_err().is_validation());
        assert!(FadeTime::new(-0.5).is_err());
        assert!(FadeTime::new(f64::NAN).is_err());
    }

    #[test]
    fn duplicate_groups_collapse_in_order() {
        assert_eq!(dedup_groups(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(dedup_groups(&[]).is_empty());
    }

    #[test]
    fn empty_fields() {
        assert!(ControlFields::default().is_empty());
        let fields = ControlFields {
            on: Some(false),
            ..ControlFields::default()
        };
        assert!(!fields.is_empty());
        assert_eq!(fields.get(Feature::Switchable), Some(FeatureValue::Switch(false)));
        assert_eq!(fields.get(Feature::Dimmable), None);
    }
}
