// ── Device domain type ──

use serde::Serialize;

use super::feature::{Capabilities, Feature, FeatureValue};

/// RGB colour with channels in 0.0–1.0, as the gateway stores it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Current status of every feature a device exposes.
///
/// `Some` means the feature is present; the value is the reported status
/// (or the feature's default when the gateway omitted it).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Features {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switchable: Option<bool>,
    /// 0.0–100.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimmable: Option<f64>,
    #[serde(rename = "colorRGB", skip_serializing_if = "Option::is_none")]
    pub color_rgb: Option<Rgb>,
    #[serde(rename = "colorKelvin", skip_serializing_if = "Option::is_none")]
    pub color_kelvin: Option<u16>,
}

impl Features {
    pub fn has(&self, feature: Feature) -> bool {
        self.get(feature).is_some()
    }

    pub fn get(&self, feature: Feature) -> Option<FeatureValue> {
        match feature {
            Feature::Switchable => self.switchable.map(FeatureValue::Switch),
            Feature::Dimmable => self.dimmable.map(FeatureValue::Level),
            Feature::ColorRgb => self.color_rgb.map(FeatureValue::Rgb),
            Feature::ColorKelvin => self.color_kelvin.map(FeatureValue::Kelvin),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::from_features(self)
    }

    /// Adopt every feature `other` has that `self` lacks. Features already
    /// present keep their value.
    pub fn merge_missing(&mut self, other: &Features) {
        self.switchable = self.switchable.or(other.switchable);
        self.dimmable = self.dimmable.or(other.dimmable);
        self.color_rgb = self.color_rgb.or(other.color_rgb);
        self.color_kelvin = self.color_kelvin.or(other.color_kelvin);
    }
}

/// A DALI control gear attached to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub id: u32,
    pub name: String,
    /// Short address on the bus; may differ from `id`.
    pub address: Option<u32>,
    /// Bus line the device hangs off.
    pub line: Option<u32>,
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub groups: Vec<u32>,
    pub features: Features,
}

impl Device {
    pub fn is_on(&self) -> bool {
        self.features.switchable.unwrap_or(false)
    }

    pub fn in_group(&self, group: u32) -> bool {
        self.groups.contains(&group)
    }
}
