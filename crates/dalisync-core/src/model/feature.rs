// ── Capabilities ──
//
// A device's feature map is reduced once, at view construction, into a
// typed capability set. Reads and writes consult the set instead of
// probing feature names.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use super::device::{Features, Rgb};

/// Lowest colour temperature the capability model accepts.
pub const KELVIN_MIN: u16 = 2000;
/// Highest colour temperature the capability model accepts.
pub const KELVIN_MAX: u16 = 6500;
/// Kelvin reported when the gateway lists `colorKelvin` without a status.
pub const KELVIN_DEFAULT: u16 = 4000;

// ── Feature ─────────────────────────────────────────────────────────

/// A named capability of a device, spelled as the gateway spells it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum Feature {
    #[strum(serialize = "switchable")]
    #[serde(rename = "switchable")]
    Switchable,
    #[strum(serialize = "dimmable")]
    #[serde(rename = "dimmable")]
    Dimmable,
    #[strum(serialize = "colorRGB")]
    #[serde(rename = "colorRGB")]
    ColorRgb,
    #[strum(serialize = "colorKelvin")]
    #[serde(rename = "colorKelvin")]
    ColorKelvin,
}

impl Feature {
    fn bit(self) -> u8 {
        match self {
            Self::Switchable => 0b0001,
            Self::Dimmable => 0b0010,
            Self::ColorRgb => 0b0100,
            Self::ColorKelvin => 0b1000,
        }
    }
}

/// A feature's status value, in the gateway's internal units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// `switchable`: on/off.
    Switch(bool),
    /// `dimmable`: 0.0–100.0.
    Level(f64),
    /// `colorRGB`: channels in 0.0–1.0.
    Rgb(Rgb),
    /// `colorKelvin`.
    Kelvin(u16),
}

// ── Capabilities ────────────────────────────────────────────────────

/// Fixed set of features an entity exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn from_features(features: &Features) -> Self {
        Feature::iter()
            .filter(|f| features.has(*f))
            .fold(Self::empty(), Self::with)
    }

    #[must_use]
    pub fn with(self, feature: Feature) -> Self {
        Self(self.0 | feature.bit())
    }

    pub fn contains(self, feature: Feature) -> bool {
        self.0 & feature.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Feature> {
        Feature::iter().filter(move |f| self.contains(*f))
    }

    /// Colour modes a host may offer for this entity.
    pub fn supported_color_modes(self) -> Vec<ColorMode> {
        let mut modes = Vec::new();
        if self.contains(Feature::Dimmable) {
            modes.push(ColorMode::Brightness);
        }
        if self.contains(Feature::ColorRgb) {
            modes.push(ColorMode::Rgb);
        }
        if self.contains(Feature::ColorKelvin) {
            modes.push(ColorMode::ColorTemp);
        }
        if modes.is_empty() {
            modes.push(ColorMode::OnOff);
        }
        modes
    }

    /// The mode the entity reports, by fixed precedence
    /// Rgb > ColorTemp > Brightness > OnOff.
    pub fn color_mode(self) -> ColorMode {
        if self.contains(Feature::ColorRgb) {
            ColorMode::Rgb
        } else if self.contains(Feature::ColorKelvin) {
            ColorMode::ColorTemp
        } else if self.contains(Feature::Dimmable) {
            ColorMode::Brightness
        } else {
            ColorMode::OnOff
        }
    }

    /// Range check for colour temperature requests.
    pub fn kelvin_in_range(kelvin: u16) -> bool {
        (KELVIN_MIN..=KELVIN_MAX).contains(&kelvin)
    }
}

impl std::fmt::Display for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&'static str> = self.iter().map(<&'static str>::from).collect();
        if names.is_empty() {
            f.write_str("-")
        } else {
            f.write_str(&names.join(","))
        }
    }
}

// ── ColorMode ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ColorMode {
    OnOff,
    Brightness,
    Rgb,
    ColorTemp,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn feature_names_match_gateway_spelling() {
        assert_eq!(Feature::ColorRgb.to_string(), "colorRGB");
        assert_eq!("colorKelvin".parse::<Feature>().unwrap(), Feature::ColorKelvin);
    }

    #[test]
    fn color_mode_precedence() {
        let dim = Capabilities::empty()
            .with(Feature::Switchable)
            .with(Feature::Dimmable);
        assert_eq!(dim.color_mode(), ColorMode::Brightness);
        assert_eq!(dim.with(Feature::ColorKelvin).color_mode(), ColorMode::ColorTemp);
        assert_eq!(
            dim.with(Feature::ColorKelvin).with(Feature::ColorRgb).color_mode(),
            ColorMode::Rgb
        );
        assert_eq!(
            Capabilities::empty().with(Feature::Switchable).color_mode(),
            ColorMode::OnOff
        );
    }

    #[test]
    fn on_off_is_the_only_mode_without_level_or_colour() {
        let caps = Capabilities::empty().with(Feature::Switchable);
        assert_eq!(caps.supported_color_modes(), vec![ColorMode::OnOff]);
    }

    #[test]
    fn capabilities_display_uses_gateway_names() {
        let caps = Capabilities::empty()
            .with(Feature::ColorRgb)
            .with(Feature::Switchable);
        assert_eq!(caps.to_string(), "switchable,colorRGB");
        assert_eq!(Capabilities::empty().to_string(), "-");
    }

    #[test]
    fn kelvin_range_is_inclusive() {
        assert!(Capabilities::kelvin_in_range(KELVIN_MIN));
        assert!(Capabilities::kelvin_in_range(KELVIN_MAX));
        assert!(!Capabilities::kelvin_in_range(1999));
        assert!(!Capabilities::kelvin_in_range(6501));
    }
}
