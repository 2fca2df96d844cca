// ── API-to-domain conversions ──
//
// Bridges raw `dalisync_api` wire types into `dalisync_core::model` types,
// fills the gateway's implicit defaults, and maps between the gateway's
// internal scales and the externally exposed 0–255 scales.

use dalisync_api::models::{
    ControlPayload, GatewayInfo as RawGatewayInfo, RawDevice, RawFeatures, RgbStatus,
    ScanStatus,
};

use crate::command::ControlFields;
use crate::model::{Device, Features, GatewayInfo, KELVIN_DEFAULT, Rgb, ScanProgress};

// ── Scales ─────────────────────────────────────────────────────────

const BRIGHTNESS_MAX: f64 = 255.0;
const LEVEL_MAX: f64 = 100.0;
const RGB_FACTOR: f64 = 255.0;

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
pub(crate) fn to_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Internal level (0.0–100.0) to external brightness (0–255).
pub fn brightness_to_external(level: f64) -> u8 {
    // Multiply before dividing: `level * 2.55` lands just below the .5 mark.
    to_u8(level * BRIGHTNESS_MAX / LEVEL_MAX)
}

/// External brightness (0–255) to internal level (0.0–100.0).
pub fn brightness_to_internal(brightness: u8) -> f64 {
    f64::from(brightness) * LEVEL_MAX / BRIGHTNESS_MAX
}

/// Internal colour (0.0–1.0 channels) to an external 0–255 triple.
pub fn rgb_to_external(rgb: Rgb) -> [u8; 3] {
    [
        to_u8(rgb.r * RGB_FACTOR),
        to_u8(rgb.g * RGB_FACTOR),
        to_u8(rgb.b * RGB_FACTOR),
    ]
}

/// External 0–255 triple to internal colour.
pub fn rgb_to_internal([r, g, b]: [u8; 3]) -> Rgb {
    Rgb {
        r: f64::from(r) / RGB_FACTOR,
        g: f64::from(g) / RGB_FACTOR,
        b: f64::from(b) / RGB_FACTOR,
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
fn kelvin_from_wire(kelvin: f64) -> u16 {
    kelvin.round().clamp(0.0, f64::from(u16::MAX)) as u16
}

// ── Device ─────────────────────────────────────────────────────────

impl From<RawFeatures> for Features {
    fn from(raw: RawFeatures) -> Self {
        Self {
            switchable: raw.switchable.map(|f| f.status.unwrap_or(false)),
            dimmable: raw.dimmable.map(|f| f.status.unwrap_or(0.0)),
            color_rgb: raw.color_rgb.map(|f| {
                f.status.map_or_else(Rgb::default, |c| Rgb {
                    r: c.r,
                    g: c.g,
                    b: c.b,
                })
            }),
            color_kelvin: raw
                .color_kelvin
                .map(|f| f.status.map_or(KELVIN_DEFAULT, kelvin_from_wire)),
        }
    }
}

impl From<RawDevice> for Device {
    fn from(raw: RawDevice) -> Self {
        let id = raw.id;
        Self {
            id,
            name: raw.name.unwrap_or_else(|| format!("DALI Device {id}")),
            address: raw.address,
            line: raw.line,
            device_type: raw.device_type,
            groups: raw.groups,
            features: raw.features.into(),
        }
    }
}

// ── Commands ───────────────────────────────────────────────────────

/// Build the wire payload for a control command. Absent fields stay
/// absent.
pub(crate) fn control_payload(fields: &ControlFields, fade_seconds: Option<f64>) -> ControlPayload {
    ControlPayload {
        switchable: fields.on,
        dimmable: fields.brightness,
        color_rgb: fields.rgb.map(|c| RgbStatus {
            r: c.r,
            g: c.g,
            b: c.b,
        }),
        color_kelvin: fields.color_temp_kelvin,
        fade_time: fade_seconds,
    }
}

// ── Misc ───────────────────────────────────────────────────────────

impl From<ScanStatus> for ScanProgress {
    fn from(raw: ScanStatus) -> Self {
        Self {
            status: raw.status,
            progress: raw.progress,
            found: raw.found,
        }
    }
}

impl From<RawGatewayInfo> for GatewayInfo {
    fn from(raw: RawGatewayInfo) -> Self {
        Self {
            name: raw.name,
            version: raw.version,
            extra: raw.extra,
        }
    }
}
