// Wire types for the gateway HTTP API.
//
// These mirror the JSON the gateway emits and accepts. Field names follow
// the gateway (camelCase); `dalisync-core` converts them into domain types.

use serde::{Deserialize, Serialize};

/// Response envelope of `GET /devices`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceList {
    #[serde(default)]
    pub devices: Vec<RawDevice>,
}

/// A single DALI control gear as reported by the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawDevice {
    pub id: u32,
    #[serde(default)]
    pub name: Option<String>,
    /// Short address on the DALI bus. May differ from `id`.
    #[serde(default)]
    pub address: Option<u32>,
    /// Bus line the device is attached to.
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(rename = "type", default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub groups: Vec<u32>,
    #[serde(default)]
    pub features: RawFeatures,
}

/// Capability map of a device. Features the gateway reports but this
/// client does not model are ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawFeatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switchable: Option<FeatureStatus<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimmable: Option<FeatureStatus<f64>>,
    #[serde(rename = "colorRGB", default, skip_serializing_if = "Option::is_none")]
    pub color_rgb: Option<FeatureStatus<RgbStatus>>,
    #[serde(rename = "colorKelvin", default, skip_serializing_if = "Option::is_none")]
    pub color_kelvin: Option<FeatureStatus<f64>>,
}

/// `{ "status": ... }` wrapper used for every feature.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureStatus<T> {
    #[serde(default = "Option::default")]
    pub status: Option<T>,
}

/// RGB channels in the 0.0–1.0 range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct RgbStatus {
    #[serde(default)]
    pub r: f64,
    #[serde(default)]
    pub g: f64,
    #[serde(default)]
    pub b: f64,
}

/// Body of `POST /device/{id}/control` and `POST /group/{id}/control`.
///
/// Only the fields that are set are serialized, so a command never
/// re-asserts state it does not intend to change.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ControlPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switchable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimmable: Option<f64>,
    #[serde(rename = "colorRGB", default, skip_serializing_if = "Option::is_none")]
    pub color_rgb: Option<RgbStatus>,
    #[serde(rename = "colorKelvin", default, skip_serializing_if = "Option::is_none")]
    pub color_kelvin: Option<u16>,
    #[serde(rename = "fadeTime", default, skip_serializing_if = "Option::is_none")]
    pub fade_time: Option<f64>,
}

/// Body of `PUT /device/{id}` when changing group membership.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceGroupsUpdate<'a> {
    pub groups: &'a [u32],
}

/// Body of `POST /dali/scan`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub new_installation: bool,
}

/// Progress report of a bus scan (`GET /dali/scan`, `POST /dali/scan`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScanStatus {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub found: Option<u32>,
}

/// Gateway identity (`GET /info`). Only the commonly present fields are
/// typed; everything else is kept verbatim.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GatewayInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn control_payload_omits_unset_fields() {
        let payload = ControlPayload {
            dimmable: Some(50.0),
            ..ControlPayload::default()
        };
        assert_eq!(serde_json::to_value(&payload).unwrap(), json!({ "dimmable": 50.0 }));
    }

    #[test]
    fn control_payload_uses_gateway_field_names() {
        let payload = ControlPayload {
            switchable: Some(true),
            color_rgb: Some(RgbStatus { r: 1.0, g: 0.0, b: 0.5 }),
            color_kelvin: Some(3000),
            fade_time: Some(1.5),
            ..ControlPayload::default()
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "switchable": true,
                "colorRGB": { "r": 1.0, "g": 0.0, "b": 0.5 },
                "colorKelvin": 3000,
                "fadeTime": 1.5
            })
        );
    }

    #[test]
    fn raw_device_tolerates_missing_optional_fields() {
        let device: RawDevice = serde_json::from_value(json!({
            "id": 4,
            "features": {
                "switchable": {},
                "dimmable": { "status": 12.5 },
                "somethingElse": { "status": 1 }
            }
        }))
        .unwrap();

        assert_eq!(device.id, 4);
        assert!(device.name.is_none());
        assert!(device.groups.is_empty());
        assert!(device.features.switchable.unwrap().status.is_none());
        assert_eq!(device.features.dimmable.unwrap().status, Some(12.5));
        assert!(device.features.color_rgb.is_none());
    }
}
