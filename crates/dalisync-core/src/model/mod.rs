// ── Domain model ──
//
// Canonical types the rest of the crate (and its consumers) work with.
// Wire types from `dalisync-api` are converted into these in `convert`.

pub mod device;
pub mod entity_id;
pub mod feature;
pub mod group;

pub use device::{Device, Features, Rgb};
pub use entity_id::{EntityId, ParseEntityIdError};
pub use feature::{
    Capabilities, ColorMode, Feature, FeatureValue, KELVIN_DEFAULT, KELVIN_MAX, KELVIN_MIN,
};
pub use group::{Group, GroupMember};

use serde::Serialize;

/// Progress of a bus scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanProgress {
    pub status: Option<String>,
    /// 0.0–100.0.
    pub progress: Option<f64>,
    pub found: Option<u32>,
}

/// Identity of the gateway itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GatewayInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    /// Everything else `/info` reported.
    pub extra: serde_json::Map<String, serde_json::Value>,
}
