// ── Entity identity ──
//
// Devices and groups share one integer id space on the gateway, so every
// reference carries its kind explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── EntityId ────────────────────────────────────────────────────────

/// Identifier of a controllable entity: a single device or a DALI group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EntityId {
    Device(u32),
    Group(u32),
}

impl EntityId {
    /// The raw gateway id, without the kind.
    pub fn id(self) -> u32 {
        match self {
            Self::Device(id) | Self::Group(id) => id,
        }
    }

    pub fn is_group(self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// Host-facing unique id: `{prefix}_{id}` or `{prefix}_group_{id}`.
    pub fn unique_id(self, prefix: &str) -> String {
        match self {
            Self::Device(id) => format!("{prefix}_{id}"),
            Self::Group(id) => format!("{prefix}_group_{id}"),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(id) => write!(f, "{id}"),
            Self::Group(id) => write!(f, "group:{id}"),
        }
    }
}

/// Error returned when an entity reference cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entity reference {input:?} (expected e.g. `12`, `device:12` or `group:3`)")]
pub struct ParseEntityIdError {
    input: String,
}

impl FromStr for EntityId {
    type Err = ParseEntityIdError;

    /// Accepts `12`, `d12`, `device:12`, `g3` and `group:3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        let err = || ParseEntityIdError {
            input: trimmed.to_owned(),
        };

        let (ctor, digits): (fn(u32) -> Self, &str) =
            if let Some(rest) = lower.strip_prefix("group:") {
                (Self::Group, rest)
            } else if let Some(rest) = lower.strip_prefix("device:") {
                (Self::Device, rest)
            } else if let Some(rest) = lower.strip_prefix('g') {
                (Self::Group, rest)
            } else if let Some(rest) = lower.strip_prefix('d') {
                (Self::Device, rest)
            } else {
                (Self::Device, lower.as_str())
            };

        digits.parse::<u32>().map(ctor).map_err(|_| err())
    }
}
