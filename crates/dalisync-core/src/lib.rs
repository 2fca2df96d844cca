//! State layer between `dalisync-api` and its consumers (CLI, automations).
//!
//! - **[`Coordinator`]**: owns the canonical [`Snapshot`] of one gateway.
//!   [`start()`](Coordinator::start) loads the first snapshot, then spawns
//!   the periodic refresh and the command processor. Concurrent refresh
//!   requests share one in-flight fetch.
//!
//! - **[`SnapshotStream`]**: subscription handle for refresh notifications.
//!   Each [`Notification`] carries the snapshot together with the outcome
//!   of the refresh that produced it.
//!
//! - **[`LightView`]**: one controllable light per device or group. Reads
//!   layer a short-lived [`OptimisticOverlay`] over the snapshot; writes
//!   go through [`Command`]s.
//!
//! - **[`aggregate()`]**: derives groups from device memberships.
//!
//! - **[`RemoteClient`]**: the seam between the coordinator and the
//!   gateway, implemented for `dalisync_api::DaliClient`.

pub mod aggregate;
pub mod command;
pub mod config;
pub mod convert;
pub mod coordinator;
pub mod error;
pub mod light;
pub mod model;
pub mod remote;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use aggregate::aggregate;
pub use command::{Command, CommandResult, ControlFields, FadeTime, MAX_FADE_SECONDS};
pub use config::ControllerConfig;
pub use coordinator::{Coordinator, CoordinatorState};
pub use error::CoreError;
pub use light::{LightState, LightView, OptimisticOverlay, TurnOn};
pub use remote::{ControlRequest, RemoteClient, http_client};
pub use store::{Notification, RefreshOutcome, Snapshot};
pub use stream::{NotificationStream, SnapshotStream};

pub use model::{
    Capabilities, ColorMode, Device, EntityId, Feature, FeatureValue, Features, GatewayInfo,
    Group, GroupMember, ParseEntityIdError, Rgb, ScanProgress,
};
