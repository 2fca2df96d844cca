// ── Light entity views ──
//
// One view per device or group. Reads merge the view's optimistic overlay
// with the coordinator's snapshot feature by feature; writes go through the
// coordinator's command queue.

mod overlay;

use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub use overlay::OptimisticOverlay;

use crate::command::{Command, ControlFields, FadeTime};
use crate::convert::{
    brightness_to_external, brightness_to_internal, rgb_to_external, rgb_to_internal, to_u8,
};
use crate::coordinator::Coordinator;
use crate::error::CoreError;
use crate::model::{
    Capabilities, ColorMode, EntityId, Feature, FeatureValue, Features, Group, KELVIN_MAX,
    KELVIN_MIN,
};
use crate::store::Snapshot;

// ── State ────────────────────────────────────────────────────────────

/// What a host should display for a light.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LightState {
    /// The entity exists in the current snapshot.
    pub available: bool,
    pub is_on: bool,
    /// 0–255.
    pub brightness: Option<u8>,
    /// 0–255 per channel.
    pub rgb: Option<[u8; 3]>,
    pub color_temp_kelvin: Option<u16>,
    pub color_mode: ColorMode,
}

/// A turn-on request in external units. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOn {
    /// 0–255.
    pub brightness: Option<u8>,
    pub rgb: Option<[u8; 3]>,
    pub color_temp_kelvin: Option<u16>,
    /// Fade time in seconds.
    pub transition: Option<f64>,
}

/// Values derived from the snapshot alone.
#[derive(Debug, Clone, Default, PartialEq)]
struct Canonical {
    is_on: bool,
    brightness: Option<u8>,
    rgb: Option<[u8; 3]>,
    color_temp_kelvin: Option<u16>,
}

fn device_state(features: &Features) -> Canonical {
    Canonical {
        is_on: features.switchable.unwrap_or(false),
        brightness: features.dimmable.map(brightness_to_external),
        rgb: features.color_rgb.map(rgb_to_external),
        color_temp_kelvin: features.color_kelvin,
    }
}

/// Group state from its members: on if any member is on, brightness is
/// the mean over every dimmable member (on or off), colours come from the
/// first member that has them.
fn group_state(group: &Group) -> Canonical {
    let members = || group.members.iter().map(|m| &m.features);

    let (sum, count) = members()
        .filter_map(|f| f.dimmable)
        .map(|level| f64::from(brightness_to_external(level)))
        .fold((0.0, 0.0), |(sum, count), level| (sum + level, count + 1.0));
    let brightness = (count > 0.0).then(|| to_u8(sum / count));

    Canonical {
        is_on: members().any(|f| f.switchable == Some(true)),
        brightness,
        rgb: members().find_map(|f| f.color_rgb).map(rgb_to_external),
        color_temp_kelvin: members().find_map(|f| f.color_kelvin),
    }
}

fn canonical(snapshot: &Snapshot, entity: EntityId) -> Option<Canonical> {
    match entity {
        EntityId::Device(id) => snapshot.device(id).map(|d| device_state(&d.features)),
        EntityId::Group(id) => snapshot.group(id).map(|g| group_state(g.as_ref())),
    }
}

// ── LightView ────────────────────────────────────────────────────────

/// A controllable light backed by one device or one group.
///
/// Cheaply cloneable; clones share the overlay and the state channel.
#[derive(Clone)]
pub struct LightView {
    inner: Arc<LightInner>,
}

struct LightInner {
    entity: EntityId,
    name: String,
    unique_id: String,
    capabilities: Capabilities,
    coordinator: Coordinator,
    overlay: StdMutex<OptimisticOverlay>,
    state: watch::Sender<LightState>,
}

impl LightView {
    /// View for `entity`, which must exist in the current snapshot.
    /// Capabilities are fixed from the snapshot at this point.
    pub fn new(coordinator: &Coordinator, entity: EntityId) -> Result<Self, CoreError> {
        let snapshot = coordinator.snapshot();
        let (name, features) = match entity {
            EntityId::Device(id) => snapshot
                .device(id)
                .map(|d| (d.name.clone(), d.features.clone()))
                .ok_or(CoreError::DeviceNotFound { id })?,
            EntityId::Group(id) => snapshot
                .group(id)
                .map(|g| (g.name.clone(), g.features.clone()))
                .ok_or(CoreError::GroupNotFound { id })?,
        };
        let capabilities = features.capabilities();
        let config = coordinator.config();

        let view = Self {
            inner: Arc::new(LightInner {
                entity,
                name,
                unique_id: entity.unique_id(&config.unique_id_prefix),
                capabilities,
                coordinator: coordinator.clone(),
                overlay: StdMutex::new(OptimisticOverlay::new(config.overlay_window)),
                state: watch::channel(LightState {
                    available: false,
                    is_on: false,
                    brightness: None,
                    rgb: None,
                    color_temp_kelvin: None,
                    color_mode: capabilities.color_mode(),
                })
                .0,
            }),
        };
        view.publish();
        Ok(view)
    }

    pub fn for_device(coordinator: &Coordinator, id: u32) -> Result<Self, CoreError> {
        Self::new(coordinator, EntityId::Device(id))
    }

    pub fn for_group(coordinator: &Coordinator, id: u32) -> Result<Self, CoreError> {
        Self::new(coordinator, EntityId::Group(id))
    }

    /// One view per device and per group in the current snapshot.
    pub fn all(coordinator: &Coordinator) -> Vec<Self> {
        let snapshot = coordinator.snapshot();
        let ids = snapshot
            .devices()
            .iter()
            .map(|d| EntityId::Device(d.id))
            .chain(snapshot.groups().map(|g| EntityId::Group(g.id)));
        ids.filter_map(|id| Self::new(coordinator, id).ok()).collect()
    }

    // ── Identity ─────────────────────────────────────────────────

    pub fn entity(&self) -> EntityId {
        self.inner.entity
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn unique_id(&self) -> &str {
        &self.inner.unique_id
    }

    pub fn capabilities(&self) -> Capabilities {
        self.inner.capabilities
    }

    pub fn supported_color_modes(&self) -> Vec<ColorMode> {
        self.inner.capabilities.supported_color_modes()
    }

    // ── Reads ────────────────────────────────────────────────────

    pub fn available(&self) -> bool {
        self.inner.coordinator.snapshot().contains(self.inner.entity)
    }

    /// Displayed state right now: overlay first, then the snapshot, then
    /// "off / unknown".
    pub fn state(&self) -> LightState {
        let snapshot = self.inner.coordinator.snapshot();
        let base = canonical(&snapshot, self.inner.entity);
        let available = base.is_some();
        let base = base.unwrap_or_default();
        let overlay = self.overlay();

        let is_on = match overlay.read(Feature::Switchable) {
            Some(FeatureValue::Switch(on)) => on,
            _ => base.is_on,
        };
        let brightness = match overlay.read(Feature::Dimmable) {
            Some(FeatureValue::Level(level)) => Some(brightness_to_external(level)),
            _ => base.brightness,
        };
        let rgb = match overlay.read(Feature::ColorRgb) {
            Some(FeatureValue::Rgb(rgb)) => Some(rgb_to_external(rgb)),
            _ => base.rgb,
        };
        let color_temp_kelvin = match overlay.read(Feature::ColorKelvin) {
            Some(FeatureValue::Kelvin(k)) => Some(k),
            _ => base.color_temp_kelvin,
        };

        LightState {
            available,
            is_on,
            brightness,
            rgb,
            color_temp_kelvin,
            color_mode: self.inner.capabilities.color_mode(),
        }
    }

    /// Receiver that sees every change of the displayed state.
    pub fn subscribe_state(&self) -> watch::Receiver<LightState> {
        self.inner.state.subscribe()
    }

    /// Whether an unexpired optimistic entry is masking the snapshot.
    pub fn has_pending_overlay(&self) -> bool {
        self.overlay().is_valid()
    }

    /// Re-derive state after the coordinator published: drop an expired
    /// overlay, then republish.
    pub fn reconcile(&self) {
        if self.overlay().clear_if_expired() {
            debug!(entity = %self.inner.entity, "optimistic state expired");
        }
        self.publish();
    }

    /// Spawn a task that calls [`reconcile()`](Self::reconcile) on every
    /// coordinator notification. Ends when the coordinator shuts down.
    pub fn follow(&self) -> JoinHandle<()> {
        let view = self.clone();
        let mut stream = self.inner.coordinator.subscribe();
        let cancel = self.inner.coordinator.cancel_token();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    n = stream.changed() => {
                        if n.is_none() {
                            break;
                        }
                        view.reconcile();
                    }
                }
            }
        })
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Turn on, optionally changing level or colour.
    ///
    /// If the light already shows as on and the request changes something
    /// else, the command omits `switchable`.
    pub async fn turn_on(&self, request: TurnOn) -> Result<(), CoreError> {
        let fade = request.transition.map(FadeTime::new).transpose()?;
        self.check_supported(&request)?;

        let intent = ControlFields {
            on: Some(true),
            brightness: request.brightness.map(brightness_to_internal),
            rgb: request.rgb.map(rgb_to_internal),
            color_temp_kelvin: request.color_temp_kelvin,
        };

        let mut payload = intent.clone();
        let changes_more_than_power = payload.brightness.is_some()
            || payload.rgb.is_some()
            || payload.color_temp_kelvin.is_some();
        if changes_more_than_power && self.state().is_on {
            payload.on = None;
        }

        self.dispatch(intent, payload, fade).await
    }

    pub async fn turn_off(&self, transition: Option<f64>) -> Result<(), CoreError> {
        let fade = transition.map(FadeTime::new).transpose()?;
        let fields = ControlFields {
            on: Some(false),
            ..ControlFields::default()
        };
        self.dispatch(fields.clone(), fields, fade).await
    }

    /// Overlay `intent`, send `payload`, and on failure revert to the
    /// snapshot immediately.
    async fn dispatch(
        &self,
        intent: ControlFields,
        payload: ControlFields,
        fade: Option<FadeTime>,
    ) -> Result<(), CoreError> {
        self.overlay().write(intent);
        self.publish();

        let result = self
            .inner
            .coordinator
            .execute(Command::Control {
                target: self.inner.entity,
                fields: payload,
                fade: fade.map(FadeTime::seconds),
            })
            .await;

        match result {
            Ok(_) => {
                self.publish();
                Ok(())
            }
            Err(e) => {
                warn!(entity = %self.inner.entity, error = %e, "command failed, reverting");
                self.overlay().clear();
                self.publish();
                Err(e)
            }
        }
    }

    fn check_supported(&self, request: &TurnOn) -> Result<(), CoreError> {
        let caps = self.inner.capabilities;
        let unsupported = |operation: &str| CoreError::Unsupported {
            entity: self.inner.entity.to_string(),
            operation: operation.to_owned(),
        };

        if request.brightness.is_some() && !caps.contains(Feature::Dimmable) {
            return Err(unsupported("brightness"));
        }
        if request.rgb.is_some() && !caps.contains(Feature::ColorRgb) {
            return Err(unsupported("RGB colour"));
        }
        if let Some(kelvin) = request.color_temp_kelvin {
            if !caps.contains(Feature::ColorKelvin) {
                return Err(unsupported("colour temperature"));
            }
            if !Capabilities::kelvin_in_range(kelvin) {
                return Err(CoreError::validation(format!(
                    "colour temperature {kelvin}K is outside {KELVIN_MIN}K–{KELVIN_MAX}K"
                )));
            }
        }
        Ok(())
    }

    // ── Helpers ──────────────────────────────────────────────────

    fn overlay(&self) -> MutexGuard<'_, OptimisticOverlay> {
        self.inner.overlay.lock().expect("overlay lock poisoned")
    }

    fn publish(&self) {
        let state = self.state();
        self.inner.state.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{GroupMember, Rgb};

    fn member(id: u32, features: Features) -> GroupMember {
        GroupMember {
            id,
            device_id: id,
            name: format!("m{id}"),
            features,
        }
    }

    fn group(members: Vec<GroupMember>) -> Group {
        Group {
            id: 1,
            name: Group::default_name(1),
            members,
            features: Features::default(),
            line: None,
        }
    }

    fn switch(on: bool) -> Features {
        Features {
            switchable: Some(on),
            ..Features::default()
        }
    }

    #[test]
    fn group_is_on_if_any_member_is_on() {
        let g = group(vec![member(1, switch(false)), member(2, switch(false)), member(3, switch(true))]);
        assert!(group_state(&g).is_on);

        let g = group(vec![member(1, switch(false)), member(2, switch(false))]);
        assert!(!group_state(&g).is_on);
    }

    #[test]
    fn group_brightness_averages_dimmable_members() {
        let dim = |level| Features {
            switchable: Some(true),
            dimmable: Some(level),
            ..Features::default()
        };
        let g = group(vec![member(1, dim(50.0)), member(2, dim(100.0)), member(3, switch(true))]);

        let got = i32::from(group_state(&g).brightness.unwrap_or_default());
        let want = i32::from(brightness_to_external(75.0));
        assert!((got - want).abs() <= 1, "got {got}, want {want}");
    }

    #[test]
    fn group_brightness_counts_off_members() {
        let dim = |on, level| Features {
            switchable: Some(on),
            dimmable: Some(level),
            ..Features::default()
        };
        let g = group(vec![member(1, dim(false, 0.0)), member(2, dim(true, 100.0))]);
        assert_eq!(group_state(&g).brightness, Some(128));
    }

    #[test]
    fn group_without_dimmable_members_has_no_brightness() {
        let g = group(vec![member(1, switch(true))]);
        assert_eq!(group_state(&g).brightness, None);
    }

    #[test]
    fn group_colour_comes_from_first_member_with_it() {
        let coloured = |r, kelvin| Features {
            color_rgb: Some(Rgb { r, g: 0.0, b: 0.0 }),
            color_kelvin: Some(kelvin),
            ..Features::default()
        };
        let g = group(vec![
            member(1, switch(true)),
            member(2, coloured(1.0, 2700)),
            member(3, coloured(0.2, 6500)),
        ]);

        let state = group_state(&g);
        assert_eq!(state.rgb, Some([255, 0, 0]));
        assert_eq!(state.color_temp_kelvin, Some(2700));
    }
}
