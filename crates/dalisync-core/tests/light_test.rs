#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use common::{FakeGateway, config, device, dimmable, switch};
use dalisync_core::{
    ColorMode, Coordinator, CoreError, Device, EntityId, Features, LightView, TurnOn,
};
use dalisync_core::convert::brightness_to_external;

fn lamps() -> Vec<Device> {
    vec![
        device(1, &[5], switch(false)),
        device(2, &[5], dimmable(true, 40.0)),
        device(
            3,
            &[],
            Features {
                switchable: Some(false),
                color_kelvin: Some(3000),
                ..Features::default()
            },
        ),
    ]
}

async fn started(fake: &Arc<FakeGateway>) -> Coordinator {
    let coordinator = Coordinator::new(config(), fake.clone());
    coordinator.start().await.unwrap();
    coordinator
}

// ── Identity ────────────────────────────────────────────────────────

#[tokio::test]
async fn views_exist_for_every_device_and_group() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;

    let views = LightView::all(&coordinator);
    assert_eq!(views.len(), 4);

    let group = LightView::for_group(&coordinator, 5).unwrap();
    assert_eq!(group.unique_id(), "dali2_iot_group_5");
    assert_eq!(group.name(), "DALI Group 5");
    assert_eq!(group.supported_color_modes(), vec![ColorMode::Brightness]);

    let lamp = LightView::for_device(&coordinator, 1).unwrap();
    assert_eq!(lamp.unique_id(), "dali2_iot_1");
    assert_eq!(lamp.state().color_mode, ColorMode::OnOff);
}

#[tokio::test]
async fn missing_entities_are_not_found() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;

    assert!(matches!(
        LightView::for_device(&coordinator, 99),
        Err(CoreError::DeviceNotFound { id: 99 })
    ));
    assert!(matches!(
        LightView::for_group(&coordinator, 8),
        Err(CoreError::GroupNotFound { id: 8 })
    ));
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn device_state_uses_external_scales() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;

    let state = LightView::for_device(&coordinator, 2).unwrap().state();
    assert!(state.available);
    assert!(state.is_on);
    assert_eq!(state.brightness, Some(brightness_to_external(40.0)));
    assert_eq!(state.rgb, None);
}

#[tokio::test]
async fn group_state_follows_its_members() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;

    let state = LightView::for_group(&coordinator, 5).unwrap().state();
    assert!(state.is_on, "one member on means the group is on");
    assert_eq!(state.brightness, Some(brightness_to_external(40.0)));

    let mut off = lamps();
    off[1].features.switchable = Some(false);
    fake.set_devices(off);
    coordinator.request_refresh().await.unwrap();
    assert!(!LightView::for_group(&coordinator, 5).unwrap().state().is_on);
}

#[tokio::test]
async fn vanished_entity_becomes_unavailable() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;
    let view = LightView::for_device(&coordinator, 3).unwrap();

    fake.set_devices(lamps().into_iter().take(2).collect());
    coordinator.request_refresh().await.unwrap();

    assert!(!view.available());
    let state = view.state();
    assert!(!state.available);
    assert!(!state.is_on);
}

// ── Optimistic overlay ──────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn turn_on_shows_immediately_then_falls_back() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;
    let view = LightView::for_device(&coordinator, 1).unwrap();

    view.turn_on(TurnOn::default()).await.unwrap();
    // The gateway never applies the write, so only the overlay says "on".
    assert!(view.state().is_on);
    assert!(view.has_pending_overlay());

    tokio::time::advance(Duration::from_secs(5)).await;
    assert!(!view.state().is_on);

    view.reconcile();
    assert!(!view.has_pending_overlay());
}

#[tokio::test(start_paused = true)]
async fn overlay_only_masks_the_features_it_set() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;
    let view = LightView::for_device(&coordinator, 2).unwrap();

    view.turn_off(None).await.unwrap();
    let state = view.state();
    assert!(!state.is_on);
    assert_eq!(state.brightness, Some(brightness_to_external(40.0)));
}

#[tokio::test]
async fn failed_command_reverts_immediately() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;
    let view = LightView::for_device(&coordinator, 1).unwrap();
    let rx = view.subscribe_state();

    fake.set(&fake.fail_commands, true);
    let err = view.turn_on(TurnOn::default()).await.unwrap_err();
    assert!(err.is_transport());

    assert!(!view.has_pending_overlay());
    assert!(!view.state().is_on);
    assert!(!rx.borrow().is_on);
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn switchable_is_omitted_when_already_on() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;
    let view = LightView::for_device(&coordinator, 2).unwrap();

    view.turn_on(TurnOn {
        brightness: Some(255),
        ..TurnOn::default()
    })
    .await
    .unwrap();

    let sent = &fake.commands()[0];
    assert_eq!(sent.fields.on, None);
    assert!((sent.fields.brightness.unwrap() - 100.0).abs() < 1e-9);
    // The displayed state still says on.
    assert!(view.state().is_on);
    assert_eq!(view.state().brightness, Some(255));
}

#[tokio::test]
async fn switchable_is_sent_when_off_or_alone() {
    let fake = FakeGateway::new(vec![
        device(1, &[], dimmable(false, 10.0)),
        device(2, &[], dimmable(true, 10.0)),
    ]);
    let coordinator = started(&fake).await;

    LightView::for_device(&coordinator, 1)
        .unwrap()
        .turn_on(TurnOn {
            brightness: Some(128),
            ..TurnOn::default()
        })
        .await
        .unwrap();
    LightView::for_device(&coordinator, 2)
        .unwrap()
        .turn_on(TurnOn::default())
        .await
        .unwrap();

    let commands = fake.commands();
    assert_eq!(commands[0].fields.on, Some(true));
    assert!(commands[0].fields.brightness.is_some());
    assert_eq!(commands[1].fields.on, Some(true));
}

#[tokio::test]
async fn group_writes_target_the_group() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;
    let view = LightView::for_group(&coordinator, 5).unwrap();

    view.turn_off(Some(2.0)).await.unwrap();

    let commands = fake.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].target, EntityId::Group(5));
    assert_eq!(commands[0].fields.on, Some(false));
    assert_eq!(commands[0].fade_seconds, Some(2.0));
}

#[tokio::test]
async fn unsupported_and_invalid_requests_send_nothing() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;
    let switch_only = LightView::for_device(&coordinator, 1).unwrap();
    let tunable = LightView::for_device(&coordinator, 3).unwrap();

    let err = switch_only
        .turn_on(TurnOn {
            brightness: Some(10),
            ..TurnOn::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unsupported { .. }));

    let err = tunable
        .turn_on(TurnOn {
            color_temp_kelvin: Some(9000),
            ..TurnOn::default()
        })
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = tunable
        .turn_on(TurnOn {
            transition: Some(61.0),
            ..TurnOn::default()
        })
        .await
        .unwrap_err();
    assert!(err.is_validation());

    assert!(fake.commands().is_empty());
    assert!(!switch_only.has_pending_overlay());
}

// ── Following the coordinator ───────────────────────────────────────

#[tokio::test]
async fn followed_view_republishes_after_refresh() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;
    let view = LightView::for_device(&coordinator, 1).unwrap();
    let mut rx = view.subscribe_state();
    let handle = view.follow();

    let mut on = lamps();
    on[0].features.switchable = Some(true);
    fake.set_devices(on);
    coordinator.request_refresh().await.unwrap();

    rx.changed().await.unwrap();
    assert!(rx.borrow().is_on);

    coordinator.shutdown().await;
    handle.await.unwrap();
}
