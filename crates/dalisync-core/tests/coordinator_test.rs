#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use common::{FakeGateway, config, device, dimmable, switch};
use dalisync_core::{
    Command, CommandResult, ControlFields, Coordinator, CoordinatorState, CoreError, EntityId,
    RefreshOutcome,
};

fn lamps() -> Vec<dalisync_core::Device> {
    vec![
        device(1, &[5], switch(false)),
        device(2, &[5, 6], dimmable(true, 40.0)),
        device(3, &[], switch(true)),
    ]
}

async fn started(fake: &Arc<FakeGateway>) -> Coordinator {
    let coordinator = Coordinator::new(config(), fake.clone());
    coordinator.start().await.unwrap();
    coordinator
}

fn on() -> ControlFields {
    ControlFields {
        on: Some(true),
        ..ControlFields::default()
    }
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn start_loads_devices_and_derives_groups() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;

    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.device_count(), 3);
    assert_eq!(snapshot.group_count(), 2);
    assert_eq!(coordinator.group(5).unwrap().members.len(), 2);
    assert_eq!(coordinator.group(6).unwrap().members.len(), 1);
    assert_eq!(*coordinator.state().borrow(), CoordinatorState::Running);
    assert_eq!(coordinator.latest().outcome, RefreshOutcome::Refreshed);
}

#[tokio::test]
async fn start_without_observers_accepts_commands() {
    let fake = FakeGateway::new(lamps());
    let coordinator = Coordinator::new(config(), fake.clone());
    coordinator.start().await.unwrap();

    coordinator
        .execute(Command::Control {
            target: EntityId::Device(1),
            fields: on(),
            fade: None,
        })
        .await
        .unwrap();
    assert_eq!(fake.commands().len(), 1);
    assert_eq!(*coordinator.state().borrow(), CoordinatorState::Running);
}

#[tokio::test]
async fn concurrent_starts_load_once() {
    let fake = FakeGateway::new(lamps());
    let coordinator = Coordinator::new(config(), fake.clone());

    let (a, b) = tokio::join!(coordinator.start(), coordinator.start());
    a.unwrap();
    b.unwrap();
    assert_eq!(fake.fetch_count(), 1);
    assert_eq!(*coordinator.state().borrow(), CoordinatorState::Running);
}

#[tokio::test]
async fn failed_initial_refresh_leaves_coordinator_idle() {
    let fake = FakeGateway::new(lamps());
    fake.set(&fake.fail_fetch, true);
    let coordinator = Coordinator::new(config(), fake.clone());

    let err = coordinator.start().await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(*coordinator.state().borrow(), CoordinatorState::Idle);

    fake.set(&fake.fail_fetch, false);
    coordinator.start().await.unwrap();
    assert_eq!(*coordinator.state().borrow(), CoordinatorState::Running);
}

#[tokio::test]
async fn commands_are_refused_unless_running() {
    let fake = FakeGateway::new(lamps());
    let coordinator = Coordinator::new(config(), fake.clone());

    let cmd = Command::ScanStatus;
    assert!(matches!(
        coordinator.execute(cmd.clone()).await,
        Err(CoreError::CoordinatorStopped)
    ));

    coordinator.start().await.unwrap();
    coordinator.execute(cmd.clone()).await.unwrap();

    coordinator.shutdown().await;
    assert!(matches!(
        coordinator.execute(cmd).await,
        Err(CoreError::CoordinatorStopped)
    ));
    assert!(matches!(
        coordinator.start().await,
        Err(CoreError::CoordinatorStopped)
    ));
}

#[tokio::test]
async fn oneshot_runs_closure_then_stops() {
    let fake = FakeGateway::new(lamps());
    let count = Coordinator::oneshot(config(), fake.clone(), |c| async move {
        Ok(c.snapshot().device_count())
    })
    .await
    .unwrap();

    assert_eq!(count, 3);
    assert_eq!(fake.fetch_count(), 1);
}

// ── Refresh ─────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_refresh_requests_share_one_fetch() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;
    assert_eq!(fake.fetch_count(), 1);

    fake.set(&fake.hold_fetch, true);
    // A second, uncollapsed fetch would wait for a release that never comes.
    let (a, b, ()) = tokio::time::timeout(
        Duration::from_secs(5),
        async {
            tokio::join!(
                coordinator.request_refresh(),
                coordinator.request_refresh(),
                async {
                    while fake.fetch_count() < 2 {
                        tokio::task::yield_now().await;
                    }
                    fake.release.notify_one();
                }
            )
        },
    )
    .await
    .expect("refresh requests were not collapsed");

    a.unwrap();
    b.unwrap();
    assert_eq!(fake.fetch_count(), 2);
}

#[tokio::test]
async fn refresh_after_completion_fetches_again() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;

    coordinator.request_refresh().await.unwrap();
    coordinator.request_refresh().await.unwrap();
    assert_eq!(fake.fetch_count(), 3);
}

#[tokio::test]
async fn failed_refresh_keeps_last_snapshot() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;
    let mut stream = coordinator.subscribe();
    let seq = stream.current().seq;

    fake.set(&fake.fail_fetch, true);
    assert!(coordinator.request_refresh().await.is_err());
    assert!(coordinator.request_refresh().await.is_err());

    let n = stream.changed().await.unwrap();
    assert!(n.seq > seq);
    assert_eq!(n.snapshot.device_count(), 3);
    assert!(matches!(
        coordinator.latest().outcome,
        RefreshOutcome::Failed {
            consecutive_failures: 2,
            ..
        }
    ));
    assert!(coordinator.device(1).is_some());
}

#[tokio::test]
async fn new_devices_appear_after_refresh() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;

    let mut more = lamps();
    more.push(device(4, &[6], switch(false)));
    fake.set_devices(more);
    coordinator.request_refresh().await.unwrap();

    assert_eq!(coordinator.snapshot().device_count(), 4);
    assert_eq!(coordinator.group(6).unwrap().members.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn stalled_fetch_times_out_and_frees_the_slot() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;

    fake.set(&fake.hold_fetch, true);
    let err = coordinator.request_refresh().await.unwrap_err();
    assert!(matches!(err, CoreError::Timeout { timeout_secs: 2 }));

    fake.set(&fake.hold_fetch, false);
    coordinator.request_refresh().await.unwrap();
    assert_eq!(fake.fetch_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn periodic_refresh_survives_failures() {
    let fake = FakeGateway::new(lamps());
    let coordinator = Coordinator::new(
        config().with_refresh_interval(Duration::from_secs(30)),
        fake.clone(),
    );
    coordinator.start().await.unwrap();

    fake.set(&fake.fail_fetch, true);
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(fake.fetch_count(), 2);
    assert!(matches!(
        coordinator.latest().outcome,
        RefreshOutcome::Failed { .. }
    ));
    assert_eq!(*coordinator.state().borrow(), CoordinatorState::Running);
    assert_eq!(coordinator.snapshot().device_count(), 3);

    fake.set(&fake.fail_fetch, false);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(fake.fetch_count(), 3);
    assert_eq!(coordinator.latest().outcome, RefreshOutcome::Refreshed);

    coordinator.shutdown().await;
}

// ── Control ─────────────────────────────────────────────────────────

#[tokio::test]
async fn group_control_is_one_request_with_line() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;

    let result = coordinator
        .execute(Command::Control {
            target: EntityId::Group(5),
            fields: on(),
            fade: Some(1.5),
        })
        .await
        .unwrap();
    assert_eq!(result, CommandResult::Ok);

    let commands = fake.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].target, EntityId::Group(5));
    assert_eq!(commands[0].line, Some(0));
    assert_eq!(commands[0].fade_seconds, Some(1.5));
    // The write is followed by a refresh.
    assert_eq!(fake.fetch_count(), 2);
}

#[tokio::test]
async fn unknown_targets_fail_before_any_request() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;

    let err = coordinator
        .execute(Command::Control {
            target: EntityId::Device(99),
            fields: on(),
            fade: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::DeviceNotFound { id: 99 }));

    let err = coordinator
        .execute(Command::Control {
            target: EntityId::Group(42),
            fields: on(),
            fade: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::GroupNotFound { id: 42 }));

    assert!(fake.commands().is_empty());
    assert_eq!(fake.fetch_count(), 1);
}

#[tokio::test]
async fn invalid_control_is_rejected_locally() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;

    let too_slow = coordinator
        .execute(Command::Control {
            target: EntityId::Device(1),
            fields: on(),
            fade: Some(61.0),
        })
        .await
        .unwrap_err();
    assert!(too_slow.is_validation());

    let empty = coordinator
        .execute(Command::Control {
            target: EntityId::Device(1),
            fields: ControlFields::default(),
            fade: None,
        })
        .await
        .unwrap_err();
    assert!(empty.is_validation());

    assert!(fake.commands().is_empty());
}

#[tokio::test]
async fn set_fade_time_sends_only_the_fade() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;

    coordinator
        .execute(Command::SetFadeTime {
            target: EntityId::Device(2),
            seconds: 4.0,
        })
        .await
        .unwrap();

    let commands = fake.commands();
    assert_eq!(commands.len(), 1);
    assert!(commands[0].fields.is_empty());
    assert_eq!(commands[0].fade_seconds, Some(4.0));
}

#[tokio::test]
async fn failed_command_is_returned_to_the_caller() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;
    fake.set(&fake.fail_commands, true);

    let err = coordinator
        .execute(Command::Control {
            target: EntityId::Device(1),
            fields: on(),
            fade: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Api { status: Some(500), .. }));
}

// ── Group membership ────────────────────────────────────────────────

#[tokio::test]
async fn membership_changes_send_the_full_list() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;

    let add = |group_id| Command::AddToGroup {
        device_id: 2,
        group_id,
    };
    assert_eq!(coordinator.execute(add(5)).await.unwrap(), CommandResult::Unchanged);
    assert_eq!(coordinator.execute(add(9)).await.unwrap(), CommandResult::Ok);

    coordinator
        .execute(Command::RemoveFromGroup {
            device_id: 2,
            group_id: 6,
        })
        .await
        .unwrap();
    assert_eq!(
        coordinator
            .execute(Command::RemoveFromGroup {
                device_id: 3,
                group_id: 6,
            })
            .await
            .unwrap(),
        CommandResult::Unchanged
    );

    coordinator
        .execute(Command::SetDeviceGroups {
            device_id: 1,
            groups: vec![3, 3, 1],
        })
        .await
        .unwrap();

    assert_eq!(
        fake.group_updates(),
        vec![(2, vec![5, 6, 9]), (2, vec![5]), (1, vec![3, 1])]
    );
}

#[tokio::test]
async fn membership_of_unknown_device_is_not_found() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;

    let err = coordinator
        .execute(Command::SetDeviceGroups {
            device_id: 77,
            groups: vec![1],
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(fake.group_updates().is_empty());
}

// ── Scan / info ─────────────────────────────────────────────────────

#[tokio::test]
async fn scan_reports_progress() {
    let fake = FakeGateway::new(lamps());
    let coordinator = started(&fake).await;

    let CommandResult::Scan(progress) = coordinator
        .execute(Command::StartScan {
            new_installation: false,
        })
        .await
        .unwrap()
    else {
        panic!("expected scan progress");
    };
    assert_eq!(progress.status.as_deref(), Some("scanning"));

    let CommandResult::Scan(progress) = coordinator.execute(Command::ScanStatus).await.unwrap()
    else {
        panic!("expected scan progress");
    };
    assert_eq!(progress.found, Some(3));

    let info = coordinator.gateway_info().await.unwrap();
    assert_eq!(info.name.as_deref(), Some("Test Gateway"));
}
