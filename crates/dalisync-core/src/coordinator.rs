// ── Refresh coordinator ──
//
// Owns the canonical snapshot of one gateway. Polls it on a fixed cadence
// and on demand, collapses concurrent refreshes into one in-flight fetch,
// and routes every write through a command processor task.

use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, Weak};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{
    Command, CommandEnvelope, CommandResult, ControlFields, FadeTime, dedup_groups,
};
use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::model::{Device, EntityId, GatewayInfo, Group};
use crate::remote::{ControlRequest, RemoteClient, http_client};
use crate::store::{Notification, Snapshot, SnapshotStore};
use crate::stream::SnapshotStream;

const COMMAND_CHANNEL_SIZE: usize = 64;

type RefreshFuture = Shared<BoxFuture<'static, Result<(), CoreError>>>;
type RefreshSlot = StdMutex<Option<RefreshFuture>>;

// ── CoordinatorState ─────────────────────────────────────────────

/// Lifecycle state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Starting,
    Running,
    Stopped,
}

// ── Coordinator ──────────────────────────────────────────────────

/// Cheaply cloneable handle to one gateway's state.
///
/// Callers hold the instance they need and pass it explicitly; there is
/// no process-wide registry.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: ControllerConfig,
    client: Arc<dyn RemoteClient>,
    store: Arc<SnapshotStore>,
    state: watch::Sender<CoordinatorState>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    /// The refresh currently in flight, shared by every caller.
    inflight: Arc<RefreshSlot>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator {
    /// Create a coordinator. Does NOT fetch anything; call
    /// [`start()`](Self::start) to load the first snapshot and spawn the
    /// background tasks.
    pub fn new(config: ControllerConfig, client: Arc<dyn RemoteClient>) -> Self {
        let (state, _) = watch::channel(CoordinatorState::Idle);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                client,
                store: Arc::new(SnapshotStore::new()),
                state,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                inflight: Arc::new(StdMutex::new(None)),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Coordinator talking HTTP to `config.url`.
    pub fn with_http(config: ControllerConfig) -> Result<Self, CoreError> {
        let client = http_client(&config)?;
        Ok(Self::new(config, client))
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Load the first snapshot, then spawn the command processor and (if
    /// `refresh_interval` is non-zero) the periodic refresh task.
    ///
    /// A failed initial fetch is returned and leaves the coordinator idle.
    pub async fn start(&self) -> Result<(), CoreError> {
        let mut previous = CoordinatorState::Idle;
        let claimed = self.inner.state.send_if_modified(|state| {
            previous = *state;
            if *state == CoordinatorState::Idle {
                *state = CoordinatorState::Starting;
                true
            } else {
                false
            }
        });
        if !claimed {
            return match previous {
                CoordinatorState::Stopped => Err(CoreError::CoordinatorStopped),
                _ => Ok(()),
            };
        }

        if let Err(e) = self.request_refresh().await {
            self.inner.state.send_replace(CoordinatorState::Idle);
            return Err(e);
        }

        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let coordinator = self.clone();
            handles.push(tokio::spawn(command_processor_task(coordinator, rx)));
        }

        let interval = self.inner.config.refresh_interval;
        if interval.is_zero() {
            debug!("periodic refresh disabled");
        } else {
            let coordinator = self.clone();
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(refresh_task(coordinator, interval, cancel)));
        }

        self.inner.state.send_replace(CoordinatorState::Running);
        info!(
            gateway = %self.inner.config.name,
            devices = self.inner.store.snapshot().device_count(),
            "coordinator started"
        );
        Ok(())
    }

    /// Cancel background tasks and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner.state.send_replace(CoordinatorState::Stopped);
        debug!(gateway = %self.inner.config.name, "coordinator stopped");
    }

    /// One-shot: start, run closure, shut down.
    ///
    /// For single CLI invocations: the periodic refresh is disabled since
    /// only one request-response cycle is needed.
    pub async fn oneshot<F, Fut, T>(
        config: ControllerConfig,
        client: Arc<dyn RemoteClient>,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(Coordinator) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let cfg = config.with_refresh_interval(Duration::ZERO);
        let coordinator = Coordinator::new(cfg, client);
        coordinator.start().await?;
        let result = f(coordinator.clone()).await;
        coordinator.shutdown().await;
        result
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Refresh now, or join the refresh already in flight.
    ///
    /// Concurrent callers share one fetch and all receive its result. The
    /// fetch is bounded by `config.timeout`, so a stalled gateway frees
    /// the slot instead of pinning it.
    pub async fn request_refresh(&self) -> Result<(), CoreError> {
        let refresh = {
            let mut slot = self.inner.inflight.lock().expect("refresh slot lock poisoned");
            if let Some(running) = slot.as_ref() {
                debug!("joining in-flight refresh");
                running.clone()
            } else {
                let refresh = refresh_future(
                    Arc::clone(&self.inner.client),
                    Arc::clone(&self.inner.store),
                    self.inner.config.timeout,
                    Arc::downgrade(&self.inner.inflight),
                );
                *slot = Some(refresh.clone());
                refresh
            }
        };
        refresh.await
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command against the gateway.
    ///
    /// Commands are processed one at a time, in submission order.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if *self.inner.state.borrow() != CoordinatorState::Running {
            return Err(CoreError::CoordinatorStopped);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();

        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::CoordinatorStopped)?;

        rx.await.map_err(|_| CoreError::CoordinatorStopped)?
    }

    /// Gateway identity, fetched live.
    pub async fn gateway_info(&self) -> Result<GatewayInfo, CoreError> {
        bounded(self.inner.config.timeout, self.inner.client.info()).await
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to lifecycle state changes.
    pub fn state(&self) -> watch::Receiver<CoordinatorState> {
        self.inner.state.subscribe()
    }

    /// Subscribe to refresh notifications.
    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.inner.store.subscribe())
    }

    /// The most recent notification (snapshot plus refresh outcome).
    pub fn latest(&self) -> Notification {
        self.inner.store.latest()
    }

    // ── Snapshot accessors ───────────────────────────────────────

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.store.snapshot()
    }

    /// `None` means "unknown", never "off".
    pub fn device(&self, id: u32) -> Option<Arc<Device>> {
        self.snapshot().device(id).cloned()
    }

    /// `None` means "unknown", never "off".
    pub fn group(&self, id: u32) -> Option<Arc<Group>> {
        self.snapshot().group(id).cloned()
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.inner.cancel.child_token()
    }
}

// ── Refresh plumbing ─────────────────────────────────────────────

fn refresh_future(
    client: Arc<dyn RemoteClient>,
    store: Arc<SnapshotStore>,
    timeout: Duration,
    slot: Weak<RefreshSlot>,
) -> RefreshFuture {
    async move {
        let result = fetch_and_publish(client.as_ref(), &store, timeout).await;
        // Cleared only after publication, so a caller arriving later
        // starts a fresh fetch rather than reusing this result.
        if let Some(slot) = slot.upgrade() {
            *slot.lock().expect("refresh slot lock poisoned") = None;
        }
        result
    }
    .boxed()
    .shared()
}

async fn fetch_and_publish(
    client: &dyn RemoteClient,
    store: &SnapshotStore,
    timeout: Duration,
) -> Result<(), CoreError> {
    match bounded(timeout, client.fetch_devices()).await {
        Ok(devices) => {
            let snapshot = store.publish(devices);
            debug!(
                devices = snapshot.device_count(),
                groups = snapshot.group_count(),
                "refresh complete"
            );
            Ok(())
        }
        Err(e) => {
            let failures = store.publish_failure(e.to_string());
            debug!(error = %e, consecutive_failures = failures, "refresh failed");
            Err(e)
        }
    }
}

/// Bound a gateway call by `timeout`; expiry is a transport failure.
async fn bounded<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, CoreError>>,
) -> Result<T, CoreError> {
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(CoreError::Timeout {
            timeout_secs: timeout.as_secs(),
        }))
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically refresh the snapshot. Failures are absorbed: the last
/// good snapshot keeps being served and the next tick retries.
async fn refresh_task(coordinator: Coordinator, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = coordinator.request_refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}

/// Process commands from the mpsc channel in order.
async fn command_processor_task(coordinator: Coordinator, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = coordinator.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&coordinator, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────

/// Validate a command against the current snapshot and send it.
///
/// Validation and lookups happen before any network call.
async fn route_command(
    coordinator: &Coordinator,
    cmd: Command,
) -> Result<CommandResult, CoreError> {
    let inner = &coordinator.inner;
    let client = inner.client.as_ref();
    let timeout = inner.config.timeout;
    let snapshot = inner.store.snapshot();

    match cmd {
        // ── Control ──────────────────────────────────────────────

        Command::Control {
            target,
            fields,
            fade,
        } => {
            let fade = fade.map(FadeTime::new).transpose()?;
            if fields.is_empty() && fade.is_none() {
                return Err(CoreError::validation("control command carries no changes"));
            }
            let line = target_line(&snapshot, target)?;
            let request = ControlRequest {
                target,
                fields,
                fade_seconds: fade.map(FadeTime::seconds),
                line,
            };
            debug!(entity = %target, fields = ?request.fields, "control");
            bounded(timeout, client.send_command(&request)).await?;
            refresh_after_write(coordinator).await;
            Ok(CommandResult::Ok)
        }

        Command::SetFadeTime { target, seconds } => {
            let fade = FadeTime::new(seconds)?;
            let line = target_line(&snapshot, target)?;
            let request = ControlRequest {
                target,
                fields: ControlFields::default(),
                fade_seconds: Some(fade.seconds()),
                line,
            };
            debug!(entity = %target, seconds, "set fade time");
            bounded(timeout, client.send_command(&request)).await?;
            Ok(CommandResult::Ok)
        }

        // ── Group membership ─────────────────────────────────────

        Command::AddToGroup {
            device_id,
            group_id,
        } => {
            let device = require_device(&snapshot, device_id)?;
            if device.in_group(group_id) {
                return Ok(CommandResult::Unchanged);
            }
            let mut groups = device.groups.clone();
            groups.push(group_id);
            put_groups(coordinator, device_id, &dedup_groups(&groups)).await
        }

        Command::RemoveFromGroup {
            device_id,
            group_id,
        } => {
            let device = require_device(&snapshot, device_id)?;
            if !device.in_group(group_id) {
                return Ok(CommandResult::Unchanged);
            }
            let groups: Vec<u32> = device
                .groups
                .iter()
                .copied()
                .filter(|&g| g != group_id)
                .collect();
            put_groups(coordinator, device_id, &dedup_groups(&groups)).await
        }

        Command::SetDeviceGroups { device_id, groups } => {
            let groups = dedup_groups(&groups);
            require_device(&snapshot, device_id)?;
            put_groups(coordinator, device_id, &groups).await
        }

        // ── Bus maintenance ──────────────────────────────────────

        Command::StartScan { new_installation } => {
            info!(new_installation, "starting bus scan");
            let progress = bounded(timeout, client.start_scan(new_installation)).await?;
            Ok(CommandResult::Scan(progress))
        }

        Command::ScanStatus => {
            let progress = bounded(timeout, client.scan_status()).await?;
            Ok(CommandResult::Scan(progress))
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn require_device(snapshot: &Snapshot, id: u32) -> Result<Arc<Device>, CoreError> {
    snapshot
        .device(id)
        .cloned()
        .ok_or(CoreError::DeviceNotFound { id })
}

/// Check the target exists and return the bus line group commands use.
fn target_line(snapshot: &Snapshot, target: EntityId) -> Result<Option<u32>, CoreError> {
    match target {
        EntityId::Device(id) => snapshot
            .device(id)
            .map(|_| None)
            .ok_or(CoreError::DeviceNotFound { id }),
        EntityId::Group(id) => snapshot
            .group(id)
            .map(|g| g.line)
            .ok_or(CoreError::GroupNotFound { id }),
    }
}

async fn put_groups(
    coordinator: &Coordinator,
    device_id: u32,
    groups: &[u32],
) -> Result<CommandResult, CoreError> {
    let inner = &coordinator.inner;
    debug!(device_id, ?groups, "updating group membership");
    bounded(
        inner.config.timeout,
        inner.client.update_device_groups(device_id, groups),
    )
    .await?;
    refresh_after_write(coordinator).await;
    Ok(CommandResult::Ok)
}

/// A write was accepted; converge the snapshot. A failed refresh here does
/// not fail the write.
async fn refresh_after_write(coordinator: &Coordinator) {
    if let Err(e) = coordinator.request_refresh().await {
        warn!(error = %e, "refresh after command failed");
    }
}
