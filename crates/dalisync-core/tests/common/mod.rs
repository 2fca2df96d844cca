#![allow(dead_code, clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use url::Url;

use dalisync_core::{
    ControlRequest, ControllerConfig, CoreError, Device, Features, GatewayInfo, RemoteClient,
    ScanProgress,
};

/// In-memory gateway. Records every write and never applies it, so the
/// snapshot only changes when a test says so.
#[derive(Default)]
pub struct FakeGateway {
    devices: Mutex<Vec<Device>>,
    pub fetches: AtomicUsize,
    pub fail_fetch: AtomicBool,
    pub fail_commands: AtomicBool,
    /// Hold every fetch until `release` is notified.
    pub hold_fetch: AtomicBool,
    pub release: Notify,
    pub commands: Mutex<Vec<ControlRequest>>,
    pub group_updates: Mutex<Vec<(u32, Vec<u32>)>>,
}

impl FakeGateway {
    pub fn new(devices: Vec<Device>) -> Arc<Self> {
        let fake = Self::default();
        *fake.devices.lock().unwrap() = devices;
        Arc::new(fake)
    }

    pub fn set_devices(&self, devices: Vec<Device>) {
        *self.devices.lock().unwrap() = devices;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<ControlRequest> {
        self.commands.lock().unwrap().clone()
    }

    pub fn group_updates(&self) -> Vec<(u32, Vec<u32>)> {
        self.group_updates.lock().unwrap().clone()
    }

    pub fn set(&self, flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteClient for FakeGateway {
    async fn fetch_devices(&self) -> Result<Vec<Device>, CoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.hold_fetch.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(CoreError::ConnectionFailed {
                url: "http://gw.test/".into(),
                reason: "connection refused".into(),
            });
        }
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn send_command(&self, request: &ControlRequest) -> Result<(), CoreError> {
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(CoreError::Api {
                message: "gateway rejected command".into(),
                status: Some(500),
            });
        }
        self.commands.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn update_device_groups(&self, device_id: u32, groups: &[u32]) -> Result<(), CoreError> {
        self.group_updates
            .lock()
            .unwrap()
            .push((device_id, groups.to_vec()));
        Ok(())
    }

    async fn start_scan(&self, _new_installation: bool) -> Result<ScanProgress, CoreError> {
        Ok(ScanProgress {
            status: Some("scanning".into()),
            progress: Some(0.0),
            found: Some(0),
        })
    }

    async fn scan_status(&self) -> Result<ScanProgress, CoreError> {
        Ok(ScanProgress {
            status: Some("done".into()),
            progress: Some(100.0),
            found: Some(3),
        })
    }

    async fn info(&self) -> Result<GatewayInfo, CoreError> {
        Ok(GatewayInfo {
            name: Some("Test Gateway".into()),
            version: Some("1.0.0".into()),
            extra: serde_json::Map::new(),
        })
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────

pub fn config() -> ControllerConfig {
    ControllerConfig::new(Url::parse("http://gw.test").unwrap())
        .with_refresh_interval(Duration::ZERO)
        .with_timeout(Duration::from_secs(2))
}

pub fn device(id: u32, groups: &[u32], features: Features) -> Device {
    Device {
        id,
        name: format!("Lamp {id}"),
        address: Some(id),
        line: Some(0),
        device_type: Some("light".into()),
        groups: groups.to_vec(),
        features,
    }
}

pub fn switch(on: bool) -> Features {
    Features {
        switchable: Some(on),
        ..Features::default()
    }
}

pub fn dimmable(on: bool, level: f64) -> Features {
    Features {
        switchable: Some(on),
        dimmable: Some(level),
        ..Features::default()
    }
}
