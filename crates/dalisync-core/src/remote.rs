// ── Remote client seam ──
//
// The coordinator and views talk to a gateway only through this trait.
// `DaliClient` implements it over HTTP; tests substitute in-memory fakes.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use dalisync_api::{DaliClient, TransportConfig};

use crate::command::ControlFields;
use crate::config::ControllerConfig;
use crate::convert::control_payload;
use crate::error::CoreError;
use crate::model::{Device, EntityId, GatewayInfo, ScanProgress};

/// A control command addressed to one device or one group.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlRequest {
    pub target: EntityId,
    pub fields: ControlFields,
    /// Server-side transition in seconds (already validated).
    pub fade_seconds: Option<f64>,
    /// Bus line restriction for group commands.
    pub line: Option<u32>,
}

/// Operations the core needs from a gateway.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn fetch_devices(&self) -> Result<Vec<Device>, CoreError>;

    /// Send one control command. Group commands are a single call to the
    /// group, never a fan-out over members.
    async fn send_command(&self, request: &ControlRequest) -> Result<(), CoreError>;

    /// Replace a device's group memberships.
    async fn update_device_groups(&self, device_id: u32, groups: &[u32]) -> Result<(), CoreError>;

    async fn start_scan(&self, new_installation: bool) -> Result<ScanProgress, CoreError>;

    async fn scan_status(&self) -> Result<ScanProgress, CoreError>;

    async fn info(&self) -> Result<GatewayInfo, CoreError>;
}

/// HTTP client for the gateway described by `config`.
pub fn http_client(config: &ControllerConfig) -> Result<Arc<dyn RemoteClient>, CoreError> {
    let transport = TransportConfig::with_timeout(config.timeout);
    let client = DaliClient::new(config.url.as_str(), &transport)?;
    Ok(Arc::new(client))
}

#[async_trait]
impl RemoteClient for DaliClient {
    async fn fetch_devices(&self) -> Result<Vec<Device>, CoreError> {
        let raw = self.list_devices().await?;
        Ok(raw.into_iter().map(Device::from).collect())
    }

    async fn send_command(&self, request: &ControlRequest) -> Result<(), CoreError> {
        let payload = control_payload(&request.fields, request.fade_seconds);
        debug!(entity = %request.target, ?payload, "sending control command");
        match request.target {
            EntityId::Device(id) => self.control_device(id, &payload).await?,
            EntityId::Group(id) => self.control_group(id, &payload, request.line).await?,
        }
        Ok(())
    }

    async fn update_device_groups(&self, device_id: u32, groups: &[u32]) -> Result<(), CoreError> {
        DaliClient::update_device_groups(self, device_id, groups).await?;
        Ok(())
    }

    async fn start_scan(&self, new_installation: bool) -> Result<ScanProgress, CoreError> {
        Ok(DaliClient::start_scan(self, new_installation).await?.into())
    }

    async fn scan_status(&self) -> Result<ScanProgress, CoreError> {
        Ok(DaliClient::scan_status(self).await?.into())
    }

    async fn info(&self) -> Result<GatewayInfo, CoreError> {
        Ok(self.get_info().await?.into())
    }
}
