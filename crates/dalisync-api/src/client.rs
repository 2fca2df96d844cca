// Async HTTP client for the DALI-2 IoT gateway REST API.
//
// The gateway exposes a small JSON API on the local network with no
// authentication. Each endpoint documents one success status; anything
// else is surfaced as `Error::Status`.

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::models::{
    ControlPayload, DeviceGroupsUpdate, DeviceList, GatewayInfo, RawDevice, ScanRequest,
    ScanStatus,
};
use crate::transport::TransportConfig;

// ── Client ───────────────────────────────────────────────────────────

/// Async client for a single gateway.
#[derive(Debug, Clone)]
pub struct DaliClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DaliClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for `base_url` (e.g. `http://192.168.1.50`).
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The normalized base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /info`
    pub async fn get_info(&self) -> Result<GatewayInfo, Error> {
        let url = self.url("info")?;
        debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        self.handle_json(resp, "GET /info", StatusCode::OK).await
    }

    /// `GET /devices`
    pub async fn list_devices(&self) -> Result<Vec<RawDevice>, Error> {
        let url = self.url("devices")?;
        debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        let list: DeviceList = self.handle_json(resp, "GET /devices", StatusCode::OK).await?;
        debug!(count = list.devices.len(), "fetched devices");
        Ok(list.devices)
    }

    /// `POST /device/{id}/control`
    pub async fn control_device(&self, id: u32, payload: &ControlPayload) -> Result<(), Error> {
        let url = self.url(&format!("device/{id}/control"))?;
        self.post_empty(url, payload, "POST /device/{id}/control", StatusCode::NO_CONTENT)
            .await
    }

    /// `POST /group/{id}/control`, optionally restricted to one bus line.
    pub async fn control_group(
        &self,
        id: u32,
        payload: &ControlPayload,
        line: Option<u32>,
    ) -> Result<(), Error> {
        let mut url = self.url(&format!("group/{id}/control"))?;
        if let Some(line) = line {
            url.query_pairs_mut().append_pair("_line", &line.to_string());
        }
        self.post_empty(url, payload, "POST /group/{id}/control", StatusCode::NO_CONTENT)
            .await
    }

    /// `PUT /device/{id}` replacing the device's group list.
    pub async fn update_device_groups(&self, id: u32, groups: &[u32]) -> Result<(), Error> {
        let url = self.url(&format!("device/{id}"))?;
        debug!("PUT {url} groups={groups:?}");
        let resp = self
            .http
            .put(url)
            .json(&DeviceGroupsUpdate { groups })
            .send()
            .await?;
        self.expect_status(resp, "PUT /device/{id}", StatusCode::OK).await
    }

    /// `POST /dali/scan`
    pub async fn start_scan(&self, new_installation: bool) -> Result<ScanStatus, Error> {
        let url = self.url("dali/scan")?;
        debug!("POST {url} newInstallation={new_installation}");
        let resp = self
            .http
            .post(url)
            .json(&ScanRequest { new_installation })
            .send()
            .await?;
        self.handle_json_or_default(resp, "POST /dali/scan").await
    }

    /// `GET /dali/scan`
    pub async fn scan_status(&self) -> Result<ScanStatus, Error> {
        let url = self.url("dali/scan")?;
        debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        self.handle_json(resp, "GET /dali/scan", StatusCode::OK).await
    }

    // ── Plumbing ─────────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    async fn post_empty<B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
        endpoint: &str,
        expected: StatusCode,
    ) -> Result<(), Error> {
        debug!("POST {url}");
        let resp = self.http.post(url).json(body).send().await?;
        self.expect_status(resp, endpoint, expected).await
    }

    async fn handle_json<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
        endpoint: &str,
        expected: StatusCode,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status != expected {
            return Err(status_error(resp, endpoint).await);
        }
        let body = resp.text().await?;
        decode(&body)
    }

    /// Scan start answers 200 with a progress body on most firmware, but
    /// some return an empty body.
    async fn handle_json_or_default(
        &self,
        resp: reqwest::Response,
        endpoint: &str,
    ) -> Result<ScanStatus, Error> {
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(status_error(resp, endpoint).await);
        }
        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(ScanStatus::default());
        }
        decode(&body)
    }

    async fn expect_status(
        &self,
        resp: reqwest::Response,
        endpoint: &str,
        expected: StatusCode,
    ) -> Result<(), Error> {
        if resp.status() == expected {
            Ok(())
        } else {
            Err(status_error(resp, endpoint).await)
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Accepts `host`, `host:port` or a full URL; always yields a URL whose
/// path ends in `/` so relative joins stay under it.
fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let raw = raw.trim();
    let with_scheme = if raw.contains("://") {
        raw.to_owned()
    } else {
        format!("http://{raw}")
    };
    let mut url = Url::parse(&with_scheme)?;
    let path = url.path().trim_end_matches('/').to_owned();
    url.set_path(&format!("{path}/"));
    Ok(url)
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}

async fn status_error(resp: reqwest::Response, endpoint: &str) -> Error {
    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();
    Error::Status {
        endpoint: endpoint.to_owned(),
        status: status.as_u16(),
        message: if raw.is_empty() {
            status.to_string()
        } else {
            raw
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_scheme_and_trailing_slash() {
        assert_eq!(
            normalize_base_url("192.168.1.50").unwrap().as_str(),
            "http://192.168.1.50/"
        );
        assert_eq!(
            normalize_base_url("http://gw.local:8080/api").unwrap().as_str(),
            "http://gw.local:8080/api/"
        );
        assert_eq!(
            normalize_base_url("http://gw.local/").unwrap().as_str(),
            "http://gw.local/"
        );
    }

    #[test]
    fn garbage_base_url_is_rejected() {
        assert!(matches!(
            normalize_base_url("http://"),
            Err(Error::InvalidUrl(_))
        ));
    }
}
