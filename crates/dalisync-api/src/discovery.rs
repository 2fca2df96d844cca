// UDP broadcast discovery of gateways on the local network.
//
// A single `{"type": "discovery"}` datagram is broadcast to port 5555;
// every gateway that hears it answers with a small JSON document. Replies
// are collected until the window closes.

use std::collections::BTreeMap;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::ops::ControlFlow;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::Error;

/// Port the gateways listen on for discovery probes.
pub const DISCOVERY_PORT: u16 = 5555;

/// Default collection window.
pub const DISCOVERY_WINDOW: Duration = Duration::from_secs(5);

const DISCOVERY_MESSAGE: &[u8] = br#"{"type": "discovery"}"#;
const RESPONSE_TYPE: &str = "dali-2-iot";
const DEFAULT_NAME: &str = "DALI2 IoT";

/// A gateway that answered the discovery probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredController {
    pub host: String,
    pub name: String,
}

#[derive(Deserialize)]
struct DiscoveryReply {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Broadcast-and-collect discovery probe.
#[derive(Debug, Clone)]
pub struct Discovery {
    target: SocketAddr,
    window: Duration,
}

impl Default for Discovery {
    fn default() -> Self {
        Self {
            target: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::BROADCAST, DISCOVERY_PORT)),
            window: DISCOVERY_WINDOW,
        }
    }
}

impl Discovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send the probe somewhere other than the limited broadcast address.
    pub fn with_target(mut self, target: SocketAddr) -> Self {
        self.target = target;
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Broadcast the probe and collect replies for the configured window.
    ///
    /// An empty result is not an error. Replies from the same host are
    /// collapsed; the first one wins.
    pub async fn discover(&self) -> Result<Vec<DiscoveredController>, Error> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .map_err(Error::Discovery)?;
        socket.set_broadcast(true).map_err(Error::Discovery)?;

        debug!(addr = %self.target, window = ?self.window, "sending discovery probe");
        socket
            .send_to(DISCOVERY_MESSAGE, self.target)
            .await
            .map_err(Error::Discovery)?;

        let deadline = Instant::now() + self.window;
        let mut found: BTreeMap<String, DiscoveredController> = BTreeMap::new();
        let mut buf = [0u8; 1024];

        loop {
            let received = tokio::select! {
                () = tokio::time::sleep_until(deadline) => break,
                r = socket.recv_from(&mut buf) => r,
            };

            match accept(received, &buf) {
                ControlFlow::Break(()) => break,
                ControlFlow::Continue(None) => {}
                ControlFlow::Continue(Some(controller)) => {
                    debug!(host = %controller.host, name = %controller.name, "gateway answered");
                    found.entry(controller.host.clone()).or_insert(controller);
                }
            }
        }

        Ok(found.into_values().collect())
    }
}

/// Handle one `recv_from` result. A socket error ends collection: it
/// would be returned again on every following call.
fn accept(
    received: io::Result<(usize, SocketAddr)>,
    buf: &[u8],
) -> ControlFlow<(), Option<DiscoveredController>> {
    match received {
        Ok((len, from)) => ControlFlow::Continue(parse_reply(&buf[..len], from)),
        Err(e) => {
            warn!(error = %e, "discovery receive failed, ending collection");
            ControlFlow::Break(())
        }
    }
}

fn parse_reply(data: &[u8], from: SocketAddr) -> Option<DiscoveredController> {
    let reply: DiscoveryReply = match serde_json::from_slice(data) {
        Ok(r) => r,
        Err(e) => {
            warn!(from = %from.ip(), error = %e, "invalid discovery response");
            return None;
        }
    };

    if reply.kind.as_deref() != Some(RESPONSE_TYPE) {
        debug!(from = %from.ip(), "ignoring non-gateway discovery response");
        return None;
    }

    Some(DiscoveredController {
        host: from.ip().to_string(),
        name: reply.name.unwrap_or_else(|| DEFAULT_NAME.to_owned()),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn from() -> SocketAddr {
        "10.0.0.7:5555".parse().unwrap()
    }

    #[test]
    fn reply_without_name_gets_default() {
        let c = parse_reply(br#"{"type":"dali-2-iot"}"#, from()).unwrap();
        assert_eq!(c.host, "10.0.0.7");
        assert_eq!(c.name, "DALI2 IoT");
    }

    #[test]
    fn receive_error_ends_collection() {
        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert_eq!(accept(Err(reset), &[]), ControlFlow::Break(()));

        let buf = br#"{"type":"dali-2-iot","name":"Hall"}"#;
        let Some(Some(c)) = accept(Ok((buf.len(), from())), buf).continue_value() else {
            panic!("expected a gateway");
        };
        assert_eq!(c.name, "Hall");
        assert_eq!(accept(Ok((3, from())), b"nul"), ControlFlow::Continue(None));
    }

    #[test]
    fn foreign_and_malformed_replies_are_dropped() {
        assert!(parse_reply(br#"{"type":"other","name":"x"}"#, from()).is_none());
        assert!(parse_reply(b"not json", from()).is_none());
        assert!(parse_reply(&[0xff, 0xfe], from()).is_none());
    }
}
