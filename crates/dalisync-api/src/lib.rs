// dalisync-api: Async Rust client for the DALI-2 IoT gateway (HTTP API + UDP discovery)

pub mod client;
pub mod discovery;
pub mod error;
pub mod models;
pub mod transport;

pub use client::DaliClient;
pub use discovery::{DiscoveredController, Discovery};
pub use error::Error;
pub use transport::TransportConfig;
