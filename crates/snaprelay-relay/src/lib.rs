//! # SnapRelay Relay
//!
//! Local WebSocket relay between the desktop process and the bridge.
//!
//! - [`RelayServer`] listens on a single local port and broadcasts to every
//!   connected peer. It answers heartbeats inside each connection task.
//! - [`RelayClient`] dials the server, sends heartbeats, drops the transport
//!   when the server goes silent, and reconnects a bounded number of times.
//!
//! Both implement [`snaprelay_protocols::DuplexChannel`]. Sends are best
//! effort: with no open transport they return `false` and nothing is queued.
//!
//! ## Usage
//!
//! ```ignore
//! use snaprelay_config::RelayConfig;
//! use snaprelay_protocols::DuplexChannel;
//! use snaprelay_relay::RelayServer;
//!
//! let server = RelayServer::new(RelayConfig::default());
//! server.connect().await?;
//! let mut inbound = server.inbound();
//! ```

mod client;
mod connection;
mod frame;
mod server;

pub use client::{ClientPolicy, RelayClient};
pub use connection::PeerConnection;
pub use server::{RelayServer, RelayState, create_router};
