//! Duplex channel protocol definitions.
//!
//! Both relay roles implement [`DuplexChannel`]: the desktop process runs the
//! listening (broadcast) side, the bridge runs the connecting side.
//!
//! ## Delivery
//!
//! - `send` is best effort and never queues: while not connected it returns
//!   `false` and the message is dropped.
//! - Heartbeat frames are handled inside the transport and never appear on
//!   [`DuplexChannel::inbound`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::RelayError;
use crate::message::ChannelMessage;

/// Connection lifecycle of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    /// Whether `connect()` should start a new attempt from this state.
    pub fn is_idle(self) -> bool {
        self == ConnectionState::Disconnected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(s)
    }
}

/// A liveness-checked, best-effort message channel.
#[async_trait]
pub trait DuplexChannel: Send + Sync {
    /// Start the channel. A no-op while already connecting or connected.
    async fn connect(&self) -> Result<(), RelayError>;

    /// Deliver a message. Returns `false` when nothing was delivered.
    fn send(&self, message: &ChannelMessage) -> bool;

    /// Subscribe to application messages (heartbeats filtered out).
    fn inbound(&self) -> broadcast::Receiver<ChannelMessage>;

    /// Stop the channel and release its transport.
    async fn close(&self);

    /// Current connection state.
    fn state(&self) -> ConnectionState;

    /// Feed every inbound message to `handler` on a background task.
    fn on_message<F>(&self, handler: F) -> JoinHandle<()>
    where
        F: Fn(ChannelMessage) + Send + 'static,
        Self: Sized,
    {
        let mut rx = self.inbound();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(message) => handler(message),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Message handler lagged, {} message(s) dropped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
