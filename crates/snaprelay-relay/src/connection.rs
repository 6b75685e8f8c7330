//! Server-side peer connection management.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use snaprelay_protocols::ChannelMessage;

use crate::frame::{Inbound, decode_frame, encode_frame};
use crate::server::RelayState;

/// A connected relay peer.
pub struct PeerConnection {
    /// Unique connection ID.
    pub id: String,
    /// Encoded frames waiting to be written to the peer.
    tx: mpsc::UnboundedSender<String>,
    /// Whether the connection is open.
    open: Arc<AtomicBool>,
}

impl PeerConnection {
    /// Create a connection handle and the receiver its task drains.
    pub(crate) fn new(id: String) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Self {
            id,
            tx,
            open: Arc::new(AtomicBool::new(true)),
        };
        (conn, rx)
    }

    /// Queue an encoded frame. Returns `false` if the peer is closed.
    pub fn send_frame(&self, text: &str) -> bool {
        if !self.is_open() {
            return false;
        }
        self.tx.send(text.to_string()).is_ok()
    }

    /// Check if the connection is open.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Mark the connection closed.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub(crate) fn open_flag(&self) -> Arc<AtomicBool> {
        self.open.clone()
    }
}

/// Drive a peer socket until either side closes it.
pub(crate) async fn handle_connection(
    conn_id: String,
    socket: WebSocket,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    state: Arc<RelayState>,
    open: Arc<AtomicBool>,
    shutdown: CancellationToken,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    info!("Relay peer connected: {}", conn_id);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }

            // Server -> peer
            Some(text) = outbound_rx.recv() => {
                if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                    warn!("Failed to send frame to {}: {}", conn_id, e);
                    break;
                }
            }

            // Peer -> server
            result = ws_rx.next() => {
                match result {
                    Some(Ok(Message::Text(text))) => match decode_frame(&conn_id, &text) {
                        Some(Inbound::Heartbeat) => {
                            let Some(ack) = encode_frame(&ChannelMessage::HeartbeatAck) else {
                                continue;
                            };
                            if let Err(e) = ws_tx.send(Message::Text(ack.into())).await {
                                warn!("Failed to ack heartbeat from {}: {}", conn_id, e);
                                break;
                            }
                        }
                        Some(Inbound::HeartbeatAck) | None => {}
                        Some(Inbound::Message(message)) => {
                            debug!("Relay frame '{}' from {}", message.action(), conn_id);
                            // No subscribers is not an error.
                            let _ = state.inbound_tx.send(message);
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Relay peer disconnected: {}", conn_id);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Relay socket error from {}: {}", conn_id, e);
                        break;
                    }
                }
            }
        }
    }

    open.store(false, Ordering::SeqCst);
    state.peers.remove(&conn_id);
    debug!("Relay peer removed: {}", conn_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_frame_while_open() {
        let (conn, mut rx) = PeerConnection::new("peer-1".to_string());
        assert!(conn.is_open());
        assert!(conn.send_frame("hello"));
        assert_eq!(rx.try_recv().unwrap(), "hello");
    }

    #[test]
    fn test_send_frame_after_close() {
        let (conn, mut rx) = PeerConnection::new("peer-1".to_string());
        conn.close();
        assert!(!conn.send_frame("hello"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_send_frame_after_task_exit() {
        let (conn, rx) = PeerConnection::new("peer-1".to_string());
        drop(rx);
        assert!(!conn.send_frame("hello"));
    }
}
