//! Listening side of the relay.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    extract::{State, ws::WebSocket, ws::WebSocketUpgrade},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use snaprelay_config::RelayConfig;
use snaprelay_protocols::{ChannelMessage, ConnectionState, DuplexChannel, RelayError};

use crate::connection::{PeerConnection, handle_connection};
use crate::frame::encode_frame;

/// Relay state shared across handlers.
pub struct RelayState {
    /// Connected peers.
    pub peers: DashMap<String, PeerConnection>,
    /// Broadcast sender for application frames.
    pub inbound_tx: broadcast::Sender<ChannelMessage>,
    /// Listener running flag.
    pub started: AtomicBool,
    shutdown: Mutex<CancellationToken>,
}

impl RelayState {
    pub fn new() -> Self {
        let (inbound_tx, _) = broadcast::channel(256);
        Self {
            peers: DashMap::new(),
            inbound_tx,
            started: AtomicBool::new(false),
            shutdown: Mutex::new(CancellationToken::new()),
        }
    }

    fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.lock().clone()
    }
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the Axum router for the relay.
pub fn create_router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health_check))
        .with_state(state)
}

/// WebSocket upgrade handler.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<RelayState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Register a new peer and start its connection task.
async fn handle_socket(socket: WebSocket, state: Arc<RelayState>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    debug!("New relay socket: {}", conn_id);

    let (conn, outbound_rx) = PeerConnection::new(conn_id.clone());
    let open = conn.open_flag();
    state.peers.insert(conn_id.clone(), conn);

    let shutdown = state.shutdown_token();
    tokio::spawn(handle_connection(
        conn_id,
        socket,
        outbound_rx,
        state,
        open,
        shutdown,
    ));
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<RelayState>>) -> impl IntoResponse {
    let status = if state.started.load(Ordering::SeqCst) {
        "ok"
    } else {
        "stopped"
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::json!({
            "status": status,
            "peers": state.peers.len(),
        })
        .to_string(),
    )
}

/// Relay server: accepts any number of peers and broadcasts to all of them.
pub struct RelayServer {
    config: RelayConfig,
    state: Arc<RelayState>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl RelayServer {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            state: Arc::new(RelayState::new()),
            local_addr: Mutex::new(None),
        }
    }

    /// Configured listen address.
    pub fn address(&self) -> String {
        self.config.address()
    }

    /// Address actually bound, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// Get a reference to the shared state.
    pub fn shared(&self) -> Arc<RelayState> {
        self.state.clone()
    }

    pub fn is_started(&self) -> bool {
        self.state.started.load(Ordering::SeqCst)
    }

    /// Number of open peers.
    pub fn peer_count(&self) -> usize {
        self.state.peers.iter().filter(|p| p.is_open()).count()
    }
}

#[async_trait]
impl DuplexChannel for RelayServer {
    async fn connect(&self) -> Result<(), RelayError> {
        if self.is_started() {
            return Ok(());
        }

        let addr = self.address();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| RelayError::Bind {
                address: addr.clone(),
                message: e.to_string(),
            })?;
        let bound = listener.local_addr().map_err(|e| RelayError::Bind {
            address: addr.clone(),
            message: e.to_string(),
        })?;

        let shutdown = CancellationToken::new();
        *self.state.shutdown.lock() = shutdown.clone();
        *self.local_addr.lock() = Some(bound);
        self.state.started.store(true, Ordering::SeqCst);

        let router = create_router(self.state.clone());
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
            {
                error!("Relay server error: {}", e);
            }
        });

        info!("Relay listening on ws://{}", bound);
        Ok(())
    }

    fn send(&self, message: &ChannelMessage) -> bool {
        if !self.is_started() {
            return false;
        }
        let Some(text) = encode_frame(message) else {
            return false;
        };

        let mut delivered = false;
        for peer in self.state.peers.iter() {
            if peer.send_frame(&text) {
                delivered = true;
            }
        }

        if delivered {
            debug!("Broadcast '{}' frame", message.action());
        } else {
            debug!("No relay peers, dropped '{}' frame", message.action());
        }
        delivered
    }

    fn inbound(&self) -> broadcast::Receiver<ChannelMessage> {
        self.state.inbound_tx.subscribe()
    }

    async fn close(&self) {
        if !self.is_started() {
            return;
        }

        self.state.started.store(false, Ordering::SeqCst);
        self.state.shutdown_token().cancel();
        for peer in self.state.peers.iter() {
            peer.close();
        }
        self.state.peers.clear();
        *self.local_addr.lock() = None;

        info!("Relay server stopped");
    }

    fn state(&self) -> ConnectionState {
        if !self.is_started() {
            ConnectionState::Disconnected
        } else if self.peer_count() > 0 {
            ConnectionState::Connected
        } else {
            ConnectionState::Connecting
        }
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
