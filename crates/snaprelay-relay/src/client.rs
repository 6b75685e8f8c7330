//! Connecting side of the relay.
//!
//! The client owns a supervisor task per `connect()` call. The supervisor
//! dials the server, runs the session (heartbeats, liveness check, frame
//! pumping) and on transport loss retries after a fixed delay, up to the
//! configured number of attempts. An explicit `close()` cancels the
//! supervisor and never schedules a reconnect.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, interval_at, sleep, sleep_until};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use snaprelay_config::RelayConfig;
use snaprelay_protocols::{ChannelMessage, ConnectionState, DuplexChannel, RelayError};

use crate::frame::{Inbound, decode_frame, encode_frame};

type RelayStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How a session ended.
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    /// Transport lost; eligible for reconnect.
    Dropped,
    /// Owner called `close()`.
    Stopped,
}

/// Timing policy of the client.
#[derive(Debug, Clone)]
pub struct ClientPolicy {
    pub heartbeat_interval: Duration,
    pub liveness_timeout: Duration,
    pub reconnect_delay: Duration,
    pub max_reconnect_attempts: u32,
}

impl From<&RelayConfig> for ClientPolicy {
    fn from(config: &RelayConfig) -> Self {
        Self {
            heartbeat_interval: config.heartbeat_interval(),
            liveness_timeout: config.liveness_timeout(),
            reconnect_delay: config.reconnect_delay(),
            max_reconnect_attempts: config.max_reconnect_attempts,
        }
    }
}

struct ClientInner {
    url: String,
    policy: ClientPolicy,
    state_tx: watch::Sender<ConnectionState>,
    inbound_tx: broadcast::Sender<ChannelMessage>,
    /// Frame queue of the live session, if any.
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    /// Cancels the current supervisor.
    supervisor: Mutex<Option<CancellationToken>>,
    /// Reconnects scheduled since the last successful open.
    reconnect_attempts: AtomicU32,
    /// Total dials since construction.
    dials: AtomicU32,
    /// Set when the supervisor gave up.
    exhausted: AtomicBool,
}

impl ClientInner {
    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }

    /// Publish a supervisor state change unless that supervisor was stopped.
    ///
    /// `close()` and `connect()` cancel tokens under the same lock, so a
    /// stopped supervisor can never overwrite the state they set.
    fn publish(
        &self,
        token: &CancellationToken,
        state: ConnectionState,
        outbound: Option<mpsc::UnboundedSender<String>>,
    ) -> bool {
        let _supervisor = self.supervisor.lock();
        if token.is_cancelled() {
            return false;
        }
        *self.outbound.lock() = outbound;
        self.set_state(state);
        true
    }

    fn dispatch(&self, text: &str) {
        match decode_frame(&self.url, text) {
            Some(Inbound::Message(message)) => {
                debug!("Relay frame '{}' from server", message.action());
                let _ = self.inbound_tx.send(message);
            }
            Some(Inbound::Heartbeat) | Some(Inbound::HeartbeatAck) | None => {}
        }
    }
}

/// Relay client with heartbeat liveness and bounded reconnect.
#[derive(Clone)]
pub struct RelayClient {
    inner: Arc<ClientInner>,
}

impl RelayClient {
    /// Client dialing the relay described by `config`.
    pub fn new(config: &RelayConfig) -> Self {
        Self::with_policy(config.url(), ClientPolicy::from(config))
    }

    pub fn with_policy(url: impl Into<String>, policy: ClientPolicy) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (inbound_tx, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(ClientInner {
                url: url.into(),
                policy,
                state_tx,
                inbound_tx,
                outbound: Mutex::new(None),
                supervisor: Mutex::new(None),
                reconnect_attempts: AtomicU32::new(0),
                dials: AtomicU32::new(0),
                exhausted: AtomicBool::new(false),
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Observe connection state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Total number of dial attempts made so far.
    pub fn dial_count(&self) -> u32 {
        self.inner.dials.load(Ordering::SeqCst)
    }

    /// Wait until the client is connected, or until it gives up.
    pub async fn wait_connected(&self) -> Result<(), RelayError> {
        let mut rx = self.subscribe_state();
        loop {
            if *rx.borrow_and_update() == ConnectionState::Connected {
                return Ok(());
            }
            if self.inner.exhausted.load(Ordering::SeqCst) {
                return Err(RelayError::RetriesExhausted {
                    attempts: self.inner.reconnect_attempts.load(Ordering::SeqCst),
                });
            }
            if rx.changed().await.is_err() {
                return Err(RelayError::Disconnected);
            }
        }
    }
}

#[async_trait]
impl DuplexChannel for RelayClient {
    async fn connect(&self) -> Result<(), RelayError> {
        let mut supervisor = self.inner.supervisor.lock();
        let started = self.inner.state_tx.send_if_modified(|state| {
            if state.is_idle() {
                *state = ConnectionState::Connecting;
                true
            } else {
                false
            }
        });
        if !started {
            return Ok(());
        }

        // A supervisor may still be sleeping before a retry.
        if let Some(previous) = supervisor.take() {
            previous.cancel();
        }
        self.inner.reconnect_attempts.store(0, Ordering::SeqCst);
        self.inner.exhausted.store(false, Ordering::SeqCst);

        let token = CancellationToken::new();
        *supervisor = Some(token.clone());
        tokio::spawn(supervise(self.inner.clone(), token));
        Ok(())
    }

    fn send(&self, message: &ChannelMessage) -> bool {
        if *self.inner.state_tx.borrow() != ConnectionState::Connected {
            return false;
        }
        let Some(text) = encode_frame(message) else {
            return false;
        };
        match self.inner.outbound.lock().as_ref() {
            Some(tx) => tx.send(text).is_ok(),
            None => false,
        }
    }

    fn inbound(&self) -> broadcast::Receiver<ChannelMessage> {
        self.inner.inbound_tx.subscribe()
    }

    async fn close(&self) {
        let mut supervisor = self.inner.supervisor.lock();
        if let Some(token) = supervisor.take() {
            token.cancel();
        }
        self.inner.outbound.lock().take();
        self.inner.set_state(ConnectionState::Disconnected);
    }

    fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }
}

/// Dial, run, and redial until stopped or out of attempts.
async fn supervise(inner: Arc<ClientInner>, token: CancellationToken) {
    loop {
        if !inner.publish(&token, ConnectionState::Connecting, None) {
            return;
        }
        let dial = inner.dials.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Dialing relay {} (dial #{})", inner.url, dial);

        let end = tokio::select! {
            _ = token.cancelled() => SessionEnd::Stopped,
            result = connect_async(inner.url.as_str()) => match result {
                Ok((stream, _)) => {
                    inner.reconnect_attempts.store(0, Ordering::SeqCst);
                    run_session(&inner, stream, &token).await
                }
                Err(e) => {
                    warn!("Relay connect to {} failed: {}", inner.url, e);
                    SessionEnd::Dropped
                }
            },
        };

        if end == SessionEnd::Stopped {
            return;
        }

        let attempts = inner.reconnect_attempts.load(Ordering::SeqCst);
        if attempts >= inner.policy.max_reconnect_attempts {
            warn!(
                "Giving up on relay {} after {} reconnect attempts",
                inner.url, attempts
            );
            inner.exhausted.store(true, Ordering::SeqCst);
            inner.publish(&token, ConnectionState::Disconnected, None);
            return;
        }
        inner.reconnect_attempts.store(attempts + 1, Ordering::SeqCst);
        if !inner.publish(&token, ConnectionState::Disconnected, None) {
            return;
        }

        info!(
            "Reconnecting to relay in {:?} (attempt {}/{})",
            inner.policy.reconnect_delay,
            attempts + 1,
            inner.policy.max_reconnect_attempts
        );
        tokio::select! {
            _ = token.cancelled() => return,
            _ = sleep(inner.policy.reconnect_delay) => {}
        }
    }
}

/// Pump one open connection until it drops or the owner stops it.
async fn run_session(
    inner: &ClientInner,
    stream: RelayStream,
    token: &CancellationToken,
) -> SessionEnd {
    let (mut ws_tx, mut ws_rx) = stream.split();
    let (tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    if !inner.publish(token, ConnectionState::Connected, Some(tx)) {
        let _ = ws_tx.send(Message::Close(None)).await;
        return SessionEnd::Stopped;
    }
    info!("Connected to relay {}", inner.url);

    let heartbeat_every = inner.policy.heartbeat_interval;
    let liveness = inner.policy.liveness_timeout;
    let mut heartbeat = interval_at(Instant::now() + heartbeat_every, heartbeat_every);
    let deadline = sleep_until(Instant::now() + liveness);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                return SessionEnd::Stopped;
            }

            _ = heartbeat.tick() => {
                let Some(text) = encode_frame(&ChannelMessage::Heartbeat) else {
                    continue;
                };
                trace!("Heartbeat to {}", inner.url);
                if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                    warn!("Failed to send heartbeat: {}", e);
                    return SessionEnd::Dropped;
                }
            }

            _ = &mut deadline => {
                warn!("No frame from relay within {:?}, dropping connection", liveness);
                return SessionEnd::Dropped;
            }

            Some(text) = outbound_rx.recv() => {
                if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                    warn!("Failed to send frame: {}", e);
                    return SessionEnd::Dropped;
                }
            }

            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        deadline.as_mut().reset(Instant::now() + liveness);
                        inner.dispatch(&text);
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Relay {} closed the connection", inner.url);
                        return SessionEnd::Dropped;
                    }
                    Some(Ok(_)) => {
                        deadline.as_mut().reset(Instant::now() + liveness);
                    }
                    Some(Err(e)) => {
                        warn!("Relay socket error: {}", e);
                        return SessionEnd::Dropped;
                    }
                }
            }
        }
    }
}
