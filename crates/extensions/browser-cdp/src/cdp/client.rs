//! CDP WebSocket client.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::{RwLock, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};
use url::Url;

use super::error::CdpError;
use super::protocol::{BrowserVersion, CdpEvent, CdpRequest, CdpResponse, PageInfo};
use super::session::PageSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>>>;
type EventRoutes = Arc<RwLock<HashMap<String, mpsc::UnboundedSender<CdpEvent>>>>;

/// Bound on a single command round trip.
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Command path shared by the client and its page sessions.
#[derive(Clone)]
pub(crate) struct Transport {
    ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
    pending: Pending,
    request_id: Arc<AtomicU64>,
}

impl Transport {
    /// Send a CDP command and wait for its response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(|s| s.to_string()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let sent = {
            let mut ws = self.ws_tx.lock().await;
            ws.send(Message::Text(json.into())).await
        };
        if let Err(e) = sent {
            self.pending.lock().remove(&id);
            return Err(e.into());
        }

        match tokio::time::timeout(CALL_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }
}

/// Browser-level CDP connection.
pub struct CdpClient {
    /// HTTP endpoint for page discovery.
    http_endpoint: String,
    /// Browser WebSocket URL.
    browser_ws_url: String,
    transport: Transport,
    /// Event senders by session ID.
    routes: EventRoutes,
    /// Background receive task.
    recv_task: JoinHandle<()>,
}

impl CdpClient {
    /// Fetch the browser's version info from `endpoint`.
    pub async fn probe(endpoint: &str) -> Result<BrowserVersion, CdpError> {
        let http_endpoint = normalize_endpoint(endpoint)?;
        let version_url = format!("{}/json/version", http_endpoint);
        debug!("Fetching browser version from {}", version_url);

        reqwest::get(&version_url)
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
            .json()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))
    }

    /// Connect to Chrome at `endpoint` (e.g. `http://localhost:9222`).
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http_endpoint = normalize_endpoint(endpoint)?;
        let version = Self::probe(&http_endpoint).await?;
        debug!("Found browser: {}", version.browser);

        let browser_ws_url = version.web_socket_debugger_url;
        let (ws_stream, _) = tokio_tungstenite::connect_async(&browser_ws_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let routes: EventRoutes = Arc::new(RwLock::new(HashMap::new()));

        let recv_task = {
            let pending = pending.clone();
            let routes = routes.clone();
            tokio::spawn(async move {
                Self::receive_loop(ws_source, pending, routes).await;
            })
        };

        debug!("CDP client connected to {}", browser_ws_url);

        Ok(Self {
            http_endpoint,
            browser_ws_url,
            transport: Transport {
                ws_tx: Arc::new(tokio::sync::Mutex::new(ws_sink)),
                pending,
                request_id: Arc::new(AtomicU64::new(1)),
            },
            routes,
            recv_task,
        })
    }

    async fn receive_loop(mut ws_source: WsSource, pending: Pending, routes: EventRoutes) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("CDP recv: {}", text);
                    let resp = match serde_json::from_str::<CdpResponse>(&text) {
                        Ok(resp) => resp,
                        Err(e) => {
                            warn!("Failed to parse CDP message: {}", e);
                            continue;
                        }
                    };

                    if let Some(id) = resp.id {
                        let Some(tx) = pending.lock().remove(&id) else {
                            continue;
                        };
                        let result = match resp.error {
                            Some(error) => Err(CdpError::Protocol {
                                code: error.code,
                                message: error.message,
                            }),
                            None => Ok(resp.result.unwrap_or(Value::Null)),
                        };
                        let _ = tx.send(result);
                    } else if let Some((session_id, event)) = resp.into_event() {
                        let session_id = session_id.unwrap_or_default();
                        if let Some(tx) = routes.read().await.get(&session_id) {
                            let _ = tx.send(event);
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("CDP WebSocket closed");
                    break;
                }
                Err(e) => {
                    error!("CDP WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        // Fail in-flight calls now instead of at their timeout, and end
        // every session's event stream.
        pending.lock().clear();
        routes.write().await.clear();
    }

    /// Whether the browser connection is still up.
    pub fn is_alive(&self) -> bool {
        !self.recv_task.is_finished()
    }

    /// Get browser WebSocket URL.
    pub fn browser_ws_url(&self) -> &str {
        &self.browser_ws_url
    }

    // ========================================================================
    // Target Management
    // ========================================================================

    /// List all targets the browser exposes over HTTP.
    pub async fn list_pages(&self) -> Result<Vec<PageInfo>, CdpError> {
        let url = format!("{}/json/list", self.http_endpoint);
        let pages: Vec<PageInfo> = reqwest::get(&url).await?.json().await?;
        Ok(pages)
    }

    /// Open `url` in a new tab without activating it. Returns the target ID.
    pub async fn create_background_page(&self, url: &str) -> Result<String, CdpError> {
        let result = self
            .transport
            .call(
                "Target.createTarget",
                Some(json!({
                    "url": url,
                    "background": true
                })),
                None,
            )
            .await?;

        let target_id = result["targetId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing targetId".to_string()))?
            .to_string();
        debug!("Created background page {} for {}", target_id, url);
        Ok(target_id)
    }

    /// Attach to an existing page.
    pub async fn attach_page(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .transport
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true
                })),
                None,
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        self.routes.write().await.insert(session_id.clone(), event_tx);

        let session = PageSession::new(
            target_id.to_string(),
            session_id,
            self.transport.clone(),
            event_rx,
        );
        session.enable_domains().await?;

        Ok(session)
    }

    /// Detach a session and stop routing its events.
    pub async fn detach(&self, session_id: &str) -> Result<(), CdpError> {
        self.routes.write().await.remove(session_id);
        self.transport
            .call(
                "Target.detachFromTarget",
                Some(json!({"sessionId": session_id})),
                None,
            )
            .await?;
        Ok(())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}

/// Validate `endpoint` as an HTTP URL and strip trailing slashes.
fn normalize_endpoint(endpoint: &str) -> Result<String, CdpError> {
    let url = Url::parse(endpoint)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CdpError::ConnectionFailed(format!(
            "Expected an http(s) endpoint, got {}",
            endpoint
        )));
    }
    Ok(endpoint.trim_end_matches('/').to_string())
}
