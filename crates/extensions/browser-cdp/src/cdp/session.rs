//! CDP page session for interacting with a single page.

use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::debug;

use super::client::Transport;
use super::error::CdpError;
use super::protocol::CdpEvent;

/// A session attached to a single page/target.
pub struct PageSession {
    target_id: String,
    session_id: String,
    transport: Transport,
    /// Events for this session, until someone takes them.
    events: Mutex<Option<mpsc::UnboundedReceiver<CdpEvent>>>,
}

impl PageSession {
    pub(crate) fn new(
        target_id: String,
        session_id: String,
        transport: Transport,
        events: mpsc::UnboundedReceiver<CdpEvent>,
    ) -> Self {
        Self {
            target_id,
            session_id,
            transport,
            events: Mutex::new(Some(events)),
        }
    }

    /// Get target ID.
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Get session ID.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send a CDP command to this page session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport
            .call(method, params, Some(&self.session_id))
            .await
    }

    /// Enable the domains the page driver relies on.
    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("Runtime.enable", None).await?;

        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    /// Take the session's event stream. Returns `None` once taken.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<CdpEvent>> {
        self.events.lock().take()
    }

    /// Evaluate JavaScript, awaiting promises, and return the value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            return Err(CdpError::JavaScript(exception_message(exception)));
        }

        Ok(result["result"]["value"].clone())
    }

    /// Expose `window[name]` to page scripts. Calls arrive as
    /// `Runtime.bindingCalled` events.
    pub async fn add_binding(&self, name: &str) -> Result<(), CdpError> {
        self.call("Runtime.addBinding", Some(json!({"name": name})))
            .await?;
        Ok(())
    }
}

/// Prefer the thrown value's description over the generic "Uncaught".
fn exception_message(exception: &Value) -> String {
    exception["exception"]["description"]
        .as_str()
        .or_else(|| exception["text"].as_str())
        .unwrap_or("Unknown error")
        .to_string()
}
