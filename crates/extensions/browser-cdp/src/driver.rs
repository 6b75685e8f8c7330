//! [`PageDriver`] over a CDP page session.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use snaprelay_automation::{DriverError, PageDriver};
use snaprelay_protocols::ImagePayload;

use crate::cdp::{CdpError, CdpEvent, PageSession};
use crate::script::{self, MUTATION_BINDING};

/// Drives one attached tab by evaluating scripts in it.
pub struct CdpPageDriver {
    session: Arc<PageSession>,
    changes: Arc<watch::Sender<u64>>,
    events_task: JoinHandle<()>,
}

impl CdpPageDriver {
    /// Install the mutation observer in the session's page and start
    /// counting changes.
    pub async fn install(session: PageSession) -> Result<Self, CdpError> {
        let events = session
            .take_events()
            .ok_or_else(|| CdpError::InvalidResponse("Session events already taken".to_string()))?;
        session.add_binding(MUTATION_BINDING).await?;
        let session = Arc::new(session);
        install_observer(&session).await?;

        let (changes, _) = watch::channel(0u64);
        let changes = Arc::new(changes);
        let events_task = tokio::spawn(watch_page(session.clone(), events, changes.clone()));

        debug!("Page helper installed in {}", session.target_id());
        Ok(Self {
            session,
            changes,
            events_task,
        })
    }

    pub fn session_id(&self) -> &str {
        self.session.session_id()
    }

    async fn evaluate(&self, expression: String) -> Result<Value, DriverError> {
        Ok(self.session.evaluate(&expression).await?)
    }

    /// Run a script that evaluates to `false` when `selector` has no match.
    async fn act(&self, expression: String, selector: &str) -> Result<(), DriverError> {
        match self.evaluate(expression).await? {
            Value::Bool(true) => Ok(()),
            _ => Err(DriverError::NotFound(selector.to_string())),
        }
    }
}

impl Drop for CdpPageDriver {
    fn drop(&mut self) {
        self.events_task.abort();
    }
}

#[async_trait]
impl PageDriver for CdpPageDriver {
    async fn location(&self) -> Result<String, DriverError> {
        match self.evaluate(script::location()).await? {
            Value::String(href) => Ok(href),
            other => Err(DriverError::Script(format!("Unexpected location: {}", other))),
        }
    }

    async fn exists(&self, selector: &str) -> Result<bool, DriverError> {
        Ok(self.count(selector).await? > 0)
    }

    async fn count(&self, selector: &str) -> Result<usize, DriverError> {
        let value = self.evaluate(script::count(selector)).await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| DriverError::Script(format!("Unexpected count: {}", value)))
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        self.act(script::click(selector), selector).await
    }

    async fn attach_file(&self, selector: &str, image: &ImagePayload) -> Result<(), DriverError> {
        let file_name = format!("screenshot.{}", image.extension());
        debug!("Attaching {} ({} bytes)", file_name, image.len());
        let expression =
            script::attach_file(selector, &image.to_base64(), &file_name, image.mime());
        self.act(expression, selector).await
    }

    async fn replace_text(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        self.act(script::replace_text(selector, text), selector).await
    }

    async fn last_text(
        &self,
        scope: Option<&str>,
        selector: &str,
    ) -> Result<Option<String>, DriverError> {
        Ok(as_text(self.evaluate(script::last_text(scope, selector)).await?))
    }

    async fn last_markup(&self, selector: &str) -> Result<Option<String>, DriverError> {
        Ok(as_text(self.evaluate(script::last_markup(selector)).await?))
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

fn as_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        _ => None,
    }
}

async fn install_observer(session: &PageSession) -> Result<(), CdpError> {
    match session.evaluate(&script::install_observer()).await? {
        Value::Bool(true) => Ok(()),
        other => Err(CdpError::InvalidResponse(format!(
            "Observer install returned {}",
            other
        ))),
    }
}

/// Whether `event` reports a batch of DOM mutations.
fn is_mutation(event: &CdpEvent) -> bool {
    event.method == "Runtime.bindingCalled" && event.params["name"] == MUTATION_BINDING
}

/// Bump the change counter on every mutation batch. A new document loses
/// the observer, so it is installed again after each load.
async fn watch_page(
    session: Arc<PageSession>,
    mut events: mpsc::UnboundedReceiver<CdpEvent>,
    changes: Arc<watch::Sender<u64>>,
) {
    while let Some(event) = events.recv().await {
        if is_mutation(&event) {
            trace!("DOM mutation in {}", session.target_id());
            changes.send_modify(|n| *n = n.wrapping_add(1));
        } else if event.method == "Page.loadEventFired" {
            debug!("Page reloaded, reinstalling observer");
            if let Err(e) = install_observer(&session).await {
                warn!("Failed to reinstall page observer: {}", e);
            }
            changes.send_modify(|n| *n = n.wrapping_add(1));
        }
    }
    debug!("Event stream ended for {}", session.session_id());
}
