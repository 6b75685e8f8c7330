//! The tab coordinator.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use snaprelay_automation::PageAutomation;
use snaprelay_config::TargetConfig;
use snaprelay_protocols::{CaptureRequest, CaptureResult, ChannelMessage};

use crate::bridge::{PageRequest, spawn_page_worker};
use crate::error::CoordinatorError;
use crate::mailbox::{Mailbox, MailboxSlot};
use crate::tabs::{TabHost, TabInfo};

/// Routes capture requests to the target tab.
pub struct TabCoordinator {
    host: Arc<dyn TabHost>,
    target: TargetConfig,
    mailbox: Arc<Mailbox>,
    worker: mpsc::UnboundedSender<PageRequest>,
}

impl TabCoordinator {
    /// Create a coordinator and start its page worker. Must be called from
    /// within a Tokio runtime.
    pub fn new(host: Arc<dyn TabHost>, target: TargetConfig, automation: PageAutomation) -> Self {
        let mailbox = Arc::new(Mailbox::new());
        let (worker, requests) = mpsc::unbounded_channel();
        spawn_page_worker(requests, mailbox.clone(), Arc::new(automation));
        Self {
            host,
            target,
            mailbox,
            worker,
        }
    }

    pub fn mailbox(&self) -> &Arc<Mailbox> {
        &self.mailbox
    }

    /// Find the target tab, opening one in the background if none exists.
    pub async fn resolve_tab(&self) -> Result<TabInfo, CoordinatorError> {
        let prefix = &self.target.url_prefix;
        if let Some(tab) = self.host.find_tab(prefix).await? {
            debug!("Using existing tab {} ({})", tab.id, tab.url);
            return Ok(tab);
        }

        info!("No tab matches {}, opening {}", prefix, self.target.base_url);
        self.host.open_background_tab(&self.target.base_url).await?;
        tokio::time::sleep(self.target.settle_delay()).await;

        self.host
            .find_tab(prefix)
            .await?
            .ok_or_else(|| CoordinatorError::TargetNotFound(prefix.clone()))
    }

    /// Run one capture request through the target page.
    pub async fn handle(&self, request: CaptureRequest) -> Result<CaptureResult, CoordinatorError> {
        let id = request.id;
        let tab = self.resolve_tab().await?;
        let page = self.host.attach(&tab).await?;

        let prompt = if request.prompt.trim().is_empty() {
            self.target.fallback_prompt.clone()
        } else {
            request.prompt
        };
        if !self.mailbox.put(id, MailboxSlot::new(&request.image, prompt)) {
            warn!("Request {} was already pending, replaced its mailbox entry", id);
        }

        let (reply, answer) = oneshot::channel();
        if self.worker.send(PageRequest { id, page, reply }).is_err() {
            self.mailbox.take(&id);
            return Err(CoordinatorError::WorkerGone);
        }
        answer.await.map_err(|_| CoordinatorError::WorkerGone)?
    }

    /// Handle a relay frame, returning the reply to send back, if any.
    pub async fn handle_message(&self, message: ChannelMessage) -> Option<ChannelMessage> {
        match message {
            ChannelMessage::ProcessRequest(request) => {
                let id = request.id;
                match request.sequence {
                    Some(sequence) => info!("Processing request {} {}", id, sequence),
                    None => info!("Processing request {}", id),
                }
                Some(match self.handle(request).await {
                    Ok(result) => ChannelMessage::result(id, result),
                    Err(e) => {
                        warn!("Request {} failed: {}", id, e);
                        ChannelMessage::error(Some(id), e)
                    }
                })
            }
            other => {
                debug!("Ignoring '{}' frame", other.action());
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
