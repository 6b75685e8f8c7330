//! Request/response bridge to the page worker.
//!
//! The coordinator fills a mailbox slot, then sends a [`PageRequest`] naming
//! the slot. The worker takes the slot, runs the automation on the attached
//! page and answers on the request's one-shot reply channel.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use snaprelay_automation::{PageAutomation, PageDriver};
use snaprelay_protocols::{CaptureResult, CorrelationId};

use crate::error::CoordinatorError;
use crate::mailbox::Mailbox;

/// Answer to a [`PageRequest`].
pub type PageReply = Result<CaptureResult, CoordinatorError>;

/// "Process the mailbox slot `id` on `page`."
pub struct PageRequest {
    pub id: CorrelationId,
    pub page: Arc<dyn PageDriver>,
    pub reply: oneshot::Sender<PageReply>,
}

/// Start the page worker. It runs until every request sender is dropped.
///
/// Requests are served concurrently; two runs on the same page are not
/// serialized.
pub fn spawn_page_worker(
    mut requests: mpsc::UnboundedReceiver<PageRequest>,
    mailbox: Arc<Mailbox>,
    automation: Arc<PageAutomation>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(request) = requests.recv().await {
            let mailbox = mailbox.clone();
            let automation = automation.clone();
            tokio::spawn(async move {
                let PageRequest { id, page, reply } = request;
                let result = serve(&mailbox, &automation, id, page.as_ref()).await;
                if reply.send(result).is_err() {
                    warn!("Requester for {} went away before the page answered", id);
                }
            });
        }
        debug!("Page worker stopped");
    })
}

async fn serve(
    mailbox: &Mailbox,
    automation: &PageAutomation,
    id: CorrelationId,
    page: &dyn PageDriver,
) -> PageReply {
    let slot = mailbox
        .take(&id)
        .ok_or(CoordinatorError::MailboxEmpty(id))?;
    let image = slot.image()?;
    debug!("Page worker running {} ({} bytes)", id, image.len());

    let outcome = automation.run(page, &image, &slot.current_prompt).await?;
    Ok(outcome.result)
}
