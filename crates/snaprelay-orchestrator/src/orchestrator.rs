//! The capture orchestrator.

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use snaprelay_protocols::{
    CaptureRequest, ChannelMessage, CorrelationId, DuplexChannel, ResultPayload, SequenceTag,
};

use crate::error::CaptureError;
use crate::session::{HotkeyAction, Session, SessionPhase};
use crate::surface::{OperatorSurface, ScreenCapture};

const PROMPT_OPEN: &str = "Finish or dismiss the instruction prompt first";
const SESSION_OPEN: &str = "Multi-page capture in progress: add a page, finalize or cancel";

/// Requests unanswered for this long are forgotten; a late reply is discarded.
const PENDING_TTL: Duration = Duration::from_secs(600);

/// Whether the action loop should keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Hints shown in the instruction area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instructions {
    pub idle: String,
    pub collecting: String,
}

impl Default for Instructions {
    fn default() -> Self {
        Self {
            idle: "Single capture | Collect: start a multi-page session".to_string(),
            collecting: "Multi-page: collect to add a page, finalize to send, cancel to reset"
                .to_string(),
        }
    }
}

/// A request sent and not yet answered.
#[derive(Debug, Clone, Copy)]
struct Pending {
    sequence: Option<SequenceTag>,
    sent_at: Instant,
}

/// Owns the capture session and the requests in flight.
pub struct CaptureOrchestrator {
    capture: Arc<dyn ScreenCapture>,
    surface: Arc<dyn OperatorSurface>,
    channel: Arc<dyn DuplexChannel>,
    default_prompt: String,
    instructions: Instructions,
    session: Mutex<Session>,
    /// Requests sent and not yet answered.
    pending: Mutex<HashMap<CorrelationId, Pending>>,
}

impl CaptureOrchestrator {
    pub fn new(
        capture: Arc<dyn ScreenCapture>,
        surface: Arc<dyn OperatorSurface>,
        channel: Arc<dyn DuplexChannel>,
        default_prompt: impl Into<String>,
    ) -> Self {
        Self {
            capture,
            surface,
            channel,
            default_prompt: default_prompt.into(),
            instructions: Instructions::default(),
            session: Mutex::new(Session::Idle),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_instructions(mut self, instructions: Instructions) -> Self {
        self.instructions = instructions;
        self
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.lock().phase()
    }

    /// Number of requests awaiting an answer.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Run one operator action. Failures are rendered on the surface.
    pub async fn dispatch(&self, action: HotkeyAction) -> Flow {
        debug!("Operator action {:?} in {:?}", action, self.phase());
        let result = match action {
            HotkeyAction::SingleCapture => self.single_capture().await,
            HotkeyAction::Collect => self.collect().await,
            HotkeyAction::Finalize => self.finalize(),
            HotkeyAction::Cancel => {
                self.cancel();
                Ok(())
            }
            HotkeyAction::Quit => {
                info!("Quit requested");
                return Flow::Quit;
            }
        };

        if let Err(e) = result {
            warn!("{:?} failed: {}", action, e);
            self.surface.show_error(&e.to_string());
        }
        Flow::Continue
    }

    /// Capture once and send it with the default prompt.
    pub async fn single_capture(&self) -> Result<(), CaptureError> {
        match self.session.lock().phase() {
            SessionPhase::Idle => {}
            SessionPhase::AwaitingPrompt => return self.reject(PROMPT_OPEN),
            SessionPhase::Collecting { .. } => return self.reject(SESSION_OPEN),
        }

        self.surface.clear_result();
        self.surface.show_status("Taking screenshot...");
        let image = self.capture.capture().await?;

        self.surface.show_status("Sending...");
        let request = CaptureRequest::new(image, self.default_prompt.clone());
        self.send_request(request)?;
        self.surface.show_status("Waiting for answer...");
        Ok(())
    }

    /// Start a multi-page session, or add a page to the running one.
    pub async fn collect(&self) -> Result<(), CaptureError> {
        let starting = {
            let mut session = self.session.lock();
            match *session {
                Session::Idle => {
                    *session = Session::AwaitingPrompt;
                    true
                }
                Session::AwaitingPrompt => return self.reject(PROMPT_OPEN),
                Session::Collecting { .. } => false,
            }
        };

        if starting {
            self.start_session().await;
            Ok(())
        } else {
            self.add_page().await
        }
    }

    async fn start_session(&self) {
        self.surface.clear_result();
        let answer = self
            .surface
            .ask_instruction("Instruction for this capture session")
            .await;
        let prompt = answer
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| self.default_prompt.clone());

        info!("Multi-page session started");
        *self.session.lock() = Session::Collecting {
            prompt,
            images: Vec::new(),
        };
        self.surface.show_instruction(&self.instructions.collecting);
        self.surface.show_status("0 page(s) captured");
    }

    async fn add_page(&self) -> Result<(), CaptureError> {
        self.surface.show_status("Taking screenshot...");
        let image = self.capture.capture().await?;

        let pages = {
            let mut session = self.session.lock();
            match &mut *session {
                Session::Collecting { images, .. } => {
                    images.push(image);
                    Some(images.len())
                }
                _ => None,
            }
        };

        match pages {
            Some(pages) => {
                debug!("Captured page {}", pages);
                self.surface.show_status(&format!("{} page(s) captured", pages));
            }
            // Cancelled while the capture ran.
            None => self.surface.show_status("Session ended, screenshot discarded"),
        }
        Ok(())
    }

    /// Send every collected page and end the session.
    pub fn finalize(&self) -> Result<(), CaptureError> {
        let (prompt, images) = {
            let mut session = self.session.lock();
            match mem::take(&mut *session) {
                Session::Collecting { prompt, images } => (prompt, images),
                Session::AwaitingPrompt => {
                    *session = Session::AwaitingPrompt;
                    return self.reject(PROMPT_OPEN);
                }
                Session::Idle => (String::new(), Vec::new()),
            }
        };
        self.surface.show_instruction(&self.instructions.idle);

        if images.is_empty() {
            return Err(CaptureError::NothingToProcess);
        }

        self.surface.clear_result();
        let total = images.len() as u32;
        let mut delivered = 0;
        for (image, index) in images.into_iter().zip(1..) {
            let sequence = SequenceTag::new(index, total);
            self.surface
                .show_status(&format!("Processing screenshot {}/{}...", index, total));
            let request = CaptureRequest::new(image, format!("{} {}", prompt, sequence))
                .with_sequence(sequence);
            if self.send_request(request).is_ok() {
                delivered += 1;
            }
        }

        info!("Finalized session: {}/{} page(s) sent", delivered, total);
        if delivered < total {
            return Err(CaptureError::NotConnected);
        }
        self.surface
            .show_status(&format!("Sent {} page(s), waiting for answers...", total));
        Ok(())
    }

    /// Drop the session. Requests already sent still get their answers.
    pub fn cancel(&self) {
        {
            let mut session = self.session.lock();
            if matches!(*session, Session::AwaitingPrompt) {
                drop(session);
                let _ = self.reject(PROMPT_OPEN);
                return;
            }
            *session = Session::Idle;
        }

        info!("Capture session reset");
        self.surface.clear_result();
        self.surface.show_instruction(&self.instructions.idle);
        self.surface.show_status("Ready");
    }

    /// Render an answer or error arriving from the relay.
    pub fn handle_inbound(&self, message: &ChannelMessage) {
        match message {
            ChannelMessage::CaptureResult { id, result } => {
                let Some(sequence) = self.claim(*id) else {
                    return;
                };
                match result.as_ref().and_then(ResultPayload::text) {
                    Some(text) => {
                        let rendered = match sequence {
                            Some(tag) if tag.total > 1 => format!("{} {}", tag, text),
                            _ => text.to_string(),
                        };
                        self.surface.show_status("Answer received");
                        self.surface.show_result(&rendered);
                    }
                    None => self.surface.show_error(&CaptureError::EmptyResult.to_string()),
                }
            }
            ChannelMessage::Error { id, error } => {
                if self.claim(*id).is_some() {
                    self.surface.show_error(error);
                }
            }
            ChannelMessage::ProcessRequest(_)
            | ChannelMessage::Heartbeat
            | ChannelMessage::HeartbeatAck => {}
        }
    }

    /// Drive the orchestrator from an action queue until `Quit`.
    ///
    /// Every action runs on its own task, so a pending instruction prompt
    /// does not block the others (they get rejected instead).
    pub async fn run(self: Arc<Self>, mut actions: mpsc::UnboundedReceiver<HotkeyAction>) {
        self.surface.show_instruction(&self.instructions.idle);

        let listener = {
            let this = self.clone();
            let mut inbound = self.channel.inbound();
            tokio::spawn(async move {
                loop {
                    match inbound.recv().await {
                        Ok(message) => this.handle_inbound(&message),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("Result listener lagged, {} frame(s) dropped", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            })
        };

        while let Some(action) = actions.recv().await {
            if action == HotkeyAction::Quit {
                break;
            }
            let this = self.clone();
            tokio::spawn(async move {
                this.dispatch(action).await;
            });
        }

        listener.abort();
        info!("Orchestrator stopped");
    }

    /// Which pending request a reply answers. `Some(None)` for replies
    /// without an id; `None` for replies to be discarded.
    fn claim(&self, id: Option<CorrelationId>) -> Option<Option<SequenceTag>> {
        let Some(id) = id else {
            return Some(None);
        };
        match self.pending.lock().remove(&id) {
            Some(pending) => Some(pending.sequence),
            None => {
                debug!("Discarding reply for unknown request {}", id);
                None
            }
        }
    }

    fn send_request(&self, request: CaptureRequest) -> Result<(), CaptureError> {
        let id = request.id;
        let now = Instant::now();
        {
            let mut pending = self.pending.lock();
            let before = pending.len();
            pending.retain(|_, p| now.duration_since(p.sent_at) < PENDING_TTL);
            if pending.len() < before {
                debug!("Expired {} unanswered request(s)", before - pending.len());
            }
            pending.insert(
                id,
                Pending {
                    sequence: request.sequence,
                    sent_at: now,
                },
            );
        }

        if self.channel.send(&ChannelMessage::ProcessRequest(request)) {
            debug!("Sent request {}", id);
            Ok(())
        } else {
            self.pending.lock().remove(&id);
            Err(CaptureError::NotConnected)
        }
    }

    fn reject(&self, reason: &str) -> Result<(), CaptureError> {
        debug!("Action rejected: {}", reason);
        self.surface.show_status(reason);
        Ok(())
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
