//! The page automation state machine.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use snaprelay_config::AutomationConfig;
use snaprelay_protocols::{CaptureResult, ImagePayload};

use crate::driver::{DriverError, PageDriver};
use crate::error::AutomationError;
use crate::selectors::PageSelectors;
use crate::wait::{WaitOptions, wait_until};

/// Progress of one automation run. Runs are linear; failure is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutomationState {
    Idle,
    LocatingUploadControl,
    AwaitingFileInput,
    FileInjected,
    AwaitingUploadPreview,
    PromptEntered,
    Submitted,
    AwaitingResponseNode,
    AwaitingCompletion,
    Extracted,
}

impl fmt::Display for AutomationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AutomationState::Idle => "idle",
            AutomationState::LocatingUploadControl => "locating upload control",
            AutomationState::AwaitingFileInput => "awaiting file input",
            AutomationState::FileInjected => "injecting file",
            AutomationState::AwaitingUploadPreview => "awaiting upload preview",
            AutomationState::PromptEntered => "entering prompt",
            AutomationState::Submitted => "submitting",
            AutomationState::AwaitingResponseNode => "awaiting response",
            AutomationState::AwaitingCompletion => "awaiting completion",
            AutomationState::Extracted => "extracting",
        };
        f.write_str(s)
    }
}

/// How the completion wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The in-progress indicator cleared.
    Complete,
    /// Timed out with a response visible; the text may be partial.
    Partial,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct AutomationOutcome {
    pub result: CaptureResult,
    pub completion: Completion,
}

/// Drives the target page through one image question.
pub struct PageAutomation {
    config: AutomationConfig,
    selectors: PageSelectors,
    host_marker: String,
}

impl PageAutomation {
    /// `host_marker` must appear in the page location for a run to start.
    pub fn new(config: AutomationConfig, host_marker: impl Into<String>) -> Self {
        let selectors = PageSelectors::from(&config.selectors);
        Self {
            config,
            selectors,
            host_marker: host_marker.into(),
        }
    }

    pub fn selectors(&self) -> &PageSelectors {
        &self.selectors
    }

    /// Upload `image`, ask `prompt` and return the extracted answer.
    pub async fn run(
        &self,
        page: &dyn PageDriver,
        image: &ImagePayload,
        prompt: &str,
    ) -> Result<AutomationOutcome, AutomationError> {
        let sel = &self.selectors;
        let mut state = AutomationState::Idle;

        let location = page.location().await.map_err(|e| fail(e.into(), state))?;
        if !location.contains(&self.host_marker) {
            return Err(fail(AutomationError::WrongPage { location }, state));
        }

        state = self.enter(AutomationState::LocatingUploadControl);
        self.await_element(page, "upload control", &sel.upload_trigger)
            .await
            .map_err(|e| fail(e, state))?;
        page.click(&sel.upload_trigger)
            .await
            .map_err(|e| fail(e.into(), state))?;

        state = self.enter(AutomationState::AwaitingFileInput);
        self.await_element(page, "file input", &sel.file_input)
            .await
            .map_err(|e| fail(e, state))?;

        state = self.enter(AutomationState::FileInjected);
        page.attach_file(&sel.file_input, image)
            .await
            .map_err(|e| fail(e.into(), state))?;

        state = self.enter(AutomationState::AwaitingUploadPreview);
        self.await_element(page, "upload preview", &sel.upload_preview)
            .await
            .map_err(|e| fail(e, state))?;

        state = self.enter(AutomationState::PromptEntered);
        self.await_element(page, "prompt input", &sel.prompt_input)
            .await
            .map_err(|e| fail(e, state))?;
        page.replace_text(&sel.prompt_input, prompt)
            .await
            .map_err(|e| fail(e.into(), state))?;

        state = self.enter(AutomationState::Submitted);
        self.await_element(page, "send button", &sel.send_button)
            .await
            .map_err(|e| fail(e, state))?;
        let earlier_responses = page
            .count(&sel.response_container)
            .await
            .map_err(|e| fail(e.into(), state))?;
        page.click(&sel.send_button)
            .await
            .map_err(|e| fail(e.into(), state))?;

        state = self.enter(AutomationState::AwaitingResponseNode);
        self.await_new_response(page, earlier_responses)
            .await
            .map_err(|e| fail(e, state))?;

        state = self.enter(AutomationState::AwaitingCompletion);
        let completion = self
            .await_completion(page, earlier_responses)
            .await
            .map_err(|e| fail(e, state))?;
        tokio::time::sleep(self.config.settle_delay()).await;

        state = self.enter(AutomationState::Extracted);
        let result = self.extract(page).await.map_err(|e| fail(e.into(), state))?;

        info!(
            "Extracted {} chars of answer ({:?})",
            result.text.len(),
            completion
        );
        Ok(AutomationOutcome { result, completion })
    }

    fn enter(&self, state: AutomationState) -> AutomationState {
        debug!("Automation: {}", state);
        state
    }

    fn element_wait(&self) -> WaitOptions {
        WaitOptions::new(self.config.element_timeout(), self.config.poll_interval())
    }

    async fn await_element(
        &self,
        page: &dyn PageDriver,
        condition: &str,
        selector: &str,
    ) -> Result<(), AutomationError> {
        wait_until(condition, self.element_wait(), page.changes(), move || {
            present(page, selector)
        })
        .await
    }

    async fn await_new_response(
        &self,
        page: &dyn PageDriver,
        earlier: usize,
    ) -> Result<(), AutomationError> {
        let selector = self.selectors.response_container.as_str();
        wait_until("response", self.element_wait(), page.changes(), move || {
            more_than(page, selector, earlier)
        })
        .await
    }

    /// Waits for the in-progress indicator to clear. A timeout with a
    /// response on the page resolves as [`Completion::Partial`].
    async fn await_completion(
        &self,
        page: &dyn PageDriver,
        earlier: usize,
    ) -> Result<Completion, AutomationError> {
        let options = WaitOptions::new(
            self.config.completion_timeout(),
            self.config.poll_interval(),
        );
        let seen_response = AtomicBool::new(false);
        let seen = &seen_response;
        let sel = &self.selectors;

        let outcome = wait_until("response completion", options, page.changes(), move || {
            settled(page, sel, earlier, seen)
        })
        .await;

        match outcome {
            Ok(()) => Ok(Completion::Complete),
            Err(AutomationError::WaitTimeout { .. }) if seen_response.load(Ordering::SeqCst) => {
                warn!("Answer still in progress after timeout, extracting partial text");
                Ok(Completion::Partial)
            }
            Err(e) => Err(e),
        }
    }

    /// Most specific text under the last response, falling back to the
    /// response's own text.
    async fn extract(&self, page: &dyn PageDriver) -> Result<CaptureResult, DriverError> {
        let sel = &self.selectors;

        let specific = page
            .last_text(Some(&sel.response_container), &sel.response_text)
            .await?
            .filter(|text| !text.trim().is_empty());
        let text = match specific {
            Some(text) => text,
            None => page
                .last_text(None, &sel.response_container)
                .await?
                .unwrap_or_default(),
        };
        let html = page.last_markup(&sel.response_container).await?;

        Ok(CaptureResult::new(text.trim(), html))
    }
}

fn fail(error: AutomationError, state: AutomationState) -> AutomationError {
    warn!("Automation failed while {}: {}", state, error);
    error.at(state)
}

async fn present(page: &dyn PageDriver, selector: &str) -> Result<Option<()>, DriverError> {
    Ok(page.exists(selector).await?.then_some(()))
}

async fn more_than(
    page: &dyn PageDriver,
    selector: &str,
    earlier: usize,
) -> Result<Option<()>, DriverError> {
    Ok((page.count(selector).await? > earlier).then_some(()))
}

async fn settled(
    page: &dyn PageDriver,
    sel: &PageSelectors,
    earlier: usize,
    seen_response: &AtomicBool,
) -> Result<Option<()>, DriverError> {
    let responding = page.count(&sel.response_container).await? > earlier;
    if responding {
        seen_response.store(true, Ordering::SeqCst);
    }
    let thinking = page.exists(&sel.thinking_indicator).await?;
    Ok((responding && !thinking).then_some(()))
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
