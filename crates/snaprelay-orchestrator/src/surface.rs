//! Collaborators of the orchestrator outside this crate.

use async_trait::async_trait;

use snaprelay_protocols::ImagePayload;

use crate::error::CaptureError;

/// Takes a screenshot of the operator's screen.
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    async fn capture(&self) -> Result<ImagePayload, CaptureError>;
}

/// Where the operator sees status, answers and errors.
#[async_trait]
pub trait OperatorSurface: Send + Sync {
    /// Persistent hint of the available actions.
    fn show_instruction(&self, text: &str);

    fn show_status(&self, text: &str);

    fn show_result(&self, text: &str);

    fn show_error(&self, text: &str);

    fn clear_result(&self);

    /// Ask the operator for free text. `None` if they dismissed the prompt.
    async fn ask_instruction(&self, question: &str) -> Option<String>;
}
