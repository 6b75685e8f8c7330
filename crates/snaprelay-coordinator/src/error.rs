//! Coordinator errors.

use thiserror::Error;

use snaprelay_automation::AutomationError;
use snaprelay_protocols::{CorrelationId, MessageError};

/// Errors from the browser behind a [`crate::TabHost`].
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Browser unavailable: {0}")]
    Unavailable(String),

    #[error("Tab operation failed: {0}")]
    Tab(String),
}

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Target tab not found for {0}")]
    TargetNotFound(String),

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error(transparent)]
    Automation(#[from] AutomationError),

    #[error("No mailbox entry for request {0}")]
    MailboxEmpty(CorrelationId),

    #[error(transparent)]
    Message(#[from] MessageError),

    #[error("Page worker stopped")]
    WorkerGone,
}
