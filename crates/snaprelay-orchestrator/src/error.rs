//! Capture errors shown to the operator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Screen capture failed: {0}")]
    Capture(String),

    #[error("No screenshots to process.")]
    NothingToProcess,

    #[error("Received empty result")]
    EmptyResult,

    #[error("No extension connected. Make sure the Chrome extension is installed and running.")]
    NotConnected,
}
