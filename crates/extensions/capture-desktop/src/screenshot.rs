//! Primary monitor capture.

use std::io::Cursor;

use async_trait::async_trait;
use screenshots::Screen;
use screenshots::image::{ImageOutputFormat, RgbaImage};
use thiserror::Error;
use tracing::debug;

use snaprelay_orchestrator::{CaptureError, ScreenCapture};
use snaprelay_protocols::ImagePayload;

/// Screenshot errors.
#[derive(Debug, Error)]
pub enum ScreenshotError {
    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("No monitor found")]
    NoMonitor,
}

impl From<ScreenshotError> for CaptureError {
    fn from(e: ScreenshotError) -> Self {
        CaptureError::Capture(e.to_string())
    }
}

/// Capture the primary monitor as PNG.
pub fn capture_primary() -> Result<ImagePayload, ScreenshotError> {
    let screens = Screen::all().map_err(|e| ScreenshotError::CaptureFailed(e.to_string()))?;
    let primary = screens.iter().position(|s| s.display_info.is_primary);
    let screen = match primary {
        Some(index) => screens.into_iter().nth(index),
        None => screens.into_iter().next(),
    }
    .ok_or(ScreenshotError::NoMonitor)?;

    let image = screen
        .capture()
        .map_err(|e| ScreenshotError::CaptureFailed(e.to_string()))?;
    debug!(
        "Captured monitor {} ({}x{})",
        screen.display_info.id,
        image.width(),
        image.height()
    );

    Ok(ImagePayload::png(encode_png(&image)?))
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ScreenshotError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageOutputFormat::Png)
        .map_err(|e| ScreenshotError::EncodingFailed(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Screen capture for the desktop process.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopCapture;

impl DesktopCapture {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ScreenCapture for DesktopCapture {
    async fn capture(&self) -> Result<ImagePayload, CaptureError> {
        tokio::task::spawn_blocking(capture_primary)
            .await
            .map_err(|e| CaptureError::Capture(format!("Capture task failed: {}", e)))?
            .map_err(CaptureError::from)
    }
}

#[cfg(test)]
#[path = "screenshot_tests.rs"]
mod tests;
