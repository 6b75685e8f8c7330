//! # SnapRelay Desktop Capture
//!
//! [`ScreenCapture`](snaprelay_orchestrator::ScreenCapture) backed by the
//! `screenshots` crate. Captures run on the blocking pool.

mod screenshot;

pub use screenshot::{DesktopCapture, ScreenshotError, capture_primary};
