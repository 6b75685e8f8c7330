//! # SnapRelay Orchestrator
//!
//! Desktop-side capture sessions. Operator actions (single capture, start or
//! extend a multi-page session, finalize, cancel) are turned into capture
//! requests on the relay, and answers coming back are rendered on the
//! operator surface.

mod error;
mod orchestrator;
mod session;
mod surface;

pub use error::CaptureError;
pub use orchestrator::{CaptureOrchestrator, Flow, Instructions};
pub use session::{HotkeyAction, SessionPhase};
pub use surface::{OperatorSurface, ScreenCapture};
