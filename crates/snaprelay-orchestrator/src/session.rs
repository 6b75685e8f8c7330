//! Capture session state.

use snaprelay_protocols::ImagePayload;

/// Operator actions, usually bound to global hotkeys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    /// Capture once and ask with the default prompt.
    SingleCapture,
    /// Start a multi-page session, or add a page to the running one.
    Collect,
    /// Send every collected page.
    Finalize,
    /// Drop the running session.
    Cancel,
    Quit,
}

/// Observable summary of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    AwaitingPrompt,
    Collecting { pages: usize },
}

/// The session itself. At most one exists at a time.
#[derive(Debug, Default)]
pub(crate) enum Session {
    #[default]
    Idle,
    AwaitingPrompt,
    Collecting {
        prompt: String,
        images: Vec<ImagePayload>,
    },
}

impl Session {
    pub(crate) fn phase(&self) -> SessionPhase {
        match self {
            Session::Idle => SessionPhase::Idle,
            Session::AwaitingPrompt => SessionPhase::AwaitingPrompt,
            Session::Collecting { images, .. } => SessionPhase::Collecting {
                pages: images.len(),
            },
        }
    }
}
