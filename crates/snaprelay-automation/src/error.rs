//! Automation errors.

use std::time::Duration;

use thiserror::Error;

use crate::driver::DriverError;
use crate::machine::AutomationState;

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("Not on the target page (at {location})")]
    WrongPage { location: String },

    #[error("Timed out after {timeout:?} waiting for {condition}")]
    WaitTimeout { condition: String, timeout: Duration },

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("Automation failed while {state}: {source}")]
    StepFailed {
        state: AutomationState,
        #[source]
        source: Box<AutomationError>,
    },
}

impl AutomationError {
    /// Wrap a step failure with the state it happened in.
    pub fn at(self, state: AutomationState) -> Self {
        match self {
            already @ AutomationError::StepFailed { .. } => already,
            other => AutomationError::StepFailed {
                state,
                source: Box::new(other),
            },
        }
    }

    /// State the failure happened in, if known.
    pub fn state(&self) -> Option<AutomationState> {
        match self {
            AutomationError::StepFailed { state, .. } => Some(*state),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            AutomationError::WaitTimeout { .. } => true,
            AutomationError::StepFailed { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_timeout_display() {
        let err = AutomationError::WaitTimeout {
            condition: "file input".to_string(),
            timeout: Duration::from_secs(15),
        };
        let display = err.to_string();
        assert!(display.contains("file input"));
        assert!(display.contains("15s"));
    }

    #[test]
    fn test_step_failed_wraps_once() {
        let err = AutomationError::WaitTimeout {
            condition: "upload preview".to_string(),
            timeout: Duration::from_secs(15),
        }
        .at(AutomationState::AwaitingUploadPreview)
        .at(AutomationState::PromptEntered);

        assert_eq!(err.state(), Some(AutomationState::AwaitingUploadPreview));
        assert!(err.is_timeout());
        let display = err.to_string();
        assert!(display.contains("awaiting upload preview"));
        assert!(display.contains("upload preview"));
    }

    #[test]
    fn test_wrong_page_display() {
        let err = AutomationError::WrongPage {
            location: "https://example.com/".to_string(),
        };
        assert!(err.to_string().contains("example.com"));
        assert!(!err.is_timeout());
        assert_eq!(err.state(), None);
    }
}
