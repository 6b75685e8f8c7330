//! # SnapRelay Automation
//!
//! Drives a conversational web page through one image question:
//! upload the image, enter the prompt, submit, wait for the answer to finish
//! streaming, and extract it.
//!
//! The page is reached through the [`PageDriver`] trait, so the state machine
//! runs the same against a real browser tab and against test fakes. Every
//! "wait for X" step goes through [`wait_until`], which re-probes on DOM change
//! notifications and fails with a timeout naming the awaited condition.

mod driver;
mod error;
mod machine;
mod selectors;
mod wait;

pub use driver::{DriverError, PageDriver};
pub use error::AutomationError;
pub use machine::{AutomationOutcome, AutomationState, Completion, PageAutomation};
pub use selectors::{PageSelectors, selector_group};
pub use wait::{WaitOptions, wait_until};
