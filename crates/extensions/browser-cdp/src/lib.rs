//! # SnapRelay Browser (CDP)
//!
//! Runs the bridge side against a real Chrome: [`CdpTabHost`] finds or
//! opens the target tab over the remote debugging endpoint, and
//! [`CdpPageDriver`] performs the page operations by evaluating scripts in
//! the attached tab. DOM changes are reported through a mutation observer
//! that calls back into the session over a CDP binding.

pub mod cdp;
mod driver;
mod host;
mod script;

pub use cdp::{CdpClient, CdpError};
pub use driver::CdpPageDriver;
pub use host::CdpTabHost;
