//! Error types for the SnapRelay protocol layer.

mod message;
mod relay;

pub use message::*;
pub use relay::*;
