//! # SnapRelay Protocols
//!
//! Shared definitions for the SnapRelay capture pipeline.
//! Contains only data types and interface definitions - no transports.
//!
//! ## Core Types
//!
//! - [`ChannelMessage`] - Closed sum type for everything that crosses the relay
//! - [`CaptureRequest`] / [`CaptureResult`] - The payloads the pipeline moves
//! - [`DuplexChannel`] - Trait implemented by both relay roles

pub mod capture;
pub mod channel;
pub mod error;
pub mod message;

pub use capture::{CaptureRequest, CaptureResult, CorrelationId, ImagePayload, SequenceTag};
pub use channel::{ConnectionState, DuplexChannel};
pub use error::{MessageError, RelayError};
pub use message::{ChannelMessage, ResultPayload};
