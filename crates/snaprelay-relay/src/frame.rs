//! Text frame classification shared by both relay roles.

use tracing::{trace, warn};

use snaprelay_protocols::ChannelMessage;

/// A decoded inbound frame.
#[derive(Debug)]
pub(crate) enum Inbound {
    Heartbeat,
    HeartbeatAck,
    Message(ChannelMessage),
}

/// Decode a text frame from `peer`.
///
/// Malformed frames are logged and dropped; the connection stays open.
pub(crate) fn decode_frame(peer: &str, text: &str) -> Option<Inbound> {
    match ChannelMessage::decode(text) {
        Ok(ChannelMessage::Heartbeat) => {
            trace!("Heartbeat from {}", peer);
            Some(Inbound::Heartbeat)
        }
        Ok(ChannelMessage::HeartbeatAck) => {
            trace!("Heartbeat ack from {}", peer);
            Some(Inbound::HeartbeatAck)
        }
        Ok(message) => Some(Inbound::Message(message)),
        Err(e) => {
            warn!("Dropping malformed frame from {}: {}", peer, e);
            None
        }
    }
}

/// Encoded form of a frame, or `None` (logged) if it cannot be encoded.
pub(crate) fn encode_frame(message: &ChannelMessage) -> Option<String> {
    match message.encode() {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("Failed to encode {} frame: {}", message.action(), e);
            None
        }
    }
}
