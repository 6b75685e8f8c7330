//! Relay wire messages.
//!
//! Every frame exchanged over the relay is a JSON object discriminated by its
//! `action` field. Frames are decoded into [`ChannelMessage`] at the transport
//! boundary so that everything above it matches exhaustively.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capture::{CaptureRequest, CaptureResult, CorrelationId};
use crate::error::MessageError;

/// Result body as sent by peers: either `{text, html}` or a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultPayload {
    Plain(String),
    Rendered {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        html: Option<String>,
    },
}

impl ResultPayload {
    /// The usable answer text, if any.
    pub fn text(&self) -> Option<&str> {
        let text = match self {
            ResultPayload::Plain(text) => Some(text.as_str()),
            ResultPayload::Rendered { text, .. } => text.as_deref(),
        };
        text.filter(|t| !t.trim().is_empty())
    }

    /// The raw markup snapshot, if one was captured.
    pub fn html(&self) -> Option<&str> {
        match self {
            ResultPayload::Plain(_) => None,
            ResultPayload::Rendered { html, .. } => html.as_deref(),
        }
    }
}

impl From<CaptureResult> for ResultPayload {
    fn from(result: CaptureResult) -> Self {
        ResultPayload::Rendered {
            text: Some(result.text),
            html: result.html,
        }
    }
}

/// A single relay frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ChannelMessage {
    /// Desktop -> bridge: process a screenshot.
    #[serde(alias = "processScreenshot")]
    ProcessRequest(CaptureRequest),

    /// Bridge -> desktop: extracted answer.
    #[serde(rename = "result", alias = "geminiResult")]
    CaptureResult {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<CorrelationId>,
        #[serde(default)]
        result: Option<ResultPayload>,
    },

    /// Bridge -> desktop: the pipeline failed.
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<CorrelationId>,
        #[serde(default)]
        error: String,
    },

    /// Liveness probe from the active side.
    Heartbeat,

    /// Reply to [`ChannelMessage::Heartbeat`] from the passive side.
    HeartbeatAck,
}

impl ChannelMessage {
    /// Decode a text frame.
    pub fn decode(text: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode as a text frame.
    pub fn encode(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Successful answer for the request `id`.
    pub fn result(id: CorrelationId, result: CaptureResult) -> Self {
        ChannelMessage::CaptureResult {
            id: Some(id),
            result: Some(result.into()),
        }
    }

    /// Failure report for the request `id`.
    pub fn error(id: Option<CorrelationId>, error: impl fmt::Display) -> Self {
        ChannelMessage::Error {
            id,
            error: error.to_string(),
        }
    }

    /// Heartbeat traffic never reaches application handlers.
    pub fn is_heartbeat(&self) -> bool {
        matches!(self, ChannelMessage::Heartbeat | ChannelMessage::HeartbeatAck)
    }

    /// Correlation id carried by the frame, if any.
    pub fn correlation_id(&self) -> Option<CorrelationId> {
        match self {
            ChannelMessage::ProcessRequest(request) => Some(request.id),
            ChannelMessage::CaptureResult { id, .. } | ChannelMessage::Error { id, .. } => *id,
            ChannelMessage::Heartbeat | ChannelMessage::HeartbeatAck => None,
        }
    }

    /// Action name as it appears on the wire.
    pub fn action(&self) -> &'static str {
        match self {
            ChannelMessage::ProcessRequest(_) => "process-request",
            ChannelMessage::CaptureResult { .. } => "result",
            ChannelMessage::Error { .. } => "error",
            ChannelMessage::Heartbeat => "heartbeat",
            ChannelMessage::HeartbeatAck => "heartbeat-ack",
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
