//! Capture data model.
//!
//! A [`CaptureRequest`] is created once per capture event on the desktop side
//! and consumed exactly once by the coordinator. A [`CaptureResult`] travels
//! the opposite way once the page has produced an answer.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::MessageError;

/// MIME type assumed when a payload carries no data-URI header.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Correlates a capture request with the result or error it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a fresh id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Position of a request within a multi-page batch (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceTag {
    pub index: u32,
    pub total: u32,
}

impl SequenceTag {
    pub fn new(index: u32, total: u32) -> Self {
        Self { index, total }
    }
}

impl fmt::Display for SequenceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}/{})", self.index, self.total)
    }
}

/// Opaque encoded raster plus its MIME type.
///
/// On the wire the payload is a data URI (`data:image/png;base64,...`).
/// Decoding also accepts bare base64, which older peers send.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    mime: String,
    bytes: Vec<u8>,
}

impl ImagePayload {
    /// Create a payload from raw encoded bytes.
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    /// Create a PNG payload.
    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new(DEFAULT_IMAGE_MIME, bytes)
    }

    /// Parse a data URI or bare base64 string.
    pub fn from_encoded(encoded: &str) -> Result<Self, MessageError> {
        let encoded = encoded.trim();
        let (mime, data) = match encoded.split_once(";base64,") {
            Some((header, data)) => {
                let mime = header
                    .strip_prefix("data:")
                    .filter(|m| !m.is_empty())
                    .unwrap_or(DEFAULT_IMAGE_MIME);
                (mime, data)
            }
            None => (DEFAULT_IMAGE_MIME, encoded),
        };

        if data.is_empty() {
            return Err(MessageError::InvalidImage("empty payload".to_string()));
        }

        let bytes = STANDARD
            .decode(data)
            .map_err(|e| MessageError::InvalidImage(e.to_string()))?;

        Ok(Self::new(mime, bytes))
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Encode as bare base64.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Encode as a data URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.to_base64())
    }

    /// File name extension derived from the MIME type.
    pub fn extension(&self) -> &str {
        match self.mime.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Serialize for ImagePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_uri())
    }
}

impl<'de> Deserialize<'de> for ImagePayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        ImagePayload::from_encoded(&encoded).map_err(serde::de::Error::custom)
    }
}

/// A screenshot plus the instruction to submit with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRequest {
    #[serde(default)]
    pub id: CorrelationId,
    #[serde(rename = "screenshot")]
    pub image: ImagePayload,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<SequenceTag>,
}

impl CaptureRequest {
    /// Create a request with a fresh correlation id.
    pub fn new(image: ImagePayload, prompt: impl Into<String>) -> Self {
        Self {
            id: CorrelationId::new(),
            image,
            prompt: prompt.into(),
            sequence: None,
        }
    }

    /// Tag the request with its position in a multi-page batch.
    pub fn with_sequence(mut self, sequence: SequenceTag) -> Self {
        self.sequence = Some(sequence);
        self
    }
}

/// Answer extracted from the target page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureResult {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl CaptureResult {
    pub fn new(text: impl Into<String>, html: Option<String>) -> Self {
        Self {
            text: text.into(),
            html,
        }
    }
}

#[cfg(test)]
#[path = "capture_tests.rs"]
mod tests;
