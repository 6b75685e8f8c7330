//! Wire message errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Malformed message: {0}")]
    Malformed(String),

    #[error("Invalid image payload: {0}")]
    InvalidImage(String),
}

impl From<serde_json::Error> for MessageError {
    fn from(e: serde_json::Error) -> Self {
        MessageError::Malformed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_error() {
        let err = MessageError::Malformed("expected value".to_string());
        let display = err.to_string();
        assert!(display.contains("Malformed"));
        assert!(display.contains("expected value"));
    }

    #[test]
    fn test_from_serde_error() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = MessageError::from(serde_err);
        assert!(matches!(err, MessageError::Malformed(_)));
    }

    #[test]
    fn test_invalid_image_error() {
        let err = MessageError::InvalidImage("bad base64".to_string());
        assert!(err.to_string().contains("bad base64"));
    }
}
