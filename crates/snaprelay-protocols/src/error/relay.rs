//! Relay transport errors.

use thiserror::Error;

use super::MessageError;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Failed to bind {address}: {message}")]
    Bind { address: String, message: String },

    #[error("Relay disconnected")]
    Disconnected,

    #[error("Gave up reconnecting after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error(transparent)]
    Message(#[from] MessageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failed_error() {
        let err = RelayError::ConnectionFailed("refused".to_string());
        let display = err.to_string();
        assert!(display.contains("Connection failed"));
        assert!(display.contains("refused"));
    }

    #[test]
    fn test_bind_error() {
        let err = RelayError::Bind {
            address: "127.0.0.1:8765".to_string(),
            message: "address in use".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("127.0.0.1:8765"));
        assert!(display.contains("address in use"));
    }

    #[test]
    fn test_retries_exhausted_error() {
        let err = RelayError::RetriesExhausted { attempts: 5 };
        assert!(err.to_string().contains('5'));
    }

    #[test]
    fn test_message_error_is_transparent() {
        let err = RelayError::from(MessageError::Malformed("oops".to_string()));
        assert_eq!(err.to_string(), "Malformed message: oops");
    }

    #[test]
    fn test_disconnected_error_debug() {
        let debug = format!("{:?}", RelayError::Disconnected);
        assert!(debug.contains("Disconnected"));
    }
}
