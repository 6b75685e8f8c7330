//! CDP error types.

use thiserror::Error;

use snaprelay_automation::DriverError;
use snaprelay_coordinator::BrowserError;

/// CDP client errors.
#[derive(Debug, Error)]
pub enum CdpError {
    /// Failed to connect to Chrome.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Chrome not found or not running with remote debugging.
    #[error("Chrome not available at {0}. Start Chrome with: chrome --remote-debugging-port=9222")]
    ChromeNotAvailable(String),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol error.
    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error (for endpoint discovery).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JavaScript execution error.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// Timeout.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Session closed.
    #[error("Session closed")]
    SessionClosed,

    /// Invalid response.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl CdpError {
    /// Whether the browser connection itself is gone.
    pub fn is_connection_lost(&self) -> bool {
        matches!(
            self,
            CdpError::ConnectionFailed(_)
                | CdpError::ChromeNotAvailable(_)
                | CdpError::WebSocket(_)
                | CdpError::SessionClosed
        )
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        CdpError::Http(e.to_string())
    }
}

impl From<url::ParseError> for CdpError {
    fn from(e: url::ParseError) -> Self {
        CdpError::ConnectionFailed(format!("Invalid URL: {}", e))
    }
}

impl From<CdpError> for DriverError {
    fn from(e: CdpError) -> Self {
        if e.is_connection_lost() || matches!(e, CdpError::Timeout(_)) {
            DriverError::Connection(e.to_string())
        } else {
            DriverError::Script(e.to_string())
        }
    }
}

impl From<CdpError> for BrowserError {
    fn from(e: CdpError) -> Self {
        if e.is_connection_lost() {
            BrowserError::Unavailable(e.to_string())
        } else {
            BrowserError::Tab(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrome_not_available_hint() {
        let err = CdpError::ChromeNotAvailable("http://localhost:9222".to_string());
        let display = err.to_string();
        assert!(display.contains("localhost:9222"));
        assert!(display.contains("--remote-debugging-port"));
    }

    #[test]
    fn test_driver_error_mapping() {
        let err: DriverError = CdpError::JavaScript("ReferenceError: x".to_string()).into();
        assert!(matches!(err, DriverError::Script(_)));

        let err: DriverError = CdpError::SessionClosed.into();
        assert!(matches!(err, DriverError::Connection(_)));

        let err: DriverError = CdpError::Timeout("Runtime.evaluate".to_string()).into();
        assert!(matches!(err, DriverError::Connection(_)));
    }

    #[test]
    fn test_browser_error_mapping() {
        let err: BrowserError = CdpError::WebSocket("reset".to_string()).into();
        assert!(matches!(err, BrowserError::Unavailable(_)));

        let err: BrowserError = CdpError::Protocol {
            code: -32000,
            message: "No target with given id".to_string(),
        }
        .into();
        assert!(matches!(err, BrowserError::Tab(_)));
        assert!(err.to_string().contains("No target with given id"));
    }
}
