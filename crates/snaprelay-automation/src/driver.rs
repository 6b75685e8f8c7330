//! Page access used by the automation.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use snaprelay_protocols::ImagePayload;

/// Errors reported by a [`PageDriver`].
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Page connection lost: {0}")]
    Connection(String),
}

/// A live document the automation can query and manipulate.
///
/// Selectors are CSS selector lists; an element matches if it matches any
/// alternative in the list.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Current document URL.
    async fn location(&self) -> Result<String, DriverError>;

    /// Whether any element matches `selector`.
    async fn exists(&self, selector: &str) -> Result<bool, DriverError>;

    /// Number of elements matching `selector`.
    async fn count(&self, selector: &str) -> Result<usize, DriverError>;

    /// Click the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<(), DriverError>;

    /// Assign `image` as the selected file of the first matching file input
    /// and dispatch a `change` event.
    async fn attach_file(&self, selector: &str, image: &ImagePayload) -> Result<(), DriverError>;

    /// Replace the content of the first matching text control and dispatch
    /// an `input` event.
    async fn replace_text(&self, selector: &str, text: &str) -> Result<(), DriverError>;

    /// Text of the last element matching `selector`. With a `scope`, only
    /// the last element matching `scope` is searched.
    async fn last_text(
        &self,
        scope: Option<&str>,
        selector: &str,
    ) -> Result<Option<String>, DriverError>;

    /// Raw markup of the last element matching `selector`.
    async fn last_markup(&self, selector: &str) -> Result<Option<String>, DriverError>;

    /// Counter bumped on every observed DOM mutation.
    fn changes(&self) -> watch::Receiver<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::NotFound("textarea".to_string());
        assert!(err.to_string().contains("Element not found"));
        assert!(err.to_string().contains("textarea"));

        let err = DriverError::Script("ReferenceError".to_string());
        assert!(err.to_string().contains("ReferenceError"));
    }
}
