//! Browser tabs as seen by the coordinator.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use snaprelay_automation::PageDriver;

use crate::error::BrowserError;

/// An open browser tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: String,
    pub url: String,
}

impl TabInfo {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// The browser the coordinator works in.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// First open tab whose URL starts with `url_prefix`.
    async fn find_tab(&self, url_prefix: &str) -> Result<Option<TabInfo>, BrowserError>;

    /// Open `url` in a new tab without focusing it.
    async fn open_background_tab(&self, url: &str) -> Result<TabInfo, BrowserError>;

    /// Attach to `tab` and install the page helper. Attaching again replaces
    /// any helper left by an earlier run.
    async fn attach(&self, tab: &TabInfo) -> Result<Arc<dyn PageDriver>, BrowserError>;
}
