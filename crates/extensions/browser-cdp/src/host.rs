//! [`TabHost`] over a Chrome remote debugging endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use snaprelay_automation::PageDriver;
use snaprelay_coordinator::{BrowserError, TabHost, TabInfo};

use crate::cdp::{CdpClient, CdpError, PageInfo};
use crate::driver::CdpPageDriver;

/// The browser reached at a CDP endpoint. Connects lazily and reconnects
/// when the browser connection drops.
pub struct CdpTabHost {
    endpoint: String,
    client: tokio::sync::Mutex<Option<Arc<CdpClient>>>,
    /// Session currently attached to each target.
    sessions: Mutex<HashMap<String, String>>,
}

impl CdpTabHost {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: tokio::sync::Mutex::new(None),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn client(&self) -> Result<Arc<CdpClient>, CdpError> {
        let mut slot = self.client.lock().await;
        if let Some(client) = slot.as_ref().filter(|c| c.is_alive()) {
            return Ok(client.clone());
        }

        if slot.take().is_some() {
            warn!("Browser connection lost, reconnecting to {}", self.endpoint);
            self.sessions.lock().clear();
        }
        let client = Arc::new(CdpClient::connect(&self.endpoint).await?);
        info!("Connected to browser at {}", client.browser_ws_url());
        *slot = Some(client.clone());
        Ok(client)
    }
}

#[async_trait]
impl TabHost for CdpTabHost {
    async fn find_tab(&self, url_prefix: &str) -> Result<Option<TabInfo>, BrowserError> {
        let pages = self.client().await?.list_pages().await?;
        Ok(first_matching(pages, url_prefix))
    }

    async fn open_background_tab(&self, url: &str) -> Result<TabInfo, BrowserError> {
        let target_id = self.client().await?.create_background_page(url).await?;
        info!("Opened background tab {} at {}", target_id, url);
        Ok(TabInfo::new(target_id, url))
    }

    async fn attach(&self, tab: &TabInfo) -> Result<Arc<dyn PageDriver>, BrowserError> {
        let client = self.client().await?;
        let session = client.attach_page(&tab.id).await?;

        let previous = self
            .sessions
            .lock()
            .insert(tab.id.clone(), session.session_id().to_string());
        if let Some(previous) = previous {
            debug!("Detaching stale session {} from {}", previous, tab.id);
            if let Err(e) = client.detach(&previous).await {
                warn!("Failed to detach stale session {}: {}", previous, e);
            }
        }

        let driver = CdpPageDriver::install(session).await?;
        Ok(Arc::new(driver))
    }
}

/// First regular tab whose URL starts with `url_prefix`.
fn first_matching(pages: Vec<PageInfo>, url_prefix: &str) -> Option<TabInfo> {
    pages
        .into_iter()
        .find(|page| page.is_page() && page.url.starts_with(url_prefix))
        .map(|page| TabInfo::new(page.id, page.url))
}
