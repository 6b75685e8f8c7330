//! Minimal Chrome DevTools Protocol client.
//!
//! Connects to a Chrome started with remote debugging:
//!
//! ```bash
//! chrome --remote-debugging-port=9222
//! ```
//!
//! ```rust,ignore
//! let client = CdpClient::connect("http://localhost:9222").await?;
//! let pages = client.list_pages().await?;
//! let session = client.attach_page(&pages[0].id).await?;
//! let title = session.evaluate("document.title").await?;
//! ```

mod client;
mod error;
mod protocol;
mod session;

pub use client::CdpClient;
pub use error::CdpError;
pub use protocol::{BrowserVersion, CdpEvent, PageInfo};
pub use session::PageSession;
