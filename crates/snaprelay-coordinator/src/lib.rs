//! # SnapRelay Coordinator
//!
//! Bridge-side handling of capture requests: find or open the target tab,
//! hand the image and prompt to a page worker through the [`Mailbox`], and
//! turn the worker's answer into a reply frame.

mod bridge;
mod coordinator;
mod error;
mod mailbox;
mod service;
mod tabs;

pub use bridge::{PageReply, PageRequest, spawn_page_worker};
pub use coordinator::TabCoordinator;
pub use error::{BrowserError, CoordinatorError};
pub use mailbox::{Mailbox, MailboxSlot};
pub use service::serve_channel;
pub use tabs::{TabHost, TabInfo};
