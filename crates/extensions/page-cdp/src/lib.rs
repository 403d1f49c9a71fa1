//! CDP page adapter for citelegend.
//!
//! Drives a NotebookLM tab in the user's own Chrome through the Chrome
//! DevTools Protocol. A small bridge script is injected into the tab and
//! every [`citelegend_core::Page`] operation becomes one `Runtime.evaluate`
//! round trip.
//!
//! ```text
//! ┌─────────────────┐    WebSocket     ┌──────────────────┐
//! │   citelegend    │ ◄──────────────► │  Chrome (tab +   │
//! │  (this crate)   │       CDP        │  bridge script)  │
//! └─────────────────┘                  └──────────────────┘
//! ```
//!
//! Start Chrome with remote debugging enabled:
//!
//! ```bash
//! google-chrome --remote-debugging-port=9222
//! ```

mod bridge;
pub mod cdp;
mod page;

pub use cdp::{CdpClient, CdpError, PageInfo};
pub use page::CdpPage;
