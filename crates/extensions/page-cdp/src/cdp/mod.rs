//! Chrome DevTools Protocol (CDP) client implementation.
//!
//! Connects to a running Chrome over WebSocket and speaks the CDP
//! JSON-RPC protocol. Only the commands the citation bridge needs are
//! wrapped: target discovery and attach, `Runtime` evaluation, key input
//! and script injection.
//!
//! Start Chrome with remote debugging:
//!
//! ```bash
//! chrome --remote-debugging-port=9222
//! ```

mod client;
mod error;
mod protocol;
mod session;

pub use client::CdpClient;
pub use error::CdpError;
pub use protocol::*;
pub use session::PageSession;
