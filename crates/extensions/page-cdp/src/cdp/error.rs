//! CDP error types.

use citelegend_core::PageError;
use thiserror::Error;

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

    /// No tab matches the requested URL pattern.
    #[error("Page not found: {0}")]
    PageNotFound(String),

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

impl From<CdpError> for PageError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::ConnectionFailed(_)
            | CdpError::ChromeNotAvailable(_)
            | CdpError::WebSocket(_)
            | CdpError::Http(_)
            | CdpError::PageNotFound(_)
            | CdpError::SessionClosed => PageError::Detached(e.to_string()),
            CdpError::Timeout(msg) => PageError::Timeout(msg),
            CdpError::JavaScript(msg) => PageError::Script(msg),
            CdpError::Protocol { .. } => PageError::Script(e.to_string()),
            CdpError::Serialization(_) | CdpError::InvalidResponse(_) => {
                PageError::InvalidResponse(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrome_not_available_hint() {
        let err = CdpError::ChromeNotAvailable("http://localhost:9222".to_string());
        assert!(err.to_string().contains("--remote-debugging-port"));
    }

    #[test]
    fn test_page_error_mapping() {
        assert!(matches!(
            PageError::from(CdpError::SessionClosed),
            PageError::Detached(_)
        ));
        assert!(matches!(
            PageError::from(CdpError::Timeout("Runtime.evaluate".to_string())),
            PageError::Timeout(_)
        ));
        assert!(matches!(
            PageError::from(CdpError::JavaScript("boom".to_string())),
            PageError::Script(_)
        ));
        assert!(matches!(
            PageError::from(CdpError::InvalidResponse("no value".to_string())),
            PageError::InvalidResponse(_)
        ));
    }
}
