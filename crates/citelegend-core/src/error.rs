//! Error types for the reconciliation engine.

use thiserror::Error;

/// Errors raised while talking to the host page.
#[derive(Debug, Error)]
pub enum PageError {
    /// The page connection is gone.
    #[error("Page detached: {0}")]
    Detached(String),

    /// A script or command failed inside the page.
    #[error("Script error: {0}")]
    Script(String),

    /// The page answered with something we could not decode.
    #[error("Invalid page response: {0}")]
    InvalidResponse(String),

    /// The referenced element no longer exists.
    #[error("Stale element handle: {0}")]
    StaleElement(String),

    /// The page did not answer in time.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The capability is not offered by this page.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl From<serde_json::Error> for PageError {
    fn from(e: serde_json::Error) -> Self {
        PageError::InvalidResponse(e.to_string())
    }
}

/// Errors raised by the settings store.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings root must be a JSON object")]
    NotAnObject,
}

/// Errors surfaced by the citation session.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Page error: {0}")]
    Page(#[from] PageError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Invalid citation key: {0:?}")]
    InvalidKey(String),

    #[error("Clipboard write failed: {0}")]
    Clipboard(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}
