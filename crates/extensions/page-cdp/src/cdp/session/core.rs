//! Core session struct and CDP command dispatch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::cdp::client::Transport;
use crate::cdp::error::CdpError;
use crate::cdp::protocol::CdpResponse;

/// A session attached to a single page/target.
pub struct PageSession {
    /// Target ID.
    pub(super) target_id: String,
    /// Session ID for this target.
    pub(super) session_id: String,
    /// Browser connection (shared with client).
    pub(super) transport: Transport,
    /// Set once the target reports it was detached.
    pub(super) detached: Arc<AtomicBool>,
    /// Event pump for this session.
    _event_task: tokio::task::JoinHandle<()>,
}

impl PageSession {
    /// Create a new page session.
    pub(crate) fn new(
        target_id: String,
        session_id: String,
        transport: Transport,
        event_rx: mpsc::UnboundedReceiver<CdpResponse>,
    ) -> Self {
        let detached = Arc::new(AtomicBool::new(false));
        let event_task = tokio::spawn(Self::pump_events(event_rx, detached.clone()));
        Self {
            target_id,
            session_id,
            transport,
            detached,
            _event_task: event_task,
        }
    }

    async fn pump_events(
        mut event_rx: mpsc::UnboundedReceiver<CdpResponse>,
        detached: Arc<AtomicBool>,
    ) {
        while let Some(event) = event_rx.recv().await {
            let method = event.method.as_deref().unwrap_or_default();
            trace!("CDP event: {}", method);
            if method == "Inspector.detached" || method == "Inspector.targetCrashed" {
                warn!("Page target detached: {}", method);
                detached.store(true, Ordering::SeqCst);
                break;
            }
        }
    }

    /// Get target ID.
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Get session ID.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Whether the page can no longer be reached.
    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst) || self.transport.closed.load(Ordering::SeqCst)
    }

    /// Send a CDP command to this page session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        if self.detached.load(Ordering::SeqCst) {
            return Err(CdpError::SessionClosed);
        }
        self.transport
            .call(method, params, Some(&self.session_id))
            .await
    }

    /// Enable required CDP domains.
    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("Runtime.enable", None).await?;

        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    /// Run `source` in every document this page loads from now on.
    pub async fn add_script_on_new_document(&self, source: &str) -> Result<String, CdpError> {
        let result = self
            .call(
                "Page.addScriptToEvaluateOnNewDocument",
                Some(json!({ "source": source })),
            )
            .await?;

        result["identifier"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| CdpError::InvalidResponse("Missing script identifier".to_string()))
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
