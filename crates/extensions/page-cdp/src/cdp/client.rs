//! CDP WebSocket client.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::{RwLock, mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};

use super::error::CdpError;
use super::protocol::{BrowserVersion, CdpRequest, CdpResponse, PageInfo};
use super::session::PageSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

pub(crate) type PendingMap = Arc<Mutex<HashMap<u64, PendingRequest>>>;
type EventHandlers = Arc<RwLock<HashMap<String, mpsc::UnboundedSender<CdpResponse>>>>;

/// Upper bound on one CDP round trip.
pub(crate) const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Pending request waiting for response.
pub(crate) struct PendingRequest {
    pub tx: oneshot::Sender<Result<Value, CdpError>>,
}

/// Shared write half of the browser connection.
#[derive(Clone)]
pub(crate) struct Transport {
    pub ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
    pub pending: PendingMap,
    pub request_id: Arc<AtomicU64>,
    pub closed: Arc<AtomicBool>,
}

impl Transport {
    /// Send one command and wait for its response.
    pub async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CdpError::SessionClosed);
        }

        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(|s| s.to_string()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, PendingRequest { tx });

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(CALL_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }
}

/// CDP client attached to one browser.
pub struct CdpClient {
    /// HTTP endpoint for page discovery.
    http_endpoint: String,
    /// Browser WebSocket URL.
    browser_ws_url: String,
    transport: Transport,
    /// Event handlers by session ID.
    event_handlers: EventHandlers,
    /// Background task handle.
    _recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to Chrome at the given endpoint (e.g. `http://localhost:9222`).
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http_endpoint = endpoint.trim_end_matches('/').to_string();
        url::Url::parse(&http_endpoint)?;

        let version_url = format!("{}/json/version", http_endpoint);
        debug!("Fetching browser version from {}", version_url);

        let version: BrowserVersion = reqwest::get(&version_url)
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
            .json()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?;

        info!("Connected to browser: {}", version.browser);

        let browser_ws_url = version.web_socket_debugger_url;

        let (ws_stream, _) = tokio_tungstenite::connect_async(&browser_ws_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let transport = Transport {
            ws_tx: Arc::new(tokio::sync::Mutex::new(ws_sink)),
            pending: Arc::new(Mutex::new(HashMap::new())),
            request_id: Arc::new(AtomicU64::new(1)),
            closed: Arc::new(AtomicBool::new(false)),
        };
        let event_handlers: EventHandlers = Arc::new(RwLock::new(HashMap::new()));

        let recv_task = {
            let pending = transport.pending.clone();
            let closed = transport.closed.clone();
            let event_handlers = event_handlers.clone();
            tokio::spawn(async move {
                Self::receive_loop(ws_source, pending.clone(), event_handlers).await;
                closed.store(true, Ordering::SeqCst);
                // Dropping the senders wakes every waiter with SessionClosed.
                pending.lock().clear();
            })
        };

        debug!("CDP client connected to {}", browser_ws_url);

        Ok(Self {
            http_endpoint,
            browser_ws_url,
            transport,
            event_handlers,
            _recv_task: recv_task,
        })
    }

    /// WebSocket receive loop.
    async fn receive_loop(
        mut ws_source: WsSource,
        pending: PendingMap,
        event_handlers: EventHandlers,
    ) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("CDP recv: {}", text);
                    match serde_json::from_str::<CdpResponse>(&text) {
                        Ok(resp) => {
                            if let Some(id) = resp.id {
                                let pending_req = pending.lock().remove(&id);
                                if let Some(req) = pending_req {
                                    let result = if let Some(error) = resp.error {
                                        Err(CdpError::Protocol {
                                            code: error.code,
                                            message: error.message,
                                        })
                                    } else {
                                        Ok(resp.result.unwrap_or(Value::Null))
                                    };
                                    let _ = req.tx.send(result);
                                }
                            } else if resp.method.is_some() {
                                let session_id = resp.session_id.clone().unwrap_or_default();
                                let handlers = event_handlers.read().await;
                                if let Some(tx) = handlers.get(&session_id) {
                                    let _ = tx.send(resp);
                                }
                            }
                        }
                        Err(e) => {
                            warn!("Failed to parse CDP message: {}", e);
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("WebSocket closed");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    }

    /// Send a browser-level CDP command and wait for response.
    pub async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        self.transport.call(method, params, session_id).await
    }

    /// Get browser WebSocket URL.
    pub fn browser_ws_url(&self) -> &str {
        &self.browser_ws_url
    }

    /// Whether the browser connection has gone away.
    pub fn is_closed(&self) -> bool {
        self.transport.closed.load(Ordering::SeqCst)
    }

    /// List all pages.
    pub async fn list_pages(&self) -> Result<Vec<PageInfo>, CdpError> {
        let url = format!("{}/json/list", self.http_endpoint);
        let pages: Vec<PageInfo> = reqwest::get(&url).await?.json().await?;
        Ok(pages)
    }

    /// First tab whose URL contains `url_pattern`.
    pub async fn find_page(&self, url_pattern: &str) -> Result<PageInfo, CdpError> {
        self.list_pages()
            .await?
            .into_iter()
            .find(|page| page.matches(url_pattern))
            .ok_or_else(|| CdpError::PageNotFound(format!("no tab matching '{}'", url_pattern)))
    }

    /// Attach to an existing page.
    pub async fn attach_page(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true
                })),
                None,
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        self.event_handlers
            .write()
            .await
            .insert(session_id.clone(), event_tx);

        let session = PageSession::new(
            target_id.to_string(),
            session_id,
            self.transport.clone(),
            event_rx,
        );

        session.enable_domains().await?;

        Ok(session)
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self._recv_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_increment() {
        let id = AtomicU64::new(1);
        assert_eq!(id.fetch_add(1, Ordering::SeqCst), 1);
        assert_eq!(id.fetch_add(1, Ordering::SeqCst), 2);
        assert_eq!(id.load(Ordering::SeqCst), 3);
    }
}
