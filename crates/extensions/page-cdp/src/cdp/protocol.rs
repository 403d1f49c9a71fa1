//! CDP protocol types and message definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// CDP request message.
#[derive(Debug, Serialize)]
pub struct CdpRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// CDP response message.
#[derive(Debug, Deserialize)]
pub struct CdpResponse {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<CdpErrorResponse>,
    pub method: Option<String>,
    pub params: Option<Value>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// CDP error in response.
#[derive(Debug, Deserialize)]
pub struct CdpErrorResponse {
    pub code: i64,
    pub message: String,
    pub data: Option<String>,
}

/// Page info from /json endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub page_type: String,
    pub title: String,
    pub url: String,
    pub web_socket_debugger_url: Option<String>,
}

impl PageInfo {
    /// A regular tab whose URL contains `pattern`.
    pub fn matches(&self, pattern: &str) -> bool {
        self.page_type == "page" && self.url.contains(pattern)
    }
}

/// Browser version info.
///
/// Note: Chrome returns PascalCase field names for this endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserVersion {
    #[serde(rename = "Browser")]
    pub browser: String,
    #[serde(rename = "Protocol-Version")]
    pub protocol_version: String,
    #[serde(rename = "User-Agent")]
    pub user_agent: String,
    #[serde(rename = "V8-Version")]
    pub v8_version: Option<String>,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

/// Key event type.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyEventType {
    KeyDown,
    KeyUp,
}

/// Remote object returned by `Runtime` commands.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    #[serde(rename = "type")]
    pub object_type: String,
    pub subtype: Option<String>,
    pub description: Option<String>,
    pub value: Option<Value>,
}

/// Exception thrown by evaluated code.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    pub text: String,
    pub line_number: Option<i64>,
    pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
    /// The thrown value's description, falling back to the summary text.
    pub fn message(&self) -> String {
        self.exception
            .as_ref()
            .and_then(|e| e.description.clone())
            .unwrap_or_else(|| self.text.clone())
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
