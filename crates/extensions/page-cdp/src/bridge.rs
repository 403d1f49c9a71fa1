//! In-page bridge.
//!
//! A script installed into the NotebookLM tab exposes
//! `window.__citelegend.call(method, args)`. Every call answers with a
//! small envelope instead of throwing, so stale element handles can be
//! told apart from genuine script failures.

use serde::Deserialize;
use serde_json::Value;

use citelegend_core::PageError;

/// Load the bridge JavaScript code.
pub(crate) fn bridge_script() -> &'static str {
    include_str!("bridge_script.js")
}

/// Returned by an invocation when the bridge is not installed in the
/// current document, e.g. right after a navigation.
pub(crate) const MISSING_SENTINEL: &str = "__citelegend_missing__";

/// Build the expression that invokes one bridge method.
pub(crate) fn invocation(method: &str, args: &[Value]) -> String {
    let method = Value::String(method.to_string());
    let args = Value::Array(args.to_vec());
    format!(
        "window.__citelegend ? window.__citelegend.call({}, {}) : {:?}",
        method, args, MISSING_SENTINEL
    )
}

/// Whether an evaluation result says the bridge is absent.
pub(crate) fn is_missing(value: &Value) -> bool {
    value.as_str() == Some(MISSING_SENTINEL)
}

/// The bridge's answer to one call.
#[derive(Debug, Deserialize)]
pub(crate) struct BridgeReply {
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    stale: bool,
    #[serde(default)]
    message: Option<String>,
}

impl BridgeReply {
    pub fn into_result(self, method: &str) -> Result<Value, PageError> {
        if self.ok {
            return Ok(self.value);
        }
        let message = self
            .message
            .unwrap_or_else(|| format!("{} failed", method));
        if self.stale {
            Err(PageError::StaleElement(message))
        } else {
            Err(PageError::Script(format!("{}: {}", method, message)))
        }
    }
}
