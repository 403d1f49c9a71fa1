//! JavaScript execution operations for CDP page session.

use serde_json::{Value, json};

use crate::cdp::error::CdpError;
use crate::cdp::protocol::ExceptionDetails;

use super::core::PageSession;

impl PageSession {
    /// Evaluate a JavaScript expression and return its value by copy.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        Self::unwrap_value(result)
    }

    /// Evaluate with a transient user activation, as if the user clicked.
    ///
    /// Needed for APIs gated on a user gesture such as the async clipboard.
    pub async fn evaluate_with_gesture(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                    "userGesture": true,
                })),
            )
            .await?;

        Self::unwrap_value(result)
    }

    fn unwrap_value(mut result: Value) -> Result<Value, CdpError> {
        if let Some(exception) = result.get("exceptionDetails") {
            let details: ExceptionDetails = serde_json::from_value(exception.clone())?;
            return Err(CdpError::JavaScript(details.message()));
        }

        Ok(result["result"]["value"].take())
    }
}
