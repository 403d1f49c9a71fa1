//! Page state queries for CDP page session.

use std::time::Duration;

use crate::cdp::error::CdpError;

use super::core::PageSession;

const LOAD_TIMEOUT: Duration = Duration::from_secs(30);
const LOAD_POLL: Duration = Duration::from_millis(100);

impl PageSession {
    /// Wait until the document is at least interactive.
    pub async fn wait_for_load(&self) -> Result<(), CdpError> {
        let start = tokio::time::Instant::now();

        loop {
            let result = self.evaluate("document.readyState").await?;

            if let Some(state) = result.as_str() {
                if state == "complete" || state == "interactive" {
                    return Ok(());
                }
            }

            if start.elapsed() > LOAD_TIMEOUT {
                return Err(CdpError::Timeout("Page load timeout".to_string()));
            }

            tokio::time::sleep(LOAD_POLL).await;
        }
    }

    /// Get current URL.
    pub async fn get_url(&self) -> Result<String, CdpError> {
        let result = self.evaluate("window.location.href").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }
}
