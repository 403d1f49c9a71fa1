//! Keyboard input for CDP page session.

use serde_json::json;
use tracing::debug;

use crate::cdp::error::CdpError;
use crate::cdp::protocol::KeyEventType;

use super::core::PageSession;

impl PageSession {
    /// Press and release a named key (e.g. `Escape`).
    pub async fn press_key(&self, key: &str) -> Result<(), CdpError> {
        for event_type in [KeyEventType::KeyDown, KeyEventType::KeyUp] {
            self.call(
                "Input.dispatchKeyEvent",
                Some(json!({
                    "type": event_type,
                    "key": key,
                    "code": key,
                    "windowsVirtualKeyCode": virtual_key_code(key),
                })),
            )
            .await?;
        }

        debug!("Pressed key {}", key);
        Ok(())
    }
}

fn virtual_key_code(key: &str) -> i64 {
    match key {
        "Escape" => 27,
        "Enter" => 13,
        "Tab" => 9,
        "Backspace" => 8,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_key_code() {
        assert_eq!(virtual_key_code("Escape"), 27);
        assert_eq!(virtual_key_code("F13"), 0);
    }
}
