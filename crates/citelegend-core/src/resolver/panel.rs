//! Citation panel probing.
//!
//! Clicking a citation opens a source panel. The panel is read and then
//! closed again on every exit path, followed by a fixed settle delay.

use tokio::time::Instant;
use tracing::{debug, warn};

use super::ResolverConfig;
use crate::label::{Provenance, SourceLabel};
use crate::page::{ElementSnapshot, Page};

pub const PANEL_SELECTOR: &str = r#"div[role="dialog"], div[role="presentation"], div[aria-label*="Quelle"], div[aria-label*="Source"]"#;

pub const PANEL_CLOSE_SELECTOR: &str =
    r#"button[aria-label="Schließen"], button[aria-label="Close"]"#;

const TITLE_SELECTOR: &str = "div.source-title";
const BUTTON_SELECTOR: &str = "button";
const TEXT_SELECTOR: &str = "div, span";

pub(super) async fn resolve(
    page: &dyn Page,
    element: &ElementSnapshot,
    config: &ResolverConfig,
) -> Option<SourceLabel> {
    if let Err(e) = page.click(&element.handle).await {
        debug!("Could not open panel for {:?}: {}", element.handle, e);
        return None;
    }

    let title = match wait_for_panel(page, config).await {
        Some(panel) => read_title(page, &panel).await,
        None => {
            debug!("No panel appeared for {:?}", element.handle);
            None
        }
    };

    close_panel(page).await;
    tokio::time::sleep(config.panel_close_delay).await;

    title.map(|t| SourceLabel::heuristic(t, Provenance::Panel))
}

async fn wait_for_panel(page: &dyn Page, config: &ResolverConfig) -> Option<ElementSnapshot> {
    let start = Instant::now();

    loop {
        match page.query_all(PANEL_SELECTOR).await {
            Ok(panels) => {
                if let Some(panel) = panels.into_iter().find(|p| !p.in_overlay) {
                    return Some(panel);
                }
            }
            Err(e) => {
                debug!("Panel query failed: {}", e);
                return None;
            }
        }

        if start.elapsed() >= config.panel_timeout {
            return None;
        }

        tokio::time::sleep(config.panel_poll_interval).await;
    }
}

async fn read_title(page: &dyn Page, panel: &ElementSnapshot) -> Option<String> {
    for selector in [TITLE_SELECTOR, BUTTON_SELECTOR] {
        if let Some(first) = within(page, panel, selector).await.into_iter().next() {
            let text = first.text.trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }

    if let Some(text) = within(page, panel, TEXT_SELECTOR)
        .await
        .into_iter()
        .map(|el| el.text.trim().to_string())
        .find(|t| !t.is_empty())
    {
        return Some(text);
    }

    panel
        .first_child_text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

async fn within(page: &dyn Page, panel: &ElementSnapshot, selector: &str) -> Vec<ElementSnapshot> {
    page.query_within(&panel.handle, selector)
        .await
        .unwrap_or_else(|e| {
            debug!("Panel query {:?} failed: {}", selector, e);
            Vec::new()
        })
}

async fn close_panel(page: &dyn Page) {
    let close = page
        .query_all(PANEL_CLOSE_SELECTOR)
        .await
        .ok()
        .and_then(|buttons| buttons.into_iter().find(|b| !b.in_overlay));

    if let Some(button) = close {
        match page.click(&button.handle).await {
            Ok(()) => return,
            Err(e) => debug!("Close button click failed: {}", e),
        }
    }

    if let Err(e) = page.press_key("Escape").await {
        warn!("Could not dismiss citation panel: {}", e);
    }
}
