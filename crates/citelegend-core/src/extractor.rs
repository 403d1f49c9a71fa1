//! Marker extraction.
//!
//! Strategies run in a fixed priority order and a key claimed by an
//! earlier strategy is never emitted again by a later one:
//!
//! 1. `[[ long form ]]` in the page text, keyed by 1-based occurrence
//! 2. interactive citation controls
//! 3. `[N]` in free text
//! 4. legacy superscripts and styled spans

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::PageError;
use crate::key::{CitationKey, ELLIPSIS};
use crate::marker::{MarkerShape, RawMarker};
use crate::page::{ElementSnapshot, Page};

/// Citation controls, including labelled spans of the `N: name` form.
pub const INTERACTIVE_SELECTOR: &str =
    r#"button.citation-marker, button[class*="citation"], span[aria-label]"#;

/// Collapsed runs of citations.
pub const ELLIPSIS_SELECTOR: &str = r#"span[aria-label], button.citation-marker"#;

pub const LEGACY_SELECTORS: &[&str] = &[
    "sup",
    r#"span[style*="background"]"#,
    r#"span[role="button"]"#,
    r#"button[role="button"]"#,
    "span[tabindex]",
];

const LEGACY_MAX: u32 = 1000;

static LONG_FORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("valid regex"));
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d{1,3})\]").expect("valid regex"));
static NUMBERED_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):\s*(.+)$").expect("valid regex"));

/// Finds citation markers on a page.
#[derive(Debug, Clone)]
pub struct MarkerExtractor {
    /// Wait after expanding ellipsis placeholders.
    settle_delay: Duration,
}

impl Default for MarkerExtractor {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

impl MarkerExtractor {
    pub fn new(settle_delay: Duration) -> Self {
        Self { settle_delay }
    }

    /// Extract every marker currently on the page, one per key.
    pub async fn extract(&self, page: &dyn Page) -> Result<Vec<RawMarker>, PageError> {
        self.expand_ellipses(page).await?;

        let text = page.body_text().await?;
        let mut claimed: HashSet<CitationKey> = HashSet::new();
        let mut markers = Vec::new();

        for (index, cap) in LONG_FORM.captures_iter(&text).enumerate() {
            let key = CitationKey::Numeric(index as u32 + 1);
            claimed.insert(key.clone());
            markers.push(RawMarker::long_form(key, &cap[1]));
        }
        let long_form_count = markers.len();

        for element in Self::query_or_empty(page, INTERACTIVE_SELECTOR).await {
            if let Some((key, long_form)) = interactive_key(&element) {
                if claimed.insert(key.clone()) {
                    markers.push(RawMarker::element(
                        key,
                        MarkerShape::Interactive,
                        element,
                        long_form,
                    ));
                }
            }
        }
        let interactive_count = markers.len() - long_form_count;

        for cap in BRACKETED.captures_iter(&text) {
            if let Ok(n) = cap[1].parse::<u32>() {
                let key = CitationKey::Numeric(n);
                if n > 0 && claimed.insert(key.clone()) {
                    markers.push(RawMarker::bracketed(key));
                }
            }
        }
        let bracketed_count = markers.len() - long_form_count - interactive_count;

        for selector in LEGACY_SELECTORS {
            for element in Self::query_or_empty(page, selector).await {
                if let Some(key) = legacy_key(&element) {
                    if claimed.insert(key.clone()) {
                        debug!("Legacy marker {} via {}", key, selector);
                        markers.push(RawMarker::element(key, MarkerShape::Legacy, element, None));
                    }
                }
            }
        }

        debug!(
            "Extracted {} markers (long-form {}, interactive {}, bracketed {}, legacy {})",
            markers.len(),
            long_form_count,
            interactive_count,
            bracketed_count,
            markers.len() - long_form_count - interactive_count - bracketed_count
        );

        Ok(markers)
    }

    /// Click every collapsed ellipsis so its hidden markers render.
    async fn expand_ellipses(&self, page: &dyn Page) -> Result<(), PageError> {
        let mut clicked = 0usize;
        for element in Self::query_or_empty(page, ELLIPSIS_SELECTOR).await {
            if element.in_overlay || !is_ellipsis(&element.text) {
                continue;
            }
            match page.click(&element.handle).await {
                Ok(()) => clicked += 1,
                Err(e) => debug!("Could not expand ellipsis {:?}: {}", element.handle, e),
            }
        }

        if clicked > 0 {
            debug!("Expanded {} citation ellipses", clicked);
            tokio::time::sleep(self.settle_delay).await;
        }
        Ok(())
    }

    async fn query_or_empty(page: &dyn Page, selector: &str) -> Vec<ElementSnapshot> {
        match page.query_all(selector).await {
            Ok(elements) => elements.into_iter().filter(|e| !e.in_overlay).collect(),
            Err(e) => {
                warn!("Query {:?} failed: {}", selector, e);
                Vec::new()
            }
        }
    }
}

fn is_ellipsis(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed == ELLIPSIS || trimmed == "\u{2026}"
}

/// Key (and in-band name) of an interactive citation control.
fn interactive_key(element: &ElementSnapshot) -> Option<(CitationKey, Option<String>)> {
    if let Some(label) = element.attr("aria-label") {
        if let Some(cap) = NUMBERED_LABEL.captures(label.trim()) {
            let n: u32 = cap[1].parse().ok()?;
            return Some((CitationKey::Numeric(n), Some(cap[2].trim().to_string())));
        }
    }

    // Labelled spans only count in the `N: name` form above.
    if element.tag != "button" {
        return None;
    }

    if is_ellipsis(&element.text) {
        return Some((CitationKey::ellipsis(), None));
    }
    match CitationKey::parse(&element.text)? {
        CitationKey::Numeric(n) if n > 0 => Some((CitationKey::Numeric(n), None)),
        _ => None,
    }
}

fn legacy_key(element: &ElementSnapshot) -> Option<CitationKey> {
    match CitationKey::parse(&element.text)? {
        CitationKey::Numeric(n) if n > 0 && n < LEGACY_MAX => Some(CitationKey::Numeric(n)),
        _ => None,
    }
}

#[cfg(test)]
#[path = "extractor_tests.rs"]
mod tests;
