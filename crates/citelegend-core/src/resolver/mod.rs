//! Source resolution cascade.
//!
//! Per marker, strategies run strongest first and stop at the first hit:
//! in-band long form, framework introspection, element attributes, then
//! the citation panel. Keys still unresolved after that are correlated
//! against document names found in the sidebar, and anything left gets a
//! placeholder.

mod attributes;
mod inband;
mod introspect;
mod panel;
mod sidebar;

pub use introspect::{find_source_property, SOURCE_PROPERTIES};
pub use panel::{PANEL_CLOSE_SELECTOR, PANEL_SELECTOR};
pub use sidebar::{assign_by_position, SIDEBAR_ROOT_SELECTOR};

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use tracing::debug;

use crate::key::CitationKey;
use crate::label::{Provenance, SourceLabel, DEFAULT_MAX_LABEL_LEN};
use crate::marker::RawMarker;
use crate::page::Page;

/// Resolver tuning.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// How long to wait for a citation panel to appear.
    pub panel_timeout: Duration,
    /// Fixed wait after closing a panel.
    pub panel_close_delay: Duration,
    /// Poll interval while waiting for a panel.
    pub panel_poll_interval: Duration,
    /// Maximum depth searched in a framework context graph.
    pub introspection_depth: usize,
    pub max_label_len: usize,
    pub panel_strategy: bool,
    pub sidebar_strategy: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            panel_timeout: Duration::from_millis(1500),
            panel_close_delay: Duration::from_millis(300),
            panel_poll_interval: Duration::from_millis(100),
            introspection_depth: 5,
            max_label_len: DEFAULT_MAX_LABEL_LEN,
            panel_strategy: true,
            sidebar_strategy: true,
        }
    }
}

/// Maps citation markers to source labels.
#[derive(Debug, Clone, Default)]
pub struct SourceResolver {
    config: ResolverConfig,
}

impl SourceResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Run the per-marker strategies. `None` means the marker needs the
    /// pass-level fallbacks.
    pub async fn resolve(&self, page: &dyn Page, marker: &RawMarker) -> Option<SourceLabel> {
        if let Some(label) = inband::resolve(marker, self.config.max_label_len) {
            debug!("Citation {} resolved in-band: {}", marker.key, label.text);
            return Some(label);
        }

        let element = marker.element.as_ref()?;

        if let Some(label) =
            introspect::resolve(page, element, self.config.introspection_depth).await
        {
            debug!("Citation {} resolved by introspection: {}", marker.key, label.text);
            return Some(label);
        }

        if let Some(label) = attributes::resolve(element) {
            debug!("Citation {} resolved from attributes: {}", marker.key, label.text);
            return Some(label);
        }

        if self.config.panel_strategy {
            if let Some(label) = panel::resolve(page, element, &self.config).await {
                debug!("Citation {} resolved from panel: {}", marker.key, label.text);
                return Some(label);
            }
        }

        None
    }

    /// Resolve every marker of a pass, in key order, one label per key.
    pub async fn resolve_pass(
        &self,
        page: &dyn Page,
        markers: &[RawMarker],
    ) -> Vec<(CitationKey, SourceLabel)> {
        let mut resolved: BTreeMap<CitationKey, SourceLabel> = BTreeMap::new();
        for marker in markers {
            if resolved.contains_key(&marker.key) {
                continue;
            }
            if let Some(label) = self.resolve(page, marker).await {
                resolved.insert(marker.key.clone(), label);
            }
        }

        let mut keys: Vec<CitationKey> = markers.iter().map(|m| m.key.clone()).collect();
        keys.sort();
        keys.dedup();

        let unresolved: HashSet<CitationKey> = keys
            .iter()
            .filter(|k| !resolved.contains_key(*k))
            .cloned()
            .collect();

        if self.config.sidebar_strategy && !unresolved.is_empty() {
            let candidates = sidebar::collect_candidates(page).await;
            debug!(
                "{} unresolved citations, {} sidebar candidates",
                unresolved.len(),
                candidates.len()
            );
            for (key, name) in assign_by_position(&keys, &unresolved, &candidates) {
                resolved.insert(key, SourceLabel::heuristic(name, Provenance::Sidebar));
            }
        }

        for key in keys {
            resolved
                .entry(key)
                .or_insert_with_key(SourceLabel::placeholder);
        }

        resolved.into_iter().collect()
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
