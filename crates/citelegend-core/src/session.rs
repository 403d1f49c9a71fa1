//! The citation session: one page, one mapping, one pass at a time.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::export;
use crate::extractor::MarkerExtractor;
use crate::key::CitationKey;
use crate::label::{Confidence, Provenance, SourceLabel};
use crate::monitor::{PassOutcome, ScanTarget};
use crate::page::{Clipboard, Page, Presenter};
use crate::resolver::SourceResolver;
use crate::settings::Settings;
use crate::store::{MappingEntry, MappingStore};

/// Shown when neither clipboard path worked.
pub const COPY_FAILED_MESSAGE: &str = "Could not copy the citation legend";

/// Shown after a successful copy.
pub const COPY_OK_MESSAGE: &str = "Citation legend copied";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassKind {
    /// Clear the store first.
    Full,
    /// Merge into what is already known.
    Incremental,
}

/// Per-citation detail for the `getCitations` view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationDetail {
    pub source: String,
    pub provenance: Provenance,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
}

/// Builder for [`CitationSession`].
pub struct SessionBuilder {
    page: Arc<dyn Page>,
    settings: Settings,
    presenter: Option<Arc<dyn Presenter>>,
    clipboard: Option<Arc<dyn Clipboard>>,
    extractor: MarkerExtractor,
    resolver: SourceResolver,
}

impl SessionBuilder {
    pub fn presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    pub fn clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub fn extractor(mut self, extractor: MarkerExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn resolver(mut self, resolver: SourceResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Load settings (writing first-run defaults and pruning the stale
    /// cache) and create the session.
    pub async fn build(self) -> Result<Arc<CitationSession>, EngineError> {
        self.settings.initialize().await?;
        self.settings.prune_stale_cache(Utc::now()).await?;
        let enabled = self.settings.enabled().await?;
        let overrides = self.settings.custom_names().await?;

        debug!(
            "Session loaded: enabled={}, {} custom names",
            enabled,
            overrides.len()
        );

        Ok(Arc::new(CitationSession {
            page: self.page,
            presenter: self.presenter,
            clipboard: self.clipboard,
            settings: self.settings,
            extractor: self.extractor,
            resolver: self.resolver,
            store: Mutex::new(MappingStore::new()),
            overrides: Mutex::new(overrides),
            enabled: AtomicBool::new(enabled),
            pass_guard: tokio::sync::Mutex::new(()),
        }))
    }
}

/// Owns the mapping for one page and runs extraction passes against it.
pub struct CitationSession {
    page: Arc<dyn Page>,
    presenter: Option<Arc<dyn Presenter>>,
    clipboard: Option<Arc<dyn Clipboard>>,
    settings: Settings,
    extractor: MarkerExtractor,
    resolver: SourceResolver,
    store: Mutex<MappingStore>,
    overrides: Mutex<BTreeMap<CitationKey, String>>,
    enabled: AtomicBool,
    // Held for the whole of a pass.
    pass_guard: tokio::sync::Mutex<()>,
}

impl CitationSession {
    pub fn builder(page: Arc<dyn Page>, settings: Settings) -> SessionBuilder {
        SessionBuilder {
            page,
            settings,
            presenter: None,
            clipboard: None,
            extractor: MarkerExtractor::default(),
            resolver: SourceResolver::default(),
        }
    }

    /// Current mapping in key order.
    pub fn get_mappings(&self) -> Vec<MappingEntry> {
        self.store.lock().entries()
    }

    /// Current mapping with override detail, keyed by citation.
    pub fn citations(&self) -> BTreeMap<CitationKey, CitationDetail> {
        let overrides = self.overrides.lock();
        self.store
            .lock()
            .snapshot()
            .into_iter()
            .map(|(key, label)| {
                let custom_name = overrides.get(&key).cloned();
                let detail = CitationDetail {
                    source: label.text,
                    provenance: label.provenance,
                    confidence: label.confidence,
                    custom_name,
                };
                (key, detail)
            })
            .collect()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Clear and rebuild the mapping.
    ///
    /// If a pass is already running no second pass starts; the call waits
    /// for the running one and returns its result.
    pub async fn rescan(&self) -> Result<Vec<MappingEntry>, EngineError> {
        match self.pass_guard.try_lock() {
            Ok(_guard) => {
                self.run_pass(PassKind::Full).await?;
            }
            Err(_) => {
                debug!("Rescan requested during a pass, waiting for it");
                let _guard = self.pass_guard.lock().await;
            }
        }
        Ok(self.get_mappings())
    }

    /// Merge a fresh pass into the mapping unless a pass is running.
    pub async fn refresh(&self) -> PassOutcome {
        if !self.is_enabled() {
            return PassOutcome::Disabled;
        }
        let Ok(_guard) = self.pass_guard.try_lock() else {
            return PassOutcome::Skipped;
        };
        match self.run_pass(PassKind::Incremental).await {
            Ok(()) => PassOutcome::Completed,
            Err(e) => {
                warn!("Incremental pass failed: {}", e);
                PassOutcome::Failed
            }
        }
    }

    async fn run_pass(&self, kind: PassKind) -> Result<(), EngineError> {
        self.reload_overrides().await;
        let page = self.page.as_ref();
        let markers = self.extractor.extract(page).await?;
        let labels = self.resolver.resolve_pass(page, &markers).await;

        let changed = {
            let overrides = self.overrides.lock();
            let mut store = self.store.lock();
            if kind == PassKind::Full {
                store.clear();
            }
            let mut changed = 0usize;
            for (key, label) in labels {
                if store.merge(key, label) {
                    changed += 1;
                }
            }
            changed + apply_overrides(&mut store, &overrides)
        };

        // Mutations from the pass's own clicks that the monitor has not
        // read yet.
        if let Err(e) = self.page.drain_mutations().await {
            debug!("Could not discard pass mutations: {}", e);
        }

        info!(
            "{:?} pass: {} markers, {} mapped, {} changed",
            kind,
            markers.len(),
            self.store.lock().len(),
            changed
        );

        self.publish().await;
        Ok(())
    }

    /// Render the legend and persist the snapshot cache.
    async fn publish(&self) {
        let entries = self.get_mappings();

        if self.is_enabled() {
            if let Some(presenter) = &self.presenter {
                let text = export::legend_text(&entries, true);
                if let Err(e) = presenter.render_legend(&text).await {
                    warn!("Could not render legend: {}", e);
                }
            }
        }

        if let Err(e) = self.settings.save_cached_mappings(entries, Utc::now()).await {
            warn!("Could not cache mappings: {}", e);
        }
    }

    /// Switch automatic scanning and the overlay on or off.
    pub async fn set_enabled(&self, enabled: bool) -> Result<bool, EngineError> {
        self.settings.set_enabled(enabled).await?;
        self.enabled.store(enabled, Ordering::SeqCst);
        info!("Citation legend {}", if enabled { "enabled" } else { "disabled" });

        if enabled {
            self.rescan().await?;
        } else if let Some(presenter) = &self.presenter {
            if let Err(e) = presenter.hide_legend().await {
                warn!("Could not hide legend: {}", e);
            }
        }
        Ok(enabled)
    }

    pub fn overrides(&self) -> BTreeMap<CitationKey, String> {
        self.overrides.lock().clone()
    }

    /// Save a user-entered name for a citation. It outranks every
    /// automatic label until cleared.
    pub async fn set_override(&self, key: CitationKey, name: &str) -> Result<(), EngineError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidMessage(format!(
                "empty name for citation {}",
                key
            )));
        }

        let mut names = self.settings.custom_names().await?;
        names.insert(key.clone(), name.to_string());
        self.save_overrides(names).await?;
        info!("Custom name for citation {}: {}", key, name);

        let changed = {
            let mut store = self.store.lock();
            store.get(&key).is_some() && store.merge(key, SourceLabel::manual(name))
        };
        if changed {
            self.publish().await;
        }
        Ok(())
    }

    /// Forget a user-entered name. Returns whether one existed. The
    /// mapping is rebuilt so the citation gets its automatic label back.
    pub async fn clear_override(&self, key: &CitationKey) -> Result<bool, EngineError> {
        let mut names = self.settings.custom_names().await?;
        if names.remove(key).is_none() {
            *self.overrides.lock() = names;
            return Ok(false);
        }
        self.save_overrides(names).await?;
        info!("Cleared custom name for citation {}", key);

        let was_mapped = {
            let mut store = self.store.lock();
            match store.get(key) {
                Some(label) if label.provenance == Provenance::Override => {
                    store.remove(key);
                    true
                }
                _ => false,
            }
        };
        if was_mapped {
            self.rescan().await?;
        }
        Ok(true)
    }

    /// Write the full override map and adopt it as the session's view.
    async fn save_overrides(
        &self,
        names: BTreeMap<CitationKey, String>,
    ) -> Result<(), EngineError> {
        self.settings.set_custom_names(&names).await?;
        *self.overrides.lock() = names;
        Ok(())
    }

    /// Pick up names saved by other processes since the last read.
    async fn reload_overrides(&self) {
        match self.settings.custom_names().await {
            Ok(names) => *self.overrides.lock() = names,
            Err(e) => warn!("Could not reload custom names: {}", e),
        }
    }

    /// Render the legend now, even while automatic scanning is off.
    pub async fn show_legend(&self) -> Result<(), EngineError> {
        if let Some(presenter) = &self.presenter {
            presenter.render_legend(&self.legend_text(true)).await?;
        }
        Ok(())
    }

    /// The legend as plain text.
    pub fn legend_text(&self, with_banner: bool) -> String {
        export::legend_text(&self.get_mappings(), with_banner)
    }

    /// Copy the legend, trying the primary clipboard path first.
    pub async fn copy_legend(&self) -> Result<(), EngineError> {
        let clipboard = self
            .clipboard
            .as_ref()
            .ok_or_else(|| EngineError::Clipboard("no clipboard available".to_string()))?;
        let text = self.legend_text(true);

        let primary = clipboard.write_primary(&text).await.unwrap_or_else(|e| {
            debug!("Primary clipboard write failed: {}", e);
            false
        });
        let copied = primary
            || clipboard.write_fallback(&text).await.unwrap_or_else(|e| {
                debug!("Fallback clipboard write failed: {}", e);
                false
            });

        let message = if copied {
            COPY_OK_MESSAGE
        } else {
            COPY_FAILED_MESSAGE
        };
        self.notify(message).await;

        if copied {
            Ok(())
        } else {
            Err(EngineError::Clipboard("both clipboard paths failed".to_string()))
        }
    }

    /// The chat transcript with citations as `[N]`.
    pub async fn chat_text(&self) -> Result<Option<String>, EngineError> {
        let source = self.page.transcript_source().await?;
        Ok(source.as_ref().and_then(export::normalize_transcript))
    }

    /// Rewrite long-form citations in copied text and append a source list.
    pub fn enhance_copied_text(&self, text: &str) -> String {
        export::enhance_copied_text(text, self.resolver.config().max_label_len)
    }

    async fn notify(&self, message: &str) {
        if let Some(presenter) = &self.presenter {
            if let Err(e) = presenter.notify(message).await {
                debug!("Could not show notification: {}", e);
            }
        }
    }
}

#[async_trait]
impl ScanTarget for CitationSession {
    async fn scan_if_idle(&self) -> PassOutcome {
        self.refresh().await
    }

    fn is_busy(&self) -> bool {
        self.pass_guard.try_lock().is_err()
    }
}

/// Apply user names to every mapped key that has one.
fn apply_overrides(store: &mut MappingStore, overrides: &BTreeMap<CitationKey, String>) -> usize {
    let mut changed = 0;
    for (key, name) in overrides {
        if store.get(key).is_some() && store.merge(key.clone(), SourceLabel::manual(name.clone()))
        {
            changed += 1;
        }
    }
    changed
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
