//! Scripted fakes for the page capabilities.
//!
//! [`ScriptedPage`] answers selector queries from a table and applies
//! scripted effects when elements are clicked or keys are pressed, which
//! is enough to play back ellipsis expansion and citation panels.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::PageError;
use crate::page::{
    Clipboard, ContextGraph, ElementHandle, ElementSnapshot, MutationRecord, Page, Presenter,
    TranscriptSource,
};

/// A change applied to the selector table.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Make `selector` return these elements.
    Show(String, Vec<ElementSnapshot>),
    /// Make `selector` return nothing.
    Hide(String),
    /// Replace the body text.
    SetText(String),
    /// Queue a mutation record, as the host page would on a DOM change.
    Mutate(MutationRecord),
}

#[derive(Default)]
struct Script {
    body_text: String,
    selectors: HashMap<String, Vec<ElementSnapshot>>,
    within: HashMap<(ElementHandle, String), Vec<ElementSnapshot>>,
    contexts: HashMap<ElementHandle, ContextGraph>,
    on_click: HashMap<ElementHandle, Vec<Effect>>,
    on_key: HashMap<String, Vec<Effect>>,
    failing: HashSet<String>,
    transcript: Option<TranscriptSource>,
    mutations: Vec<MutationRecord>,
}

impl Script {
    fn apply(&mut self, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::Show(selector, elements) => {
                    self.selectors.insert(selector.clone(), elements.clone());
                }
                Effect::Hide(selector) => {
                    self.selectors.remove(selector);
                }
                Effect::SetText(text) => self.body_text = text.clone(),
                Effect::Mutate(record) => self.mutations.push(record.clone()),
            }
        }
    }
}

/// A page played back from a script.
#[derive(Default)]
pub struct ScriptedPage {
    script: Mutex<Script>,
    latency: Option<Duration>,
    body_text_calls: AtomicUsize,
    clicks: Mutex<Vec<ElementHandle>>,
    keys: Mutex<Vec<String>>,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body_text(self, text: impl Into<String>) -> Self {
        self.script.lock().body_text = text.into();
        self
    }

    pub fn with_elements(self, selector: &str, elements: Vec<ElementSnapshot>) -> Self {
        self.script
            .lock()
            .selectors
            .insert(selector.to_string(), elements);
        self
    }

    pub fn with_within(
        self,
        scope: &str,
        selector: &str,
        elements: Vec<ElementSnapshot>,
    ) -> Self {
        self.script
            .lock()
            .within
            .insert((ElementHandle::new(scope), selector.to_string()), elements);
        self
    }

    pub fn with_context(self, handle: &str, graph: ContextGraph) -> Self {
        self.script
            .lock()
            .contexts
            .insert(ElementHandle::new(handle), graph);
        self
    }

    pub fn on_click(self, handle: &str, effects: Vec<Effect>) -> Self {
        self.script
            .lock()
            .on_click
            .insert(ElementHandle::new(handle), effects);
        self
    }

    pub fn on_key(self, key: &str, effects: Vec<Effect>) -> Self {
        self.script.lock().on_key.insert(key.to_string(), effects);
        self
    }

    /// Make queries for `selector` fail with a script error.
    pub fn with_failing_selector(self, selector: &str) -> Self {
        self.script.lock().failing.insert(selector.to_string());
        self
    }

    pub fn with_transcript(self, transcript: TranscriptSource) -> Self {
        self.script.lock().transcript = Some(transcript);
        self
    }

    /// Delay every body-text read, so concurrent passes overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_body_text(&self, text: impl Into<String>) {
        self.script.lock().body_text = text.into();
    }

    pub fn set_elements(&self, selector: &str, elements: Vec<ElementSnapshot>) {
        self.script
            .lock()
            .selectors
            .insert(selector.to_string(), elements);
    }

    pub fn push_mutation(&self, record: MutationRecord) {
        self.script.lock().mutations.push(record);
    }

    pub fn body_text_calls(&self) -> usize {
        self.body_text_calls.load(Ordering::SeqCst)
    }

    pub fn clicks(&self) -> Vec<ElementHandle> {
        self.clicks.lock().clone()
    }

    pub fn keys_pressed(&self) -> Vec<String> {
        self.keys.lock().clone()
    }

    fn check_selector(&self, selector: &str) -> Result<(), PageError> {
        if self.script.lock().failing.contains(selector) {
            return Err(PageError::Script(format!("query {} failed", selector)));
        }
        Ok(())
    }
}

#[async_trait]
impl Page for ScriptedPage {
    async fn body_text(&self) -> Result<String, PageError> {
        self.body_text_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(self.script.lock().body_text.clone())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, PageError> {
        self.check_selector(selector)?;
        Ok(self
            .script
            .lock()
            .selectors
            .get(selector)
            .cloned()
            .unwrap_or_default())
    }

    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementSnapshot>, PageError> {
        self.check_selector(selector)?;
        Ok(self
            .script
            .lock()
            .within
            .get(&(scope.clone(), selector.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), PageError> {
        self.clicks.lock().push(element.clone());
        let mut script = self.script.lock();
        if let Some(effects) = script.on_click.get(element).cloned() {
            script.apply(&effects);
        }
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), PageError> {
        self.keys.lock().push(key.to_string());
        let mut script = self.script.lock();
        if let Some(effects) = script.on_key.get(key).cloned() {
            script.apply(&effects);
        }
        Ok(())
    }

    async fn framework_context(
        &self,
        element: &ElementHandle,
    ) -> Result<Option<ContextGraph>, PageError> {
        Ok(self.script.lock().contexts.get(element).cloned())
    }

    async fn transcript_source(&self) -> Result<Option<TranscriptSource>, PageError> {
        Ok(self.script.lock().transcript.clone())
    }

    async fn drain_mutations(&self) -> Result<Vec<MutationRecord>, PageError> {
        Ok(std::mem::take(&mut self.script.lock().mutations))
    }
}

/// Records everything it is asked to show.
#[derive(Default)]
pub struct RecordingPresenter {
    legends: Mutex<Vec<String>>,
    notifications: Mutex<Vec<String>>,
    hidden: AtomicUsize,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn legends(&self) -> Vec<String> {
        self.legends.lock().clone()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.notifications.lock().clone()
    }

    pub fn hide_count(&self) -> usize {
        self.hidden.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Presenter for RecordingPresenter {
    async fn render_legend(&self, legend_text: &str) -> Result<(), PageError> {
        self.legends.lock().push(legend_text.to_string());
        Ok(())
    }

    async fn hide_legend(&self) -> Result<(), PageError> {
        self.hidden.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn notify(&self, message: &str) -> Result<(), PageError> {
        self.notifications.lock().push(message.to_string());
        Ok(())
    }
}

/// A clipboard whose two paths succeed or fail on demand.
pub struct ScriptedClipboard {
    primary_ok: bool,
    fallback_ok: bool,
    writes: Mutex<Vec<(&'static str, String)>>,
}

impl ScriptedClipboard {
    pub fn new(primary_ok: bool, fallback_ok: bool) -> Self {
        Self {
            primary_ok,
            fallback_ok,
            writes: Mutex::new(Vec::new()),
        }
    }

    /// `(path, text)` for every attempted write, path being
    /// `"primary"` or `"fallback"`.
    pub fn writes(&self) -> Vec<(&'static str, String)> {
        self.writes.lock().clone()
    }
}

#[async_trait]
impl Clipboard for ScriptedClipboard {
    async fn write_primary(&self, text: &str) -> Result<bool, PageError> {
        self.writes.lock().push(("primary", text.to_string()));
        Ok(self.primary_ok)
    }

    async fn write_fallback(&self, text: &str) -> Result<bool, PageError> {
        self.writes.lock().push(("fallback", text.to_string()));
        Ok(self.fallback_ok)
    }
}
