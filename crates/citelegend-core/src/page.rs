//! Capabilities the engine needs from the host page.
//!
//! The engine never touches a DOM directly. Everything it reads or clicks
//! goes through [`Page`], and everything it shows goes through
//! [`Presenter`] and [`Clipboard`]. The CDP extension implements all of
//! them over a live Chrome tab; tests use a scripted fake.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PageError;

/// Id of the legend overlay element injected into the page.
pub const OVERLAY_ID: &str = "citelegend-overlay";

/// Attribute marking elements whose mutations must never trigger a scan.
pub const NO_OBSERVE_ATTR: &str = "data-no-observe";

/// Opaque reference to a live element. Only meaningful within one pass;
/// the host page may replace the node at any time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// What a query returns about one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    pub handle: ElementHandle,
    /// Lower-case tag name.
    #[serde(default)]
    pub tag: String,
    /// Trimmed text content.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// `title` / `data-source-title` values of ancestors, nearest first.
    #[serde(default)]
    pub ancestor_titles: Vec<String>,
    /// Trimmed text of the first child node, if any.
    #[serde(default)]
    pub first_child_text: Option<String>,
    /// Inside the overlay or another `data-no-observe` subtree.
    #[serde(default)]
    pub in_overlay: bool,
}

impl ElementSnapshot {
    pub fn new(handle: impl Into<String>, tag: &str, text: impl Into<String>) -> Self {
        Self {
            handle: ElementHandle::new(handle),
            tag: tag.to_ascii_lowercase(),
            text: text.into(),
            attributes: BTreeMap::new(),
            ancestor_titles: Vec::new(),
            first_child_text: None,
            in_overlay: false,
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn with_ancestor_title(mut self, title: impl Into<String>) -> Self {
        self.ancestor_titles.push(title.into());
        self
    }

    pub fn with_first_child_text(mut self, text: impl Into<String>) -> Self {
        self.first_child_text = Some(text.into());
        self
    }

    pub fn inside_overlay(mut self) -> Self {
        self.in_overlay = true;
        self
    }

    /// Text, `title` and `aria-label` values holding `needle`.
    pub fn strings_containing(&self, needle: &str, max_chars: usize) -> Vec<String> {
        [Some(self.text.as_str()), self.attr("title"), self.attr("aria-label")]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| s.contains(needle) && s.chars().count() <= max_chars)
            .map(str::to_string)
            .collect()
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Index of a node inside a [`ContextGraph`].
pub type NodeId = usize;

/// A framework's per-element component data, flattened into an arena so
/// that shared and cyclic references survive serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextGraph {
    pub root: NodeId,
    pub nodes: Vec<ContextNode>,
}

/// One object (or array, keyed by index) of the context graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextNode {
    #[serde(default)]
    pub fields: Vec<(String, ContextValue)>,
}

/// A property value in the context graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ContextValue {
    String(String),
    Number(f64),
    Bool(bool),
    Ref(NodeId),
    Opaque,
}

/// Summary of one DOM mutation record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationRecord {
    /// The mutated node sits inside the overlay.
    #[serde(default)]
    pub target_in_overlay: bool,
    /// Element nodes added by this record.
    #[serde(default)]
    pub added_elements: usize,
    /// Of those, the ones outside the overlay.
    #[serde(default)]
    pub added_outside_overlay: usize,
}

impl MutationRecord {
    /// Whether this record describes a structural change of the host page.
    pub fn is_structural(&self) -> bool {
        !self.target_in_overlay && self.added_outside_overlay > 0
    }
}

/// Raw material for the chat transcript export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSource {
    /// Paragraph texts with citation buttons already rewritten to `[N]`.
    #[serde(default)]
    pub paragraphs: Vec<String>,
    /// Whole-container text, used when no paragraphs were found.
    #[serde(default)]
    pub fallback_text: Option<String>,
}

/// Read and poke the host document.
#[async_trait]
pub trait Page: Send + Sync {
    /// Text of the document, excluding the overlay.
    async fn body_text(&self) -> Result<String, PageError>;

    /// All elements matching a CSS selector, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, PageError>;

    /// Descendants of `scope` matching a CSS selector, in document order.
    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementSnapshot>, PageError>;

    /// Trimmed text, `title` and `aria-label` values of elements outside
    /// the overlay that contain `needle` and are at most `max_chars` long,
    /// in document order.
    ///
    /// The default walks every element through [`Page::query_all`].
    /// Implementations that can filter inside the page should.
    async fn strings_containing(
        &self,
        needle: &str,
        max_chars: usize,
    ) -> Result<Vec<String>, PageError> {
        let elements = self.query_all("*").await?;
        Ok(elements
            .iter()
            .filter(|el| !el.in_overlay)
            .flat_map(|el| el.strings_containing(needle, max_chars))
            .collect())
    }

    /// Simulate activation of an element.
    async fn click(&self, element: &ElementHandle) -> Result<(), PageError>;

    /// Dispatch a key press to the focused element.
    async fn press_key(&self, key: &str) -> Result<(), PageError>;

    /// Framework component data attached to an element, if the page
    /// exposes any. The default reports the capability as absent.
    async fn framework_context(
        &self,
        _element: &ElementHandle,
    ) -> Result<Option<ContextGraph>, PageError> {
        Ok(None)
    }

    /// Collect the chat container's paragraphs for transcript export.
    async fn transcript_source(&self) -> Result<Option<TranscriptSource>, PageError>;

    /// Mutation records observed since the last call.
    async fn drain_mutations(&self) -> Result<Vec<MutationRecord>, PageError>;
}

/// Renders the legend and transient messages.
#[async_trait]
pub trait Presenter: Send + Sync {
    async fn render_legend(&self, legend_text: &str) -> Result<(), PageError>;

    async fn hide_legend(&self) -> Result<(), PageError>;

    async fn notify(&self, message: &str) -> Result<(), PageError>;
}

/// Two-tier clipboard access.
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// The preferred clipboard API. `Ok(false)` means unavailable or blocked.
    async fn write_primary(&self, text: &str) -> Result<bool, PageError>;

    /// Hidden-input copy used when the primary path fails.
    async fn write_fallback(&self, text: &str) -> Result<bool, PageError>;
}
