//! [`Page`], [`Presenter`] and [`Clipboard`] over a live Chrome tab.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};

use citelegend_core::page::{ContextGraph, MutationRecord, TranscriptSource};
use citelegend_core::{Clipboard, ElementHandle, ElementSnapshot, Page, PageError, Presenter};

use crate::bridge::{BridgeReply, bridge_script, invocation, is_missing};
use crate::cdp::{CdpClient, CdpError, PageInfo, PageSession};

/// A NotebookLM tab driven over CDP.
pub struct CdpPage {
    // Declared before `client` so the session is dropped first.
    session: PageSession,
    client: CdpClient,
    target: PageInfo,
}

impl CdpPage {
    /// Connect to Chrome, attach to the first tab whose URL contains
    /// `url_pattern` and install the bridge script.
    pub async fn connect(endpoint: &str, url_pattern: &str) -> Result<Self, CdpError> {
        let client = CdpClient::connect(endpoint).await?;
        let target = client.find_page(url_pattern).await?;
        info!("Attaching to tab '{}' ({})", target.title, target.url);

        let session = client.attach_page(&target.id).await?;
        session.add_script_on_new_document(bridge_script()).await?;
        session.wait_for_load().await?;
        session.evaluate(bridge_script()).await?;
        debug!("Bridge installed in {}", session.target_id());

        Ok(Self {
            session,
            client,
            target,
        })
    }

    /// The attached tab.
    pub fn target(&self) -> &PageInfo {
        &self.target
    }

    /// Whether the tab or the browser connection is gone.
    pub fn is_detached(&self) -> bool {
        self.session.is_detached() || self.client.is_closed()
    }

    async fn run(&self, method: &str, args: Vec<Value>, gesture: bool) -> Result<Value, PageError> {
        if self.is_detached() {
            return Err(PageError::Detached(self.target.url.clone()));
        }

        let expression = invocation(method, &args);
        let mut value = self.evaluate(&expression, gesture).await?;
        if is_missing(&value) {
            // The tab navigated and the new document has no bridge yet.
            debug!("Bridge missing in {}, reinstalling", self.target.url);
            self.session.evaluate(bridge_script()).await?;
            value = self.evaluate(&expression, gesture).await?;
        }

        let reply: BridgeReply = serde_json::from_value(value)?;
        reply.into_result(method)
    }

    async fn evaluate(&self, expression: &str, gesture: bool) -> Result<Value, CdpError> {
        if gesture {
            self.session.evaluate_with_gesture(expression).await
        } else {
            self.session.evaluate(expression).await
        }
    }

    async fn invoke<T: DeserializeOwned>(
        &self,
        method: &str,
        args: Vec<Value>,
    ) -> Result<T, PageError> {
        let value = self.run(method, args, false).await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl Page for CdpPage {
    async fn body_text(&self) -> Result<String, PageError> {
        self.invoke("bodyText", vec![]).await
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, PageError> {
        self.invoke("queryAll", vec![json!(selector)]).await
    }

    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementSnapshot>, PageError> {
        self.invoke("queryWithin", vec![json!(scope.0), json!(selector)])
            .await
    }

    async fn strings_containing(
        &self,
        needle: &str,
        max_chars: usize,
    ) -> Result<Vec<String>, PageError> {
        self.invoke("stringsContaining", vec![json!(needle), json!(max_chars)])
            .await
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), PageError> {
        self.run("click", vec![json!(element.0)], false).await?;
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), PageError> {
        self.session.press_key(key).await?;
        Ok(())
    }

    async fn framework_context(
        &self,
        element: &ElementHandle,
    ) -> Result<Option<ContextGraph>, PageError> {
        self.invoke("frameworkContext", vec![json!(element.0)]).await
    }

    async fn transcript_source(&self) -> Result<Option<TranscriptSource>, PageError> {
        self.invoke("transcript", vec![]).await
    }

    async fn drain_mutations(&self) -> Result<Vec<MutationRecord>, PageError> {
        self.invoke("drainMutations", vec![]).await
    }
}

#[async_trait]
impl Presenter for CdpPage {
    async fn render_legend(&self, legend_text: &str) -> Result<(), PageError> {
        self.run("renderLegend", vec![json!(legend_text)], false)
            .await?;
        Ok(())
    }

    async fn hide_legend(&self) -> Result<(), PageError> {
        self.run("hideLegend", vec![], false).await?;
        Ok(())
    }

    async fn notify(&self, message: &str) -> Result<(), PageError> {
        self.run("notify", vec![json!(message)], false).await?;
        Ok(())
    }
}

#[async_trait]
impl Clipboard for CdpPage {
    async fn write_primary(&self, text: &str) -> Result<bool, PageError> {
        let value = self.run("writePrimary", vec![json!(text)], true).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn write_fallback(&self, text: &str) -> Result<bool, PageError> {
        let value = self.run("writeFallback", vec![json!(text)], true).await?;
        Ok(value.as_bool().unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use citelegend_core::page::ContextValue;
    use citelegend_core::resolver::find_source_property;

    use super::*;

    #[test]
    fn test_decode_bridge_snapshots() {
        let value = json!([{
            "handle": "el-1",
            "tag": "button",
            "text": "3",
            "attributes": {"class": "citation-marker", "aria-label": "3: Report.pdf"},
            "ancestorTitles": ["Chat"],
            "firstChildText": "3",
            "inOverlay": false
        }]);
        let snapshots: Vec<ElementSnapshot> = serde_json::from_value(value).unwrap();
        assert_eq!(snapshots[0].handle, ElementHandle::new("el-1"));
        assert_eq!(snapshots[0].attr("aria-label"), Some("3: Report.pdf"));
        assert_eq!(snapshots[0].first_child_text.as_deref(), Some("3"));
    }

    #[test]
    fn test_decode_bridge_context_graph() {
        let value = json!({
            "root": 0,
            "nodes": [
                {"fields": [["0", {"kind": "opaque"}], ["1", {"kind": "ref", "value": 1}]]},
                {"fields": [["parent", {"kind": "ref", "value": 0}], ["source", {"kind": "string", "value": "Notes.pdf"}]]}
            ]
        });
        let graph: Option<ContextGraph> = serde_json::from_value(value).unwrap();
        let graph = graph.unwrap();
        assert_eq!(graph.nodes[0].fields[0].1, ContextValue::Opaque);
        assert_eq!(find_source_property(&graph, 5).as_deref(), Some("Notes.pdf"));

        let absent: Option<ContextGraph> = serde_json::from_value(Value::Null).unwrap();
        assert!(absent.is_none());
    }

    #[test]
    fn test_decode_bridge_mutations() {
        let value = json!([
            {"targetInOverlay": true, "addedElements": 2, "addedOutsideOverlay": 0},
            {"targetInOverlay": false, "addedElements": 1, "addedOutsideOverlay": 1}
        ]);
        let records: Vec<MutationRecord> = serde_json::from_value(value).unwrap();
        assert!(!records[0].is_structural());
        assert!(records[1].is_structural());
    }

    #[test]
    fn test_decode_bridge_transcript() {
        let value = json!({"paragraphs": ["Point [1]"], "fallbackText": null});
        let source: Option<TranscriptSource> = serde_json::from_value(value).unwrap();
        assert_eq!(source.unwrap().paragraphs, vec!["Point [1]".to_string()]);
    }
}
