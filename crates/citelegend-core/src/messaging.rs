//! JSON request/response boundary.
//!
//! Requests are objects tagged by `action`; responses are plain objects
//! (`{mappings}`, `{citations}`, `{chatText}`, `{text}`, `{enabled}`,
//! `{ok}` or `{error}`). Every request completes before its response is produced.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::key::CitationKey;
use crate::session::{CitationDetail, CitationSession};
use crate::store::MappingEntry;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    GetMappings,
    Rescan,
    ShowMappings,
    GetCitations,
    Toggle {
        enabled: bool,
    },
    GetChatText,
    UpdateCustomName {
        citation: CitationKey,
        name: String,
    },
    ClearCustomName {
        citation: CitationKey,
    },
    /// Rewrite copied text before it reaches the clipboard.
    EnhanceText {
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Mappings {
        mappings: Vec<MappingEntry>,
    },
    Citations {
        citations: BTreeMap<CitationKey, CitationDetail>,
    },
    ChatText {
        #[serde(rename = "chatText")]
        chat_text: Option<String>,
    },
    Text {
        text: String,
    },
    Enabled {
        enabled: bool,
    },
    Ok {
        ok: bool,
    },
    Error {
        error: String,
    },
}

impl Response {
    fn error(e: impl std::fmt::Display) -> Self {
        Response::Error {
            error: e.to_string(),
        }
    }
}

/// Dispatches requests to a session.
#[derive(Clone)]
pub struct MessageHandler {
    session: Arc<CitationSession>,
}

impl MessageHandler {
    pub fn new(session: Arc<CitationSession>) -> Self {
        Self { session }
    }

    pub async fn handle(&self, request: Request) -> Response {
        debug!("Handling {:?}", request);
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Request failed: {}", e);
                Response::error(e)
            }
        }
    }

    async fn dispatch(&self, request: Request) -> Result<Response, EngineError> {
        let session = &self.session;
        Ok(match request {
            Request::GetMappings => Response::Mappings {
                mappings: session.get_mappings(),
            },
            Request::Rescan => Response::Mappings {
                mappings: session.rescan().await?,
            },
            Request::ShowMappings => {
                let mappings = session.rescan().await?;
                session.show_legend().await?;
                Response::Mappings { mappings }
            }
            Request::GetCitations => Response::Citations {
                citations: session.citations(),
            },
            Request::Toggle { enabled } => Response::Enabled {
                enabled: session.set_enabled(enabled).await?,
            },
            Request::GetChatText => Response::ChatText {
                chat_text: session.chat_text().await?,
            },
            Request::UpdateCustomName { citation, name } => {
                session.set_override(citation, &name).await?;
                Response::Ok { ok: true }
            }
            Request::ClearCustomName { citation } => Response::Ok {
                ok: session.clear_override(&citation).await?,
            },
            Request::EnhanceText { text } => Response::Text {
                text: session.enhance_copied_text(&text),
            },
        })
    }

    /// Handle one JSON-encoded request and encode the response.
    pub async fn handle_json(&self, raw: &str) -> String {
        let response = match serde_json::from_str::<Request>(raw) {
            Ok(request) => self.handle(request).await,
            Err(e) => Response::error(EngineError::InvalidMessage(e.to_string())),
        };
        serde_json::to_string(&response)
            .unwrap_or_else(|e| format!(r#"{{"error":"unencodable response: {}"}}"#, e))
    }

    /// Serve newline-delimited JSON until the reader is exhausted.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let mut out = self.handle_json(&line).await;
            out.push('\n');
            writer.write_all(out.as_bytes()).await?;
            writer.flush().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::testing::ScriptedPage;
    use serde_json::{json, Value};

    async fn handler(text: &str) -> MessageHandler {
        let session = CitationSession::builder(
            Arc::new(ScriptedPage::new().with_body_text(text)),
            Settings::in_memory(),
        )
        .resolver(crate::resolver::SourceResolver::new(
            crate::resolver::ResolverConfig {
                panel_strategy: false,
                sidebar_strategy: false,
                ..Default::default()
            },
        ))
        .build()
        .await
        .unwrap();
        MessageHandler::new(session)
    }

    async fn call(handler: &MessageHandler, request: Value) -> Value {
        serde_json::from_str(&handler.handle_json(&request.to_string()).await).unwrap()
    }

    #[test]
    fn test_request_parsing() {
        let req: Request = serde_json::from_value(json!({
            "action": "updateCustomName",
            "citation": "3",
            "name": "Notes"
        }))
        .unwrap();
        assert_eq!(
            req,
            Request::UpdateCustomName {
                citation: CitationKey::Numeric(3),
                name: "Notes".to_string()
            }
        );

        let req: Request = serde_json::from_value(json!({"action": "toggle", "enabled": false})).unwrap();
        assert_eq!(req, Request::Toggle { enabled: false });
    }

    #[tokio::test]
    async fn test_rescan_then_get_mappings() {
        let handler = handler("claim [2]").await;

        let rescan = call(&handler, json!({"action": "rescan"})).await;
        assert_eq!(rescan["mappings"][0]["citation"], "2");
        assert_eq!(rescan["mappings"][0]["filename"], "Source 2");

        let get = call(&handler, json!({"action": "getMappings"})).await;
        assert_eq!(get, rescan);
    }

    #[tokio::test]
    async fn test_custom_name_flow() {
        let handler = handler("claim [2]").await;
        call(&handler, json!({"action": "rescan"})).await;

        let ok = call(
            &handler,
            json!({"action": "updateCustomName", "citation": "2", "name": "Mine"}),
        )
        .await;
        assert_eq!(ok, json!({"ok": true}));

        let citations = call(&handler, json!({"action": "getCitations"})).await;
        assert_eq!(citations["citations"]["2"]["source"], "Mine");
        assert_eq!(citations["citations"]["2"]["customName"], "Mine");

        let cleared = call(&handler, json!({"action": "clearCustomName", "citation": "2"})).await;
        assert_eq!(cleared, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_enhance_text() {
        let handler = handler("").await;
        let resp = call(
            &handler,
            json!({"action": "enhanceText", "text": "See [[Okafor - 2021 - Field Notes.pdf]]."}),
        )
        .await;
        assert_eq!(
            resp,
            json!({"text": "See [Okafor (2021)].\n\nSources:\n[1] Okafor - 2021 - Field Notes"})
        );

        let plain = call(&handler, json!({"action": "enhanceText", "text": "no cites"})).await;
        assert_eq!(plain, json!({"text": "no cites"}));
    }

    #[tokio::test]
    async fn test_chat_text_null_when_missing() {
        let handler = handler("").await;
        let resp = call(&handler, json!({"action": "getChatText"})).await;
        assert_eq!(resp, json!({"chatText": null}));
    }

    #[tokio::test]
    async fn test_unknown_action_is_error() {
        let handler = handler("").await;
        let resp = call(&handler, json!({"action": "selfDestruct"})).await;
        assert!(resp["error"].as_str().unwrap().contains("Invalid message"));
    }

    #[tokio::test]
    async fn test_serve_ndjson() {
        let handler = handler("[1]").await;
        let input = b"{\"action\":\"rescan\"}\n\n{\"action\":\"toggle\",\"enabled\":false}\n";
        let mut output = Vec::new();

        handler
            .serve(tokio::io::BufReader::new(&input[..]), &mut output)
            .await
            .unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["mappings"][0]["citation"], "1");
        assert_eq!(lines[1], json!({"enabled": false}));
    }
}
