//! Integration tests for the CDP page adapter.
//!
//! Tests marked `#[ignore]` need Chrome running with remote debugging and
//! a NotebookLM tab open.
//! Run with: cargo test -p citelegend-page-cdp --test integration_test -- --ignored --nocapture

use citelegend_core::Page;
use citelegend_page_cdp::{CdpClient, CdpError, CdpPage};

const ENDPOINT: &str = "http://localhost:9222";
const PATTERN: &str = "notebooklm.google.com";

#[tokio::test]
async fn test_connect_refused() {
    // Port 9 (discard) is never a CDP endpoint.
    let result = CdpClient::connect("http://127.0.0.1:9").await;
    assert!(matches!(result, Err(CdpError::ChromeNotAvailable(_))));
}

#[tokio::test]
async fn test_connect_invalid_endpoint() {
    let result = CdpClient::connect("not an endpoint").await;
    assert!(matches!(result, Err(CdpError::ConnectionFailed(_))));
}

#[tokio::test]
#[ignore = "requires Chrome with --remote-debugging-port=9222"]
async fn test_list_pages() {
    let client = CdpClient::connect(ENDPOINT).await.unwrap();
    let pages = client.list_pages().await.unwrap();
    for page in &pages {
        println!("{} {} {}", page.id, page.page_type, page.url);
    }
}

#[tokio::test]
#[ignore = "requires Chrome with an open NotebookLM tab"]
async fn test_attach_and_read() {
    let page = CdpPage::connect(ENDPOINT, PATTERN).await.unwrap();
    println!("Attached to {}", page.target().url);

    let text = page.body_text().await.unwrap();
    assert!(!text.is_empty(), "Body text should not be empty");

    let buttons = page.query_all("button.citation-marker").await.unwrap();
    println!("Found {} citation buttons", buttons.len());

    page.drain_mutations().await.unwrap();
    assert!(!page.is_detached());
}
