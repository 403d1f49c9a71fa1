//! Sidebar and page-wide document name correlation.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::key::CitationKey;
use crate::page::Page;

pub const SIDEBAR_ROOT_SELECTOR: &str = r#".sidebar, [role="navigation"], nav"#;

const SIDEBAR_ITEM_SELECTORS: &[&str] = &[
    ".sources-list li",
    r#"[role="listbox"] li"#,
    r#"[role="list"] li"#,
    ".sidebar li",
    r#"[data-testid*="source"]"#,
    ".source-item",
    ".document-item",
    r#"*[title*=".pdf"]"#,
    r#"*[aria-label*=".pdf"]"#,
    "li",
    r#"*[title*="2020"]"#,
    r#"*[title*="2021"]"#,
    r#"*[title*="2022"]"#,
    r#"*[title*="2023"]"#,
    r#"*[title*="2024"]"#,
];

const PDF_NEEDLE: &str = ".pdf";

/// Longest page-wide name accepted.
const GLOBAL_MAX_CHARS: usize = 199;

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").expect("valid regex"));

/// Candidate document names, deduplicated in first-seen order.
pub(super) async fn collect_candidates(page: &dyn Page) -> Vec<String> {
    let mut candidates = Candidates::default();

    let root = page
        .query_all(SIDEBAR_ROOT_SELECTOR)
        .await
        .unwrap_or_default()
        .into_iter()
        .find(|el| !el.in_overlay);

    if let Some(root) = root {
        for selector in SIDEBAR_ITEM_SELECTORS {
            let items = page
                .query_within(&root.handle, selector)
                .await
                .unwrap_or_default();
            for item in items.iter().filter(|el| !el.in_overlay) {
                let text = item.text.trim();
                let len = text.chars().count();
                if len > 10 && len < 150 && looks_like_document(text) {
                    candidates.push(text);
                }
            }
        }
    }

    match page
        .strings_containing(PDF_NEEDLE, GLOBAL_MAX_CHARS)
        .await
    {
        Ok(values) => {
            for value in values.iter().filter(|s| s.chars().count() > 10) {
                candidates.push(value);
            }
        }
        Err(e) => debug!("Global source scan failed: {}", e),
    }

    candidates.list
}

#[derive(Default)]
struct Candidates {
    seen: HashSet<String>,
    list: Vec<String>,
}

impl Candidates {
    fn push(&mut self, text: &str) {
        if self.seen.insert(text.to_string()) {
            self.list.push(text.to_string());
        }
    }
}

fn looks_like_document(text: &str) -> bool {
    text.contains(PDF_NEEDLE) || YEAR.is_match(text) || text.contains(" - ") || text.contains("et al")
}

/// Assign candidates to keys by position.
///
/// `keys` is the full key list of the pass in key order. Candidate `i`
/// goes to key `i` when that key is unresolved. With more keys than
/// candidates, the first candidate also goes to every key still
/// unresolved after that.
pub fn assign_by_position(
    keys: &[CitationKey],
    unresolved: &HashSet<CitationKey>,
    candidates: &[String],
) -> Vec<(CitationKey, String)> {
    let mut assigned: Vec<(CitationKey, String)> = keys
        .iter()
        .zip(candidates)
        .filter(|(key, _)| unresolved.contains(*key))
        .map(|(key, name)| (key.clone(), name.clone()))
        .collect();

    if let Some(primary) = candidates.first() {
        if keys.len() > candidates.len() {
            let taken: HashSet<&CitationKey> = assigned.iter().map(|(k, _)| k).collect();
            let rest: Vec<CitationKey> = keys
                .iter()
                .filter(|k| unresolved.contains(*k) && !taken.contains(k))
                .cloned()
                .collect();
            assigned.extend(rest.into_iter().map(|k| (k, primary.clone())));
        }
    }

    assigned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(ns: &[u32]) -> Vec<CitationKey> {
        ns.iter().copied().map(CitationKey::Numeric).collect()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_position_skips_resolved_keys() {
        let all = keys(&[1, 2, 3]);
        let unresolved: HashSet<_> = keys(&[1, 3]).into_iter().collect();
        let assigned = assign_by_position(&all, &unresolved, &names(&["A.pdf", "B.pdf", "C.pdf"]));
        assert_eq!(
            assigned,
            vec![
                (CitationKey::Numeric(1), "A.pdf".to_string()),
                (CitationKey::Numeric(3), "C.pdf".to_string()),
            ]
        );
    }

    #[test]
    fn test_broadcast_first_candidate() {
        let all = keys(&[1, 2, 3, 4]);
        let unresolved: HashSet<_> = all.iter().cloned().collect();
        let assigned = assign_by_position(&all, &unresolved, &names(&["A.pdf", "B.pdf"]));
        assert_eq!(assigned.len(), 4);
        assert_eq!(assigned[1].1, "B.pdf");
        assert_eq!(assigned[2], (CitationKey::Numeric(3), "A.pdf".to_string()));
        assert_eq!(assigned[3], (CitationKey::Numeric(4), "A.pdf".to_string()));
    }

    #[test]
    fn test_no_candidates_assigns_nothing() {
        let all = keys(&[1, 2]);
        let unresolved: HashSet<_> = all.iter().cloned().collect();
        assert!(assign_by_position(&all, &unresolved, &[]).is_empty());
    }

    #[test]
    fn test_document_heuristic() {
        assert!(looks_like_document("Annual report 2023"));
        assert!(looks_like_document("Smith et al on things"));
        assert!(!looks_like_document("Settings and help"));
    }
}
