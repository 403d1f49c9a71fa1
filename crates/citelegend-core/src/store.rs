//! The citation-to-source mapping table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::key::CitationKey;
use crate::label::{Confidence, Provenance, SourceLabel};

/// Wire form of one mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub citation: CitationKey,
    pub filename: String,
    pub provenance: Provenance,
    pub confidence: Confidence,
}

impl MappingEntry {
    pub fn new(citation: CitationKey, label: SourceLabel) -> Self {
        Self {
            citation,
            filename: label.text,
            provenance: label.provenance,
            confidence: label.confidence,
        }
    }
}

/// Ordered, deduplicated mapping with confidence-monotonic merge.
#[derive(Debug, Clone, Default)]
pub struct MappingStore {
    entries: BTreeMap<CitationKey, SourceLabel>,
}

impl MappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a label. An existing label is only replaced by
    /// one of equal or higher confidence. Returns whether anything changed.
    pub fn merge(&mut self, key: CitationKey, label: SourceLabel) -> bool {
        match self.entries.get(&key) {
            Some(existing) if label.confidence < existing.confidence => false,
            Some(existing) if *existing == label => false,
            _ => {
                self.entries.insert(key, label);
                true
            }
        }
    }

    /// Drop one entry regardless of its confidence.
    pub fn remove(&mut self, key: &CitationKey) -> Option<SourceLabel> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &CitationKey) -> Option<&SourceLabel> {
        self.entries.get(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in key order.
    pub fn snapshot(&self) -> Vec<(CitationKey, SourceLabel)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// All entries in key order, in wire form.
    pub fn entries(&self) -> Vec<MappingEntry> {
        self.entries
            .iter()
            .map(|(k, v)| MappingEntry::new(k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> CitationKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_merge_inserts_and_orders() {
        let mut store = MappingStore::new();
        assert!(store.merge(key("10"), SourceLabel::placeholder(&key("10"))));
        assert!(store.merge(key("..."), SourceLabel::placeholder(&key("..."))));
        assert!(store.merge(key("2"), SourceLabel::heuristic("B", Provenance::Panel)));

        let order: Vec<String> = store.snapshot().iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(order, vec!["2", "10", "..."]);
    }

    #[test]
    fn test_exact_never_downgraded() {
        let mut store = MappingStore::new();
        store.merge(key("1"), SourceLabel::exact("Paper", Provenance::InBand));

        assert!(!store.merge(key("1"), SourceLabel::heuristic("Other", Provenance::Sidebar)));
        assert!(!store.merge(key("1"), SourceLabel::placeholder(&key("1"))));
        assert_eq!(store.get(&key("1")).unwrap().text, "Paper");
    }

    #[test]
    fn test_equal_rank_replaces() {
        let mut store = MappingStore::new();
        store.merge(key("1"), SourceLabel::heuristic("Old", Provenance::Panel));
        assert!(store.merge(key("1"), SourceLabel::heuristic("New", Provenance::Panel)));
        assert_eq!(store.get(&key("1")).unwrap().text, "New");
    }

    #[test]
    fn test_identical_merge_reports_unchanged() {
        let mut store = MappingStore::new();
        let label = SourceLabel::exact("Paper", Provenance::InBand);
        assert!(store.merge(key("1"), label.clone()));
        assert!(!store.merge(key("1"), label));
    }

    #[test]
    fn test_manual_outranks_exact() {
        let mut store = MappingStore::new();
        store.merge(key("3"), SourceLabel::exact("Paper", Provenance::InBand));
        assert!(store.merge(key("3"), SourceLabel::manual("My name")));
        assert!(!store.merge(key("3"), SourceLabel::exact("Paper", Provenance::InBand)));
    }

    #[test]
    fn test_entries_wire_form() {
        let mut store = MappingStore::new();
        store.merge(key("1"), SourceLabel::exact("Paper", Provenance::InBand));
        let json = serde_json::to_value(store.entries()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "citation": "1",
                "filename": "Paper",
                "provenance": "inBand",
                "confidence": "exact"
            }])
        );
    }

    #[test]
    fn test_clear() {
        let mut store = MappingStore::new();
        store.merge(key("1"), SourceLabel::placeholder(&key("1")));
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }
}
