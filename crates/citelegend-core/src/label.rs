//! Resolved source labels and the long-form name cleanup rules.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::key::CitationKey;

/// Default length above which a clean name without separator is truncated.
pub const DEFAULT_MAX_LABEL_LEN: usize = 50;

const ELLIPSIS_SUFFIX: &str = "...";
const AUTHOR_YEAR_SEPARATOR: &str = " - ";

static DRIVE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^drive_pdf\s+").expect("valid regex"));
static PDF_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.pdf$").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// How much a label can be trusted. Ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Placeholder,
    Heuristic,
    Exact,
    /// User-entered; outranks every automatic strategy.
    Manual,
}

/// Which strategy produced a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Provenance {
    InBand,
    Introspection,
    Attribute,
    Panel,
    Sidebar,
    Placeholder,
    Override,
}

/// A human-readable name for the document a citation refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLabel {
    pub text: String,
    pub provenance: Provenance,
    pub confidence: Confidence,
}

impl SourceLabel {
    pub fn new(text: impl Into<String>, provenance: Provenance, confidence: Confidence) -> Self {
        Self {
            text: text.into(),
            provenance,
            confidence,
        }
    }

    pub fn exact(text: impl Into<String>, provenance: Provenance) -> Self {
        Self::new(text, provenance, Confidence::Exact)
    }

    pub fn heuristic(text: impl Into<String>, provenance: Provenance) -> Self {
        Self::new(text, provenance, Confidence::Heuristic)
    }

    /// The generic `Source <N>` label used when nothing resolves.
    pub fn placeholder(key: &CitationKey) -> Self {
        Self::new(
            format!("Source {}", key),
            Provenance::Placeholder,
            Confidence::Placeholder,
        )
    }

    pub fn manual(text: impl Into<String>) -> Self {
        Self::new(text, Provenance::Override, Confidence::Manual)
    }
}

/// Strip Drive/PDF noise from a long-form citation and collapse whitespace.
pub fn clean_long_form(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_prefix = DRIVE_PREFIX.replace(trimmed, "");
    let without_suffix = PDF_SUFFIX.replace(&without_prefix, "");
    WHITESPACE
        .replace_all(&without_suffix, " ")
        .trim()
        .to_string()
}

/// Shorten a clean name for display.
///
/// `Author - Year - Title` becomes `Author (Year)`; otherwise names longer
/// than `max_len` characters keep `max_len - 3` characters plus `...`.
pub fn short_label(clean: &str, max_len: usize) -> String {
    if clean.contains(AUTHOR_YEAR_SEPARATOR) {
        let mut parts = clean.split(AUTHOR_YEAR_SEPARATOR);
        if let (Some(author), Some(year)) = (parts.next(), parts.next()) {
            return format!("{} ({})", author, year);
        }
    }

    if clean.chars().count() > max_len {
        let keep = max_len.saturating_sub(ELLIPSIS_SUFFIX.len());
        let mut truncated: String = clean.chars().take(keep).collect();
        truncated.push_str(ELLIPSIS_SUFFIX);
        return truncated;
    }

    clean.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_order() {
        assert!(Confidence::Placeholder < Confidence::Heuristic);
        assert!(Confidence::Heuristic < Confidence::Exact);
        assert!(Confidence::Exact < Confidence::Manual);
    }

    #[test]
    fn test_clean_strips_drive_prefix_and_extension() {
        let clean = clean_long_form("drive_pdf   Rogers - 1983 - Diffusion   of innovations.pdf");
        assert_eq!(clean, "Rogers - 1983 - Diffusion of innovations");
    }

    #[test]
    fn test_clean_keeps_inner_pdf() {
        assert_eq!(clean_long_form("notes.pdf summary"), "notes.pdf summary");
    }

    #[test]
    fn test_short_label_author_year() {
        let clean = clean_long_form("Brynjolfsson et al. - 2023 - Generative AI at Work.pdf");
        assert_eq!(
            short_label(&clean, DEFAULT_MAX_LABEL_LEN),
            "Brynjolfsson et al. (2023)"
        );
    }

    #[test]
    fn test_short_label_truncates_long_names() {
        let clean = "A".repeat(60);
        let short = short_label(&clean, DEFAULT_MAX_LABEL_LEN);
        assert_eq!(short.chars().count(), 50);
        assert!(short.ends_with("..."));
        assert_eq!(&short[..47], &clean[..47]);
    }

    #[test]
    fn test_short_label_exactly_at_limit_unchanged() {
        let clean = "B".repeat(50);
        assert_eq!(short_label(&clean, DEFAULT_MAX_LABEL_LEN), clean);
    }

    #[test]
    fn test_short_label_counts_chars_not_bytes() {
        let clean = "ä".repeat(55);
        let short = short_label(&clean, DEFAULT_MAX_LABEL_LEN);
        assert_eq!(short.chars().count(), 50);
    }

    #[test]
    fn test_placeholder_label() {
        let label = SourceLabel::placeholder(&CitationKey::Numeric(4));
        assert_eq!(label.text, "Source 4");
        assert_eq!(label.confidence, Confidence::Placeholder);
        assert_eq!(label.provenance, Provenance::Placeholder);
    }

    #[test]
    fn test_confidence_serialize() {
        assert_eq!(
            serde_json::to_string(&Confidence::Heuristic).unwrap(),
            "\"heuristic\""
        );
        assert_eq!(
            serde_json::to_string(&Provenance::InBand).unwrap(),
            "\"inBand\""
        );
    }
}
