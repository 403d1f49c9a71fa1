//! Text exports: the legend, copied-text enhancement and the transcript.

use std::sync::LazyLock;

use regex::Regex;

use crate::label::{clean_long_form, short_label};
use crate::page::TranscriptSource;
use crate::store::MappingEntry;

pub const LEGEND_BANNER: &str = "Citation Mapping Legend\n=====================";

pub const EMPTY_LEGEND: &str = "No citations found";

const SOURCES_HEADING: &str = "Sources:";

static LONG_FORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("valid regex"));
static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
static HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));
static SPACE_BEFORE_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\[").expect("valid regex"));
static SPACE_AFTER_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]\s+").expect("valid regex"));

/// One `Citation <key> → <label>` line per entry.
pub fn legend_text(entries: &[MappingEntry], with_banner: bool) -> String {
    let body = if entries.is_empty() {
        EMPTY_LEGEND.to_string()
    } else {
        entries
            .iter()
            .map(|e| format!("Citation {} → {}", e.citation, e.filename))
            .collect::<Vec<_>>()
            .join("\n")
    };

    if with_banner {
        format!("{}\n{}", LEGEND_BANNER, body)
    } else {
        body
    }
}

/// Rewrite `[[long form]]` citations in copied text to `[short label]`
/// and append a numbered source list. Text without long-form citations
/// is returned unchanged.
pub fn enhance_copied_text(text: &str, max_label_len: usize) -> String {
    let mut sources = Vec::new();
    let replaced = LONG_FORM.replace_all(text, |cap: &regex::Captures<'_>| {
        let clean = clean_long_form(&cap[1]);
        let short = short_label(&clean, max_label_len);
        sources.push(clean);
        format!("[{}]", short)
    });

    if sources.is_empty() {
        return text.to_string();
    }

    let list = sources
        .iter()
        .enumerate()
        .map(|(i, name)| format!("[{}] {}", i + 1, name))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\n\n{}\n{}", replaced, SOURCES_HEADING, list)
}

/// Join transcript paragraphs and tidy whitespace. `None` when nothing
/// readable is left.
pub fn normalize_transcript(source: &TranscriptSource) -> Option<String> {
    let paragraphs: Vec<&str> = source
        .paragraphs
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();

    let raw = if paragraphs.is_empty() {
        source.fallback_text.clone().unwrap_or_default()
    } else {
        paragraphs.join("\n\n")
    };

    let text = EXCESS_NEWLINES.replace_all(&raw, "\n\n");
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");
    let text = SPACE_BEFORE_BRACKET.replace_all(&text, " [");
    let text = SPACE_AFTER_BRACKET.replace_all(&text, "] ");
    let text = text.trim();

    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::CitationKey;
    use crate::label::{Confidence, Provenance, DEFAULT_MAX_LABEL_LEN};

    fn entry(key: &str, name: &str) -> MappingEntry {
        MappingEntry {
            citation: key.parse::<CitationKey>().unwrap(),
            filename: name.to_string(),
            provenance: Provenance::InBand,
            confidence: Confidence::Exact,
        }
    }

    #[test]
    fn test_legend_with_banner() {
        let text = legend_text(&[entry("1", "A.pdf"), entry("...", "Source ...")], true);
        assert_eq!(
            text,
            "Citation Mapping Legend\n=====================\nCitation 1 → A.pdf\nCitation ... → Source ..."
        );
    }

    #[test]
    fn test_legend_empty() {
        assert_eq!(legend_text(&[], false), "No citations found");
        assert!(legend_text(&[], true).ends_with("=====================\nNo citations found"));
    }

    #[test]
    fn test_enhance_copied_text() {
        let text = "AI helps [[Brynjolfsson et al. - 2023 - Generative AI at Work.pdf]].";
        let enhanced = enhance_copied_text(text, DEFAULT_MAX_LABEL_LEN);
        assert_eq!(
            enhanced,
            "AI helps [Brynjolfsson et al. (2023)].\n\nSources:\n[1] Brynjolfsson et al. - 2023 - Generative AI at Work"
        );
    }

    #[test]
    fn test_enhance_without_citations_unchanged() {
        assert_eq!(enhance_copied_text("plain [1] text", 50), "plain [1] text");
    }

    #[test]
    fn test_normalize_transcript() {
        let source = TranscriptSource {
            paragraphs: vec![
                "First   point\t[1]   continues".to_string(),
                "  ".to_string(),
                "Second point [2]".to_string(),
            ],
            fallback_text: None,
        };
        assert_eq!(
            normalize_transcript(&source).unwrap(),
            "First point [1] continues\n\nSecond point [2]"
        );
    }

    #[test]
    fn test_normalize_fallback_and_empty() {
        let source = TranscriptSource {
            paragraphs: vec![],
            fallback_text: Some("\n\n\n\nOnly text\n".to_string()),
        };
        assert_eq!(normalize_transcript(&source).unwrap(), "Only text");
        assert_eq!(normalize_transcript(&TranscriptSource::default()), None);
    }
}
