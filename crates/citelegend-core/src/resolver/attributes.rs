use crate::key::CitationKey;
use crate::label::{Provenance, SourceLabel};
use crate::page::ElementSnapshot;

/// Label from explicit attributes on the marker or its ancestors.
pub(super) fn resolve(element: &ElementSnapshot) -> Option<SourceLabel> {
    let aria = element
        .attr("aria-label")
        .filter(|label| !matches!(CitationKey::parse(label), None | Some(CitationKey::Numeric(_))))
        .filter(|label| label.trim() != crate::key::ELLIPSIS);

    [
        element.attr("data-source-title"),
        aria,
        element.attr("title"),
    ]
    .into_iter()
    .flatten()
    .chain(element.ancestor_titles.iter().map(String::as_str))
    .map(str::trim)
    .find(|s| !s.is_empty())
    .map(|s| SourceLabel::heuristic(s, Provenance::Attribute))
}
