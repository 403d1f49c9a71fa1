use crate::label::{clean_long_form, short_label, Provenance, SourceLabel};
use crate::marker::RawMarker;

/// Label from the long-form text the marker itself carries.
pub(super) fn resolve(marker: &RawMarker, max_len: usize) -> Option<SourceLabel> {
    let raw = marker.long_form.as_deref()?;
    let clean = clean_long_form(raw);
    if clean.is_empty() {
        return None;
    }
    Some(SourceLabel::exact(
        short_label(&clean, max_len),
        Provenance::InBand,
    ))
}
