//! Raw citation markers as found on the page.

use serde::Serialize;

use crate::key::CitationKey;
use crate::page::ElementSnapshot;

/// Which extraction strategy found a marker, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerShape {
    /// `[[ long form ]]` in the page text.
    LongForm,
    /// A clickable citation control.
    Interactive,
    /// `[N]` in free text.
    Bracketed,
    /// Superscripts and styled spans from older page layouts.
    Legacy,
}

/// One citation occurrence, valid for a single extraction pass.
#[derive(Debug, Clone)]
pub struct RawMarker {
    pub key: CitationKey,
    pub shape: MarkerShape,
    /// The marker element, when the marker is an element at all.
    pub element: Option<ElementSnapshot>,
    /// An explicit long-form citation string carried by the marker.
    pub long_form: Option<String>,
}

impl RawMarker {
    pub fn long_form(key: CitationKey, text: impl Into<String>) -> Self {
        Self {
            key,
            shape: MarkerShape::LongForm,
            element: None,
            long_form: Some(text.into()),
        }
    }

    pub fn bracketed(key: CitationKey) -> Self {
        Self {
            key,
            shape: MarkerShape::Bracketed,
            element: None,
            long_form: None,
        }
    }

    pub fn element(
        key: CitationKey,
        shape: MarkerShape,
        element: ElementSnapshot,
        long_form: Option<String>,
    ) -> Self {
        Self {
            key,
            shape,
            element: Some(element),
            long_form,
        }
    }
}
