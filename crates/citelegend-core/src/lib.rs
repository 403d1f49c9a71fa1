//! Citation legend engine.
//!
//! Recovers a mapping from inline citation markers on a NotebookLM page to
//! the source documents they reference, and keeps it current while the
//! page changes. The page itself is reached through the [`page::Page`]
//! capability trait.

pub mod error;
pub mod export;
pub mod extractor;
pub mod key;
pub mod label;
pub mod marker;
pub mod messaging;
pub mod monitor;
pub mod page;
pub mod resolver;
pub mod session;
pub mod settings;
pub mod store;
pub mod task;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{EngineError, PageError, SettingsError};
pub use extractor::MarkerExtractor;
pub use key::CitationKey;
pub use label::{Confidence, Provenance, SourceLabel};
pub use marker::{MarkerShape, RawMarker};
pub use messaging::{MessageHandler, Request, Response};
pub use monitor::{ChangeMonitor, MonitorState, PassOutcome, ScanTarget};
pub use page::{Clipboard, ElementHandle, ElementSnapshot, Page, Presenter};
pub use resolver::{ResolverConfig, SourceResolver};
pub use session::{CitationSession, SessionBuilder};
pub use settings::{FileSettingsStore, MemorySettingsStore, Settings, SettingsStore};
pub use store::{MappingEntry, MappingStore};
