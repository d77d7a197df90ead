//! Browser DOM layer for annotate.
//!
//! Implements the core's document and storage traits over the live page.
//! It assumes a `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `dom`: `WebDocument`, the `DocumentTree` over `web_sys` nodes
//! - `storage`: `LocalStore`, records in `window.localStorage`
//! - `selection`: Selection API snapshots and tooltip geometry
//! - `logging`: console `tracing` subscriber
//!
//! # Re-exports
//!
//! This crate re-exports `annotate-core` for convenience, so consumers
//! only need to depend on `annotate-browser`.

// Re-export core crate
pub use annotate_core;
pub use annotate_core::*;

pub mod dom;
pub mod logging;
pub mod selection;
pub mod storage;

pub use dom::WebDocument;
pub use selection::{SelectionRect, clear_selection, current_selection, selection_rect};
pub use storage::LocalStore;

/// The annotator as it runs in a page.
pub type PageAnnotator = Annotator<WebDocument, LocalStore>;

/// Annotator over the current window's document, persisting to
/// `localStorage` under the configured prefix.
pub fn page_annotator(config: AnnotateConfig) -> std::result::Result<PageAnnotator, PlatformError> {
    let doc = WebDocument::current()?;
    let store = LocalStore::new(config.storage_prefix.clone());
    Ok(Annotator::new(doc, store, config))
}
