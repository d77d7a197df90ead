//! annotate-core: persistent text highlights for web pages, without a browser.
//!
//! This crate provides:
//! - `DocumentTree` trait for document access, with `MemoryDocument` as an
//!   arena-backed implementation
//! - `NodePath` / `Pattern` / ordinal anchors that re-locate a highlight after
//!   a reload (`path`, `pattern`, `span`)
//! - `AnnotationRecord` and the `AnnotationStore` persistence trait
//! - `Highlighter` for rendering highlight elements
//! - `Annotator`, the selection-capture state machine tying it all together

pub mod annotator;
pub mod config;
pub mod dom;
pub mod error;
pub mod highlight;
pub mod path;
pub mod pattern;
pub mod platform;
pub mod record;
pub mod span;
pub mod store;
pub mod text;

pub use annotator::{AnnotationState, Annotator, LoadReport, PendingAnnotation, SelectionSnapshot};
pub use config::{AnnotateConfig, FALLBACK_COLOR};
pub use dom::{DocumentTree, MemoryDocument, NodeId, NodeKind, TextRange};
pub use error::{AnnotateError, Result};
pub use highlight::Highlighter;
pub use path::{NodePath, PathStep, path_to, resolve_path};
pub use pattern::{Matcher, Pattern, PatternToken};
pub use platform::PlatformError;
pub use record::{AnnotationRecord, generate_id};
pub use smol_str::SmolStr;
pub use span::{carve, occurrence_index, range_matches, resolve_span};
pub use store::{AnnotationStore, MemoryStore};
