use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

use crate::path::NodePath;
use crate::platform::PlatformError;

pub type Result<T> = std::result::Result<T, AnnotateError>;

#[derive(Debug, Error, Diagnostic)]
pub enum AnnotateError {
    #[error("no element found at path {path}")]
    #[diagnostic(
        code(annotate::resolve::element),
        help("the page structure changed since the annotation was captured")
    )]
    ElementResolution { path: NodePath },

    #[error("occurrence {ordinal} of `{pattern}` not found")]
    #[diagnostic(
        code(annotate::resolve::span),
        help("the text of the element changed since the annotation was captured")
    )]
    SpanResolution { pattern: String, ordinal: usize },

    #[error("malformed record {key}: {reason}")]
    #[diagnostic(code(annotate::record::malformed))]
    MalformedRecord { key: String, reason: String },

    #[error("cannot build a pattern from empty text")]
    #[diagnostic(code(annotate::pattern::empty))]
    EmptyPattern,

    #[error("selection cannot be annotated: {0}")]
    #[diagnostic(code(annotate::selection::unsupported))]
    UnsupportedSelection(String),

    #[error("no annotation is being created or edited")]
    #[diagnostic(code(annotate::state::inactive))]
    NoActiveAnnotation,

    #[error("unknown annotation {0}")]
    #[diagnostic(code(annotate::state::unknown))]
    UnknownAnnotation(SmolStr),

    #[error("document operation failed: {0}")]
    #[diagnostic(code(annotate::platform))]
    Platform(#[from] PlatformError),

    #[error("invalid configuration: {0}")]
    #[diagnostic(code(annotate::config))]
    Config(String),

    #[error("storage error: {0}")]
    #[diagnostic(code(annotate::storage))]
    Storage(String),
}

impl AnnotateError {
    /// True for failures that only affect a single persisted record.
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            AnnotateError::ElementResolution { .. }
                | AnnotateError::SpanResolution { .. }
                | AnnotateError::MalformedRecord { .. }
        )
    }
}
