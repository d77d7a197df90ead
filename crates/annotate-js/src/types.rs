//! Types exposed to JavaScript via wasm-bindgen.

use annotate_browser::{AnnotateError, AnnotationRecord, AnnotationState, LoadReport, SelectionRect};
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

/// An annotation as the host page sees it.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JsAnnotation {
    pub id: String,
    /// The highlighted text as it was selected.
    pub text: String,
    /// Human-readable anchor path, e.g. `body[0] > p[1]`.
    pub path: String,
    pub ordinal: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl From<&AnnotationRecord> for JsAnnotation {
    fn from(record: &AnnotationRecord) -> Self {
        Self {
            id: record.id.to_string(),
            text: record.raw_text.clone(),
            path: record.path.to_string(),
            ordinal: record.ordinal,
            color: record.highlight_color.as_ref().map(|c| c.to_string()),
            comment: record.comment.clone(),
        }
    }
}

/// Viewport rectangle for placing the tooltip.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct JsRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<SelectionRect> for JsRect {
    fn from(rect: SelectionRect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}

/// A qualifying selection, waiting for a color.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JsSelectionPrompt {
    pub annotation: JsAnnotation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rect: Option<JsRect>,
}

/// Where the annotator is in its lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum JsState {
    Idle,
    PendingColorChoice { annotation: JsAnnotation },
    Committed { id: String },
    EditingExisting { id: String },
}

impl<N> From<&AnnotationState<N>> for JsState {
    fn from(state: &AnnotationState<N>) -> Self {
        match state {
            AnnotationState::Idle => JsState::Idle,
            AnnotationState::PendingColorChoice(pending) => JsState::PendingColorChoice {
                annotation: (&pending.record).into(),
            },
            AnnotationState::Committed(id) => JsState::Committed { id: id.to_string() },
            AnnotationState::EditingExisting(id) => JsState::EditingExisting { id: id.to_string() },
        }
    }
}

/// A stored record that could not be shown.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct JsLoadFailure {
    pub key: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct JsLoadReport {
    pub rendered: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<JsLoadFailure>,
}

impl From<&LoadReport> for JsLoadReport {
    fn from(report: &LoadReport) -> Self {
        Self {
            rendered: report.rendered.iter().map(|id| id.to_string()).collect(),
            skipped: report.skipped.iter().map(|id| id.to_string()).collect(),
            failed: report
                .failed
                .iter()
                .map(|(key, err): &(String, AnnotateError)| JsLoadFailure {
                    key: key.clone(),
                    message: err.to_string(),
                })
                .collect(),
        }
    }
}
