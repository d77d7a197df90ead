//! JsAnnotator - the annotator wrapper for JavaScript.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Element;

use annotate_browser::{
    AnnotateConfig, AnnotateError, Highlighter, PageAnnotator, clear_selection,
    current_selection, logging, page_annotator, selection_rect,
};

use crate::types::{JsAnnotation, JsLoadReport, JsSelectionPrompt, JsState};

fn js_error(err: AnnotateError) -> JsError {
    JsError::new(&err.to_string())
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Highlights and comments on the current page, persisted in localStorage.
#[wasm_bindgen]
pub struct JsAnnotator {
    inner: PageAnnotator,
}

#[wasm_bindgen]
impl JsAnnotator {
    /// Create an annotator for the current document.
    ///
    /// `config` is an optional partial `AnnotateConfig` object; missing
    /// fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsAnnotator, JsError> {
        logging::init();
        let config: AnnotateConfig = if config.is_undefined() || config.is_null() {
            AnnotateConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?
        };
        let inner = page_annotator(config).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Self { inner })
    }

    /// Render every stored annotation. Returns a `JsLoadReport`.
    pub fn load(&mut self) -> Result<JsValue, JsError> {
        let report = self.inner.load().map_err(js_error)?;
        to_js(&JsLoadReport::from(&report))
    }

    /// Start an annotation from the current selection.
    ///
    /// Returns a `JsSelectionPrompt`, or `null` when the selection cannot be
    /// annotated.
    #[wasm_bindgen(js_name = handleSelection)]
    pub fn handle_selection(&mut self) -> Result<JsValue, JsError> {
        let Some(snapshot) = current_selection() else {
            return Ok(JsValue::NULL);
        };
        let Some(record) = self.inner.handle_selection(&snapshot).map_err(js_error)? else {
            return Ok(JsValue::NULL);
        };
        let prompt = JsSelectionPrompt {
            annotation: record.into(),
            rect: selection_rect().map(Into::into),
        };
        to_js(&prompt)
    }

    /// Pick palette color `index` for the current annotation. Returns the
    /// updated `JsAnnotation`.
    #[wasm_bindgen(js_name = chooseColor)]
    pub fn choose_color(&mut self, index: usize) -> Result<JsValue, JsError> {
        let annotation = JsAnnotation::from(self.inner.choose_color(index).map_err(js_error)?);
        clear_selection();
        to_js(&annotation)
    }

    #[wasm_bindgen(js_name = setComment)]
    pub fn set_comment(&mut self, comment: &str) -> Result<(), JsError> {
        self.inner.set_comment(comment).map_err(js_error)
    }

    /// Open a clicked highlight for editing. Returns its `JsAnnotation`, or
    /// `null` when `element` is not a highlight.
    #[wasm_bindgen(js_name = openHighlight)]
    pub fn open_highlight(&mut self, element: Element) -> Result<JsValue, JsError> {
        match self.inner.open_highlight(element.as_ref()).map_err(js_error)? {
            Some(record) => to_js(&JsAnnotation::from(record)),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = deleteCurrent)]
    pub fn delete_current(&mut self) -> Result<(), JsError> {
        self.inner.delete().map_err(js_error)
    }

    #[wasm_bindgen(js_name = deleteById)]
    pub fn delete_by_id(&mut self, id: &str) -> Result<(), JsError> {
        self.inner.delete_by_id(id).map_err(js_error)
    }

    /// Close the tooltip without changes.
    pub fn dismiss(&mut self) {
        self.inner.dismiss();
        clear_selection();
    }

    /// Rendered annotations in document order, as `JsAnnotation[]`.
    pub fn navigator(&self) -> Result<JsValue, JsError> {
        let annotations: Vec<JsAnnotation> = self
            .inner
            .records_in_document_order()
            .into_iter()
            .map(JsAnnotation::from)
            .collect();
        to_js(&annotations)
    }

    /// The rendered highlight element for `id`, for scrolling it into view.
    #[wasm_bindgen(js_name = highlightElement)]
    pub fn highlight_element(&self, id: &str) -> Option<Element> {
        Highlighter::new(self.inner.config())
            .find(self.inner.document(), id)
            .and_then(|node| node.dyn_into::<Element>().ok())
    }

    /// Current lifecycle state, as a `JsState`.
    pub fn state(&self) -> Result<JsValue, JsError> {
        to_js(&JsState::from(self.inner.state()))
    }

    /// The configured palette.
    pub fn colors(&self) -> Vec<String> {
        self.inner
            .config()
            .colors
            .iter()
            .map(|c| c.to_string())
            .collect()
    }
}
