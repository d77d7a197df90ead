//! Rendering of highlight elements.
//!
//! A highlight is a wrapper element around a carved text node. It carries the
//! highlight class and the record id as an attribute, so a click on it is
//! mapped back to its record by attribute lookup rather than by a captured
//! closure.

use crate::config::AnnotateConfig;
use crate::dom::DocumentTree;
use crate::error::Result;
use crate::record::AnnotationRecord;

/// Renders, finds, recolors and removes highlight elements.
#[derive(Clone, Copy, Debug)]
pub struct Highlighter<'a> {
    config: &'a AnnotateConfig,
}

impl<'a> Highlighter<'a> {
    pub fn new(config: &'a AnnotateConfig) -> Self {
        Self { config }
    }

    /// Wrap `node` in a highlight element for `record`.
    pub fn render<D: DocumentTree>(
        &self,
        doc: &mut D,
        node: &D::Node,
        record: &AnnotationRecord,
    ) -> Result<D::Node> {
        let element = doc.wrap(node, &self.config.highlight_tag)?;
        doc.set_attribute(&element, "class", &self.config.highlight_class)?;
        doc.set_attribute(&element, &self.config.id_attribute, &record.id)?;
        let color = record
            .highlight_color
            .as_deref()
            .unwrap_or(self.config.fallback_color.as_str());
        doc.set_style(&element, "background-color", color)?;
        tracing::debug!(id = %record.id, color, "rendered highlight");
        Ok(element)
    }

    /// The rendered highlight element for `id`, if any.
    pub fn find<D: DocumentTree>(&self, doc: &D, id: &str) -> Option<D::Node> {
        self.all(doc).into_iter().find(|el| {
            doc.attribute(el, &self.config.id_attribute).as_deref() == Some(id)
        })
    }

    /// All rendered highlight elements, in document order.
    pub fn all<D: DocumentTree>(&self, doc: &D) -> Vec<D::Node> {
        let Some(root) = doc.root_element() else {
            return Vec::new();
        };
        doc.descendant_elements(&root)
            .into_iter()
            .filter(|el| self.is_highlight(doc, el))
            .collect()
    }

    /// Record id carried by a highlight element.
    pub fn id_of<D: DocumentTree>(&self, doc: &D, element: &D::Node) -> Option<String> {
        if !self.is_highlight(doc, element) {
            return None;
        }
        doc.attribute(element, &self.config.id_attribute)
    }

    pub fn is_highlight<D: DocumentTree>(&self, doc: &D, node: &D::Node) -> bool {
        doc.has_class(node, &self.config.highlight_class)
    }

    /// Set the background of the highlight for `id`. Returns false when no
    /// such highlight is rendered.
    pub fn recolor<D: DocumentTree>(&self, doc: &mut D, id: &str, color: &str) -> Result<bool> {
        let Some(element) = self.find(doc, id) else {
            return Ok(false);
        };
        doc.set_style(&element, "background-color", color)?;
        Ok(true)
    }

    /// Unwrap the highlight for `id`, leaving its text in place. Returns false
    /// when no such highlight is rendered.
    pub fn remove<D: DocumentTree>(&self, doc: &mut D, id: &str) -> Result<bool> {
        let Some(element) = self.find(doc, id) else {
            return Ok(false);
        };
        doc.unwrap(&element)?;
        Ok(true)
    }
}
