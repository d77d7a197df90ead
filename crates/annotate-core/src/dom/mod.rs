//! Document tree abstraction.
//!
//! The anchoring logic only needs a narrow view of the document: walking
//! parents and children, reading text and attributes, and a handful of
//! mutations (splitting text, wrapping and unwrapping highlights). The
//! `DocumentTree` trait captures that view so the same logic runs against the
//! browser DOM and against `MemoryDocument` in tests.
//!
//! All text offsets are in chars.

pub mod memory;

pub use memory::{MemoryDocument, NodeId};

use crate::platform::PlatformError;

/// Kind of a document node, as far as anchoring is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Text,
    /// Comments, processing instructions, doctypes.
    Other,
}

/// A char range inside a single text node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextRange<N> {
    pub node: N,
    pub start: usize,
    pub end: usize,
}

impl<N> TextRange<N> {
    pub fn new(node: N, start: usize, end: usize) -> Self {
        Self { node, start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read and mutate access to a document.
///
/// Implementations hand out cheap node handles. Handles must stay valid
/// across the mutations below for every node that is not removed.
pub trait DocumentTree {
    type Node: Clone + PartialEq + std::fmt::Debug;

    /// The document's root element (`<html>` in a browser).
    fn root_element(&self) -> Option<Self::Node>;

    fn kind(&self, node: &Self::Node) -> NodeKind;

    /// Lowercase tag name for elements, `None` otherwise.
    fn tag_name(&self, node: &Self::Node) -> Option<String>;

    fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;

    fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Character data of a text node.
    fn text(&self, node: &Self::Node) -> Option<String>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attribute(
        &mut self,
        node: &Self::Node,
        name: &str,
        value: &str,
    ) -> Result<(), PlatformError>;

    /// Set an inline style property on an element.
    fn set_style(
        &mut self,
        node: &Self::Node,
        property: &str,
        value: &str,
    ) -> Result<(), PlatformError>;

    /// Split a text node at `offset`.
    ///
    /// The original node keeps the text before `offset`; the returned node is
    /// its new next sibling holding the rest.
    fn split_text(&mut self, node: &Self::Node, offset: usize)
    -> Result<Self::Node, PlatformError>;

    /// Wrap `node` in a new element with the given tag, returning the wrapper.
    fn wrap(&mut self, node: &Self::Node, tag: &str) -> Result<Self::Node, PlatformError>;

    /// Replace an element by its children and merge adjacent text nodes
    /// of its former parent.
    fn unwrap(&mut self, element: &Self::Node) -> Result<(), PlatformError>;

    fn parent_element(&self, node: &Self::Node) -> Option<Self::Node> {
        self.parent_node(node)
            .filter(|parent| self.kind(parent) == NodeKind::Element)
    }

    fn child_elements(&self, node: &Self::Node) -> Vec<Self::Node> {
        self.child_nodes(node)
            .into_iter()
            .filter(|child| self.kind(child) == NodeKind::Element)
            .collect()
    }

    /// Text nodes under `node`, in document order.
    fn descendant_text_nodes(&self, node: &Self::Node) -> Vec<Self::Node> {
        let mut out = Vec::new();
        let mut stack = vec![node.clone()];
        while let Some(current) = stack.pop() {
            for child in self.child_nodes(&current).into_iter().rev() {
                if matches!(self.kind(&child), NodeKind::Text | NodeKind::Element) {
                    stack.push(child);
                }
            }
            if current != *node && self.kind(&current) == NodeKind::Text {
                out.push(current);
            }
        }
        out
    }

    /// Elements under `node` (excluding `node` itself), in document order.
    fn descendant_elements(&self, node: &Self::Node) -> Vec<Self::Node> {
        let mut out = Vec::new();
        let mut stack: Vec<Self::Node> = self.child_elements(node).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            stack.extend(self.child_elements(&current).into_iter().rev());
            out.push(current);
        }
        out
    }

    fn has_class(&self, node: &Self::Node, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Concatenated text of all descendant text nodes.
    fn text_content(&self, node: &Self::Node) -> String {
        if self.kind(node) == NodeKind::Text {
            return self.text(node).unwrap_or_default();
        }
        self.descendant_text_nodes(node)
            .iter()
            .filter_map(|text| self.text(text))
            .collect()
    }
}
