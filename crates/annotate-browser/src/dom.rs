//! `DocumentTree` over the live browser DOM.
//!
//! The DOM counts text offsets in UTF-16 code units while the core counts
//! chars, so every offset crossing this boundary is converted here.

use annotate_core::dom::{DocumentTree, NodeKind};
use annotate_core::text::char_to_utf16;
use annotate_core::PlatformError;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Node, Text};

/// The page's document, seen through [`DocumentTree`].
#[derive(Clone, Debug)]
pub struct WebDocument {
    document: Document,
}

impl WebDocument {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// The document of the current window.
    pub fn current() -> Result<Self, PlatformError> {
        let document = web_sys::window()
            .ok_or("no window")?
            .document()
            .ok_or("no document")?;
        Ok(Self::new(document))
    }

    pub fn raw(&self) -> &Document {
        &self.document
    }
}

fn as_element(node: &Node) -> Result<&Element, PlatformError> {
    node.dyn_ref::<Element>()
        .ok_or_else(|| PlatformError::from("node is not an element"))
}

impl DocumentTree for WebDocument {
    type Node = Node;

    fn root_element(&self) -> Option<Node> {
        self.document.document_element().map(Node::from)
    }

    fn kind(&self, node: &Node) -> NodeKind {
        match node.node_type() {
            Node::ELEMENT_NODE => NodeKind::Element,
            Node::TEXT_NODE => NodeKind::Text,
            Node::DOCUMENT_NODE => NodeKind::Document,
            _ => NodeKind::Other,
        }
    }

    fn tag_name(&self, node: &Node) -> Option<String> {
        node.dyn_ref::<Element>()
            .map(|element| element.tag_name().to_lowercase())
    }

    fn parent_node(&self, node: &Node) -> Option<Node> {
        node.parent_node()
    }

    fn child_nodes(&self, node: &Node) -> Vec<Node> {
        let list = node.child_nodes();
        (0..list.length()).filter_map(|i| list.get(i)).collect()
    }

    fn text(&self, node: &Node) -> Option<String> {
        if node.node_type() != Node::TEXT_NODE {
            return None;
        }
        node.node_value()
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        node.dyn_ref::<Element>()?.get_attribute(name)
    }

    fn set_attribute(&mut self, node: &Node, name: &str, value: &str) -> Result<(), PlatformError> {
        as_element(node)?
            .set_attribute(name, value)
            .map_err(|e| format!("set_attribute failed: {:?}", e).into())
    }

    fn set_style(&mut self, node: &Node, property: &str, value: &str) -> Result<(), PlatformError> {
        node.dyn_ref::<HtmlElement>()
            .ok_or("node is not an html element")?
            .style()
            .set_property(property, value)
            .map_err(|e| format!("set_property failed: {:?}", e).into())
    }

    fn split_text(&mut self, node: &Node, offset: usize) -> Result<Node, PlatformError> {
        let text = node.dyn_ref::<Text>().ok_or("node is not a text node")?;
        let data = node.node_value().unwrap_or_default();
        let utf16_offset = char_to_utf16(&data, offset);
        text.split_text(utf16_offset as u32)
            .map(Node::from)
            .map_err(|e| format!("split_text failed: {:?}", e).into())
    }

    fn wrap(&mut self, node: &Node, tag: &str) -> Result<Node, PlatformError> {
        let parent = node.parent_node().ok_or("node has no parent")?;
        let wrapper: Node = self
            .document
            .create_element(tag)
            .map_err(|e| format!("create_element failed: {:?}", e))?
            .into();
        parent
            .insert_before(&wrapper, Some(node))
            .map_err(|e| format!("insert_before failed: {:?}", e))?;
        wrapper
            .append_child(node)
            .map_err(|e| format!("append_child failed: {:?}", e))?;
        Ok(wrapper)
    }

    fn unwrap(&mut self, element: &Node) -> Result<(), PlatformError> {
        let parent = element.parent_node().ok_or("element has no parent")?;
        while let Some(child) = element.first_child() {
            parent
                .insert_before(&child, Some(element))
                .map_err(|e| format!("insert_before failed: {:?}", e))?;
        }
        parent
            .remove_child(element)
            .map_err(|e| format!("remove_child failed: {:?}", e))?;
        parent.normalize();
        Ok(())
    }
}
