//! Arena-backed in-memory document.
//!
//! `MemoryDocument` gives the anchoring logic a real tree to work on outside
//! the browser. It understands enough HTML to load fixture pages: elements
//! with attributes, text with the common entities, comments and void tags.
//! Detached nodes stay in the arena so handles never dangle.

use smol_str::SmolStr;

use super::{DocumentTree, NodeKind};
use crate::platform::PlatformError;

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Handle to a node in a `MemoryDocument`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
enum NodeData {
    Document,
    Element {
        tag: SmolStr,
        attributes: Vec<(SmolStr, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Clone, Debug)]
struct NodeEntry {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An in-memory document tree.
#[derive(Clone, Debug)]
pub struct MemoryDocument {
    nodes: Vec<NodeEntry>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create a document holding an empty `<html><body></body></html>`.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: vec![NodeEntry {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        };
        let html = doc.create_element("html");
        let body = doc.create_element("body");
        doc.append_child(doc.document(), html);
        doc.append_child(html, body);
        doc
    }

    /// Parse an HTML fragment into a document.
    ///
    /// A fragment whose only top-level element is `<html>` becomes the root
    /// element as-is. Anything else is placed inside a generated `<body>`
    /// (unless it already is one) under a generated `<html>`.
    pub fn parse(html: &str) -> Result<Self, PlatformError> {
        let mut doc = Self {
            nodes: vec![NodeEntry {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        };
        let fragment = doc.create_element("#fragment");
        Parser::new(html).parse_into(&mut doc, fragment)?;

        let top: Vec<NodeId> = doc.nodes[fragment.0].children.clone();
        let top_elements: Vec<NodeId> = top
            .iter()
            .copied()
            .filter(|id| matches!(doc.nodes[id.0].data, NodeData::Element { .. }))
            .collect();
        let is_single = |tag: &str| {
            top_elements.len() == 1 && doc.tag_of(top_elements[0]) == Some(tag)
        };

        let root = if is_single("html") {
            top_elements[0]
        } else if is_single("body") {
            let html = doc.create_element("html");
            doc.append_child(html, top_elements[0]);
            html
        } else {
            let html = doc.create_element("html");
            let body = doc.create_element("body");
            doc.append_child(html, body);
            for child in top {
                doc.append_child(body, child);
            }
            html
        };
        doc.append_child(doc.document(), root);
        Ok(doc)
    }

    /// The document node.
    pub fn document(&self) -> NodeId {
        NodeId(0)
    }

    /// The first `<body>` element, if any.
    pub fn body(&self) -> Option<NodeId> {
        self.elements_by_tag("body").into_iter().next()
    }

    /// All elements with `tag`, in document order.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        let tag = tag.to_ascii_lowercase();
        let Some(root) = self.root_element() else {
            return Vec::new();
        };
        std::iter::once(root)
            .chain(self.descendant_elements(&root))
            .filter(|id| self.tag_of(*id) == Some(tag.as_str()))
            .collect()
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element {
            tag: SmolStr::new(tag.to_ascii_lowercase()),
            attributes: Vec::new(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Move `child` into `parent` right before `reference`.
    ///
    /// Appends when `reference` is not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.detach(child);
        let siblings = &mut self.nodes[parent.0].children;
        let idx = siblings
            .iter()
            .position(|id| *id == reference)
            .unwrap_or(siblings.len());
        siblings.insert(idx, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Detach `node` from its parent.
    pub fn remove(&mut self, node: NodeId) {
        self.detach(node);
    }

    /// Replace the character data of a text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), PlatformError> {
        match &mut self.nodes[node.0].data {
            NodeData::Text(data) => {
                *data = text.to_string();
                Ok(())
            }
            _ => Err("set_text on a non-text node".into()),
        }
    }

    /// Merge adjacent text nodes and drop empty ones under `node`.
    pub fn normalize(&mut self, node: NodeId) {
        let children = self.nodes[node.0].children.clone();
        let mut previous_text: Option<NodeId> = None;
        for child in children {
            if self.kind(&child) == NodeKind::Element {
                self.normalize(child);
            }
            let text = self.text(&child);
            match (text, previous_text) {
                (Some(data), _) if data.is_empty() => self.detach(child),
                (Some(data), Some(prev)) => {
                    if let NodeData::Text(prev_data) = &mut self.nodes[prev.0].data {
                        prev_data.push_str(&data);
                    }
                    self.detach(child);
                }
                (Some(_), None) => previous_text = Some(child),
                (None, _) => previous_text = None,
            }
        }
    }

    /// Serialize a node and its subtree.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    /// Serialize the children of a node.
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in &self.nodes[node.0].children {
            self.write_node(*child, &mut out);
        }
        out
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(NodeEntry {
            data,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|id| *id != node);
        }
    }

    fn tag_of(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].data {
            NodeData::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    fn entry(&self, node: NodeId) -> Option<&NodeEntry> {
        self.nodes.get(node.0)
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].data {
            NodeData::Document => {
                for child in &self.nodes[node.0].children {
                    self.write_node(*child, out);
                }
            }
            NodeData::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape(value, true));
                    out.push('"');
                }
                out.push('>');
                if VOID_TAGS.contains(&tag.as_str()) {
                    return;
                }
                for child in &self.nodes[node.0].children {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            NodeData::Text(text) => out.push_str(&escape(text, false)),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }
}

impl DocumentTree for MemoryDocument {
    type Node = NodeId;

    fn root_element(&self) -> Option<NodeId> {
        self.nodes[0]
            .children
            .iter()
            .copied()
            .find(|id| matches!(self.nodes[id.0].data, NodeData::Element { .. }))
    }

    fn kind(&self, node: &NodeId) -> NodeKind {
        match self.entry(*node).map(|e| &e.data) {
            Some(NodeData::Document) => NodeKind::Document,
            Some(NodeData::Element { .. }) => NodeKind::Element,
            Some(NodeData::Text(_)) => NodeKind::Text,
            _ => NodeKind::Other,
        }
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        self.entry(*node)?;
        self.tag_of(*node).map(str::to_string)
    }

    fn parent_node(&self, node: &NodeId) -> Option<NodeId> {
        self.entry(*node)?.parent
    }

    fn child_nodes(&self, node: &NodeId) -> Vec<NodeId> {
        self.entry(*node)
            .map(|e| e.children.clone())
            .unwrap_or_default()
    }

    fn text(&self, node: &NodeId) -> Option<String> {
        match &self.entry(*node)?.data {
            NodeData::Text(text) => Some(text.clone()),
            _ => None,
        }
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        match &self.entry(*node)?.data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(attr, _)| attr.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.clone()),
            _ => None,
        }
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> Result<(), PlatformError> {
        let entry = self
            .nodes
            .get_mut(node.0)
            .ok_or_else(|| PlatformError(format!("unknown node {:?}", node)))?;
        match &mut entry.data {
            NodeData::Element { attributes, .. } => {
                let name = name.to_ascii_lowercase();
                match attributes.iter_mut().find(|(attr, _)| *attr == name) {
                    Some((_, existing)) => *existing = value.to_string(),
                    None => attributes.push((SmolStr::new(name), value.to_string())),
                }
                Ok(())
            }
            _ => Err("set_attribute on a non-element node".into()),
        }
    }

    fn set_style(&mut self, node: &NodeId, property: &str, value: &str) -> Result<(), PlatformError> {
        let current = self.attribute(node, "style").unwrap_or_default();
        let mut declarations: Vec<(String, String)> = current
            .split(';')
            .filter_map(|decl| {
                let (prop, val) = decl.split_once(':')?;
                Some((prop.trim().to_string(), val.trim().to_string()))
            })
            .filter(|(prop, _)| !prop.is_empty())
            .collect();
        match declarations.iter_mut().find(|(prop, _)| prop == property) {
            Some((_, existing)) => *existing = value.to_string(),
            None => declarations.push((property.to_string(), value.to_string())),
        }
        let style = declarations
            .iter()
            .map(|(prop, val)| format!("{}: {};", prop, val))
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute(node, "style", &style)
    }

    fn split_text(&mut self, node: &NodeId, offset: usize) -> Result<NodeId, PlatformError> {
        let text = self
            .text(node)
            .ok_or_else(|| PlatformError::from("split_text on a non-text node"))?;
        let len = text.chars().count();
        if offset > len {
            return Err(format!("split offset {} beyond text length {}", offset, len).into());
        }
        let split_at = crate::text::char_to_byte(&text, offset);
        let (head, tail) = text.split_at(split_at);
        self.set_text(*node, head)?;
        let tail = self.create_text(tail);

        if let Some(parent) = self.nodes[node.0].parent {
            let siblings = &mut self.nodes[parent.0].children;
            let idx = siblings
                .iter()
                .position(|id| id == node)
                .map(|idx| idx + 1)
                .unwrap_or(siblings.len());
            siblings.insert(idx, tail);
            self.nodes[tail.0].parent = Some(parent);
        }
        Ok(tail)
    }

    fn wrap(&mut self, node: &NodeId, tag: &str) -> Result<NodeId, PlatformError> {
        let parent = self
            .nodes
            .get(node.0)
            .and_then(|e| e.parent)
            .ok_or_else(|| PlatformError::from("cannot wrap a detached node"))?;
        let wrapper = self.create_element(tag);
        self.insert_before(parent, wrapper, *node);
        self.append_child(wrapper, *node);
        Ok(wrapper)
    }

    fn unwrap(&mut self, element: &NodeId) -> Result<(), PlatformError> {
        if self.kind(element) != NodeKind::Element {
            return Err("unwrap on a non-element node".into());
        }
        let parent = self.nodes[element.0]
            .parent
            .ok_or_else(|| PlatformError::from("cannot unwrap a detached element"))?;
        for child in self.nodes[element.0].children.clone() {
            self.insert_before(parent, child, *element);
        }
        self.detach(*element);
        self.normalize(parent);
        Ok(())
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];
        let entity_end = rest.find(';').filter(|end| *end <= 10);
        let decoded = entity_end.and_then(|end| {
            let decoded = match &rest[1..end] {
                "amp" => '&',
                "lt" => '<',
                "gt" => '>',
                "quot" => '"',
                "apos" | "#39" => '\'',
                "nbsp" => '\u{a0}',
                entity => {
                    let code = entity.strip_prefix('#')?;
                    let code = match code.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                        None => code.parse().ok()?,
                    };
                    char::from_u32(code)?
                }
            };
            Some((decoded, end))
        });
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Minimal HTML tokenizer for fixture documents.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn parse_into(&mut self, doc: &mut MemoryDocument, root: NodeId) -> Result<(), PlatformError> {
        let mut open: Vec<NodeId> = vec![root];

        while self.pos < self.input.len() {
            let current = *open.last().unwrap_or(&root);
            let rest = self.rest();

            if let Some(comment) = rest.strip_prefix("<!--") {
                let end = comment
                    .find("-->")
                    .ok_or_else(|| PlatformError::from("unterminated comment"))?;
                let node = doc.push(NodeData::Comment(comment[..end].to_string()));
                doc.append_child(current, node);
                self.pos += 4 + end + 3;
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                let end = rest
                    .find('>')
                    .ok_or_else(|| PlatformError::from("unterminated declaration"))?;
                self.pos += end + 1;
            } else if let Some(close) = rest.strip_prefix("</") {
                let end = close
                    .find('>')
                    .ok_or_else(|| PlatformError::from("unterminated end tag"))?;
                let tag = close[..end].trim().to_ascii_lowercase();
                if let Some(idx) = open
                    .iter()
                    .rposition(|id| doc.tag_of(*id) == Some(tag.as_str()))
                    .filter(|idx| *idx > 0)
                {
                    open.truncate(idx);
                }
                self.pos += 2 + end + 1;
            } else if rest.starts_with('<')
                && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                let (element, self_closing, tag) = self.parse_start_tag(doc)?;
                doc.append_child(current, element);
                if !self_closing && !VOID_TAGS.contains(&tag.as_str()) {
                    open.push(element);
                }
            } else {
                let end = rest
                    .char_indices()
                    .skip(1)
                    .find(|(_, c)| *c == '<')
                    .map(|(idx, _)| idx)
                    .unwrap_or(rest.len());
                let node = doc.create_text(&unescape(&rest[..end]));
                doc.append_child(current, node);
                self.pos += end;
            }
        }
        Ok(())
    }

    fn parse_start_tag(
        &mut self,
        doc: &mut MemoryDocument,
    ) -> Result<(NodeId, bool, String), PlatformError> {
        // Skip '<'
        self.pos += 1;
        let name_len = self
            .rest()
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .ok_or_else(|| PlatformError::from("unterminated start tag"))?;
        let tag = self.rest()[..name_len].to_ascii_lowercase();
        self.pos += name_len;
        let element = doc.create_element(&tag);

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return Err("unterminated start tag".into());
            }
            if let Some(after) = rest.strip_prefix("/>") {
                self.pos = self.input.len() - after.len();
                return Ok((element, true, tag));
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return Ok((element, false, tag));
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }

            let name_len = rest
                .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
                .unwrap_or(rest.len());
            let name = rest[..name_len].to_string();
            self.pos += name_len;
            self.skip_whitespace();

            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.parse_attribute_value()?
            } else {
                String::new()
            };
            doc.set_attribute(&element, &name, &value)?;
        }
    }

    fn parse_attribute_value(&mut self) -> Result<String, PlatformError> {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let end = rest[1..]
                    .find(quote)
                    .ok_or_else(|| PlatformError::from("unterminated attribute value"))?;
                let value = unescape(&rest[1..1 + end]);
                self.pos += end + 2;
                Ok(value)
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                self.pos += end;
                Ok(unescape(&rest[..end]))
            }
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }
}
