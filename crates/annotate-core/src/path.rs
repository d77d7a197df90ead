//! Structural element paths.
//!
//! A path addresses an element by the tags on the way down from the root
//! element and, at each level, by how many same-tag siblings precede it.
//! Paths need no ids in the page and survive a reload as long as the
//! element structure above the target is unchanged.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::dom::{DocumentTree, NodeKind};
use crate::error::{AnnotateError, Result};

/// One step of a path: a lowercase tag name and the number of preceding
/// siblings that share it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(SmolStr, usize)", into = "(SmolStr, usize)")]
pub struct PathStep {
    pub tag: SmolStr,
    pub index: usize,
}

impl PathStep {
    pub fn new(tag: impl Into<SmolStr>, index: usize) -> Self {
        Self {
            tag: tag.into(),
            index,
        }
    }
}

impl From<(SmolStr, usize)> for PathStep {
    fn from((tag, index): (SmolStr, usize)) -> Self {
        Self { tag, index }
    }
}

impl From<PathStep> for (SmolStr, usize) {
    fn from(step: PathStep) -> Self {
        (step.tag, step.index)
    }
}

/// Root-to-element sequence of steps. The root element itself is not a step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(pub Vec<PathStep>);

impl NodePath {
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(empty)");
        }
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " > ")?;
            }
            write!(f, "{}[{}]", step.tag, step.index)?;
        }
        Ok(())
    }
}

impl FromIterator<PathStep> for NodePath {
    fn from_iter<I: IntoIterator<Item = PathStep>>(iter: I) -> Self {
        NodePath(iter.into_iter().collect())
    }
}

/// Compute the path from the root element down to `element`.
///
/// Callers pass an element; for a text anchor use its parent element.
pub fn path_to<D: DocumentTree>(doc: &D, element: &D::Node) -> NodePath {
    let mut steps = Vec::new();
    let mut current = element.clone();

    while let Some(parent) = doc.parent_element(&current) {
        let tag = doc.tag_name(&current).unwrap_or_default();
        let index = doc
            .child_elements(&parent)
            .into_iter()
            .take_while(|sibling| *sibling != current)
            .filter(|sibling| doc.tag_name(sibling).as_deref() == Some(tag.as_str()))
            .count();
        steps.push(PathStep::new(tag, index));
        current = parent;
    }

    steps.reverse();
    NodePath(steps)
}

/// Resolve a path back to an element.
///
/// Each step picks the `index`-th child element with the step's tag, the
/// same way `path_to` counted it. Fails on an empty path or when any step
/// runs out of matching children.
pub fn resolve_path<D: DocumentTree>(doc: &D, path: &NodePath) -> Result<D::Node> {
    let not_found = || AnnotateError::ElementResolution { path: path.clone() };
    if path.is_empty() {
        return Err(not_found());
    }

    let mut current = doc.root_element().ok_or_else(not_found)?;
    for step in path.steps() {
        let tag = step.tag.to_ascii_lowercase();
        current = doc
            .child_elements(&current)
            .into_iter()
            .filter(|child| doc.tag_name(child).as_deref() == Some(tag.as_str()))
            .nth(step.index)
            .ok_or_else(not_found)?;
    }

    debug_assert_eq!(doc.kind(&current), NodeKind::Element);
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;

    const PAGE: &str = "<div><p>intro</p><div><p>nested</p><p>second nested</p></div></div>\
        <ol><li>a</li><li>b<ol><li>inner</li></ol></li></ol>\
        <div><span>x</span><p>last</p></div>";

    #[test]
    fn test_path_to_counts_same_tag_siblings() {
        let doc = MemoryDocument::parse(PAGE).unwrap();
        let p = doc.elements_by_tag("p")[2];
        assert_eq!(doc.text_content(&p), "second nested");

        let path = path_to(&doc, &p);
        assert_eq!(
            path,
            NodePath(vec![
                PathStep::new("body", 0),
                PathStep::new("div", 0),
                PathStep::new("div", 0),
                PathStep::new("p", 1),
            ])
        );
        assert_eq!(path.to_string(), "body[0] > div[0] > div[0] > p[1]");
    }

    #[test]
    fn test_path_round_trip_for_every_element() {
        let doc = MemoryDocument::parse(PAGE).unwrap();
        let root = doc.root_element().unwrap();
        for element in doc.descendant_elements(&root) {
            let path = path_to(&doc, &element);
            assert_eq!(resolve_path(&doc, &path).unwrap(), element, "path {}", path);
        }
    }

    #[test]
    fn test_nested_same_tag_round_trip() {
        // The second top-level div comes after a nested div in document order.
        let doc = MemoryDocument::parse(PAGE).unwrap();
        let last = doc.elements_by_tag("p")[3];
        let path = path_to(&doc, &last);
        assert_eq!(path.steps()[1], PathStep::new("div", 1));
        assert_eq!(resolve_path(&doc, &path).unwrap(), last);
    }

    #[test]
    fn test_root_element_has_empty_path() {
        let doc = MemoryDocument::parse(PAGE).unwrap();
        let root = doc.root_element().unwrap();
        let path = path_to(&doc, &root);
        assert!(path.is_empty());
        assert!(matches!(
            resolve_path(&doc, &path),
            Err(AnnotateError::ElementResolution { .. })
        ));
    }

    #[test]
    fn test_resolve_out_of_range() {
        let doc = MemoryDocument::parse(PAGE).unwrap();
        let path = NodePath(vec![PathStep::new("body", 0), PathStep::new("ol", 3)]);
        assert!(matches!(
            resolve_path(&doc, &path),
            Err(AnnotateError::ElementResolution { .. })
        ));
    }

    #[test]
    fn test_path_serializes_as_pairs() {
        let path = NodePath(vec![PathStep::new("body", 0), PathStep::new("li", 4)]);
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#"[["body",0],["li",4]]"#);
        let back: NodePath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
