//! Occurrence counting and span re-location.
//!
//! Both capture and resolution walk the anchor element's descendant text
//! nodes in document order and scan each node for every position a match
//! starts at, so overlapping repeats ("very very" in "very very very") each
//! get their own ordinal. Matches never cross a text node boundary. An
//! ordinal is the zero-based position of a match in that sequence.
//!
//! Capture counts the scan matches that start strictly before the
//! selection; resolution returns the scan match at that position. Because
//! both sides use the same scan, a capture followed by a resolution against
//! the same text always lands on the same match.

use crate::dom::{DocumentTree, NodeKind, TextRange};
use crate::error::{AnnotateError, Result};
use crate::pattern::Pattern;

/// Ordinal of the occurrence of `pattern` that starts at `anchor_offset`
/// inside the text node `anchor`.
///
/// Counts every match in text nodes of the anchor's parent element that
/// precede `anchor`, plus the matches inside `anchor` that start before
/// `anchor_offset`.
pub fn occurrence_index<D: DocumentTree>(
    doc: &D,
    anchor: &D::Node,
    anchor_offset: usize,
    pattern: &Pattern,
) -> Result<usize> {
    if doc.kind(anchor) != NodeKind::Text {
        return Err(AnnotateError::UnsupportedSelection(
            "selection does not start in a text node".into(),
        ));
    }
    let parent = doc.parent_element(anchor).ok_or_else(|| {
        AnnotateError::UnsupportedSelection("selected text has no parent element".into())
    })?;
    let matcher = pattern.compile()?;

    let mut ordinal = 0;
    for node in doc.descendant_text_nodes(&parent) {
        let text = doc.text(&node).unwrap_or_default();
        let matches = matcher.find_char_ranges(&text);
        if node != *anchor {
            ordinal += matches.len();
            continue;
        }

        let before = matches
            .iter()
            .take_while(|range| range.start < anchor_offset)
            .count();
        match matches.get(before) {
            Some(range) if range.start == anchor_offset => {}
            other => {
                tracing::warn!(
                    pattern = %pattern,
                    anchor_offset,
                    next_match = ?other,
                    "selection does not start on a match"
                );
                return Err(AnnotateError::UnsupportedSelection(format!(
                    "`{}` does not match at offset {}",
                    pattern, anchor_offset
                )));
            }
        }
        return Ok(ordinal + before);
    }

    Err(AnnotateError::UnsupportedSelection(
        "anchor is not a text node of its parent element".into(),
    ))
}

/// Find the `ordinal`-th match of `pattern` among the descendant text nodes
/// of `element`.
pub fn resolve_span<D: DocumentTree>(
    doc: &D,
    element: &D::Node,
    pattern: &Pattern,
    ordinal: usize,
) -> Result<TextRange<D::Node>> {
    let matcher = pattern.compile()?;
    let mut seen = 0;

    for node in doc.descendant_text_nodes(element) {
        let text = doc.text(&node).unwrap_or_default();
        let matches = matcher.find_char_ranges(&text);
        if let Some(range) = matches.get(ordinal - seen) {
            tracing::trace!(
                pattern = %pattern,
                ordinal,
                start = range.start,
                end = range.end,
                "resolved span"
            );
            return Ok(TextRange::new(node, range.start, range.end));
        }
        seen += matches.len();
    }

    Err(AnnotateError::SpanResolution {
        pattern: pattern.to_string(),
        ordinal,
    })
}

/// Split the range's text node so that exactly the range's text sits in a
/// node of its own, and return that node.
pub fn carve<D: DocumentTree>(doc: &mut D, range: &TextRange<D::Node>) -> Result<D::Node> {
    let len = doc.text(&range.node).map(|t| t.chars().count()).ok_or_else(|| {
        AnnotateError::UnsupportedSelection("range does not point into a text node".into())
    })?;
    if range.start >= range.end || range.end > len {
        return Err(AnnotateError::UnsupportedSelection(format!(
            "range {}..{} is invalid for text of length {}",
            range.start, range.end, len
        )));
    }

    if range.end < len {
        doc.split_text(&range.node, range.end)?;
    }
    if range.start > 0 {
        return Ok(doc.split_text(&range.node, range.start)?);
    }
    Ok(range.node.clone())
}

/// True if `range` still covers text that `pattern` matches exactly.
pub fn range_matches<D: DocumentTree>(doc: &D, range: &TextRange<D::Node>, pattern: &Pattern) -> bool {
    let Some(text) = doc.text(&range.node) else {
        return false;
    };
    let len = text.chars().count();
    if range.start >= range.end || range.end > len {
        return false;
    }
    let covered = crate::text::slice_chars(&text, range.start, range.end);
    pattern
        .compile()
        .is_ok_and(|m| m.find_char_ranges(covered).first() == Some(&(0..range.len())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;

    fn first_text(doc: &MemoryDocument, tag: &str) -> crate::dom::NodeId {
        let el = doc.elements_by_tag(tag)[0];
        doc.descendant_text_nodes(&el)[0]
    }

    #[test]
    fn test_quick_fox_scenario() {
        let mut doc =
            MemoryDocument::parse("<p>The quick fox jumps. The quick fox runs.</p>").unwrap();
        let text = first_text(&doc, "p");
        let pattern = Pattern::build("quick fox").unwrap();

        // "The quick fox jumps. The " is 25 chars
        let ordinal = occurrence_index(&doc, &text, 25, &pattern).unwrap();
        assert_eq!(ordinal, 1);

        let p = doc.elements_by_tag("p")[0];
        let range = resolve_span(&doc, &p, &pattern, ordinal).unwrap();
        assert_eq!(range, TextRange::new(text, 25, 34));

        let carved = carve(&mut doc, &range).unwrap();
        assert_eq!(doc.text(&carved).as_deref(), Some("quick fox"));
        let texts: Vec<_> = doc
            .child_nodes(&p)
            .iter()
            .filter_map(|n| doc.text(n))
            .collect();
        assert_eq!(texts, vec!["The quick fox jumps. The ", "quick fox", " runs."]);
    }

    #[test]
    fn test_first_occurrence_is_zero() {
        let doc = MemoryDocument::parse("<p>test one test two test</p>").unwrap();
        let text = first_text(&doc, "p");
        let pattern = Pattern::build("test").unwrap();
        assert_eq!(occurrence_index(&doc, &text, 0, &pattern).unwrap(), 0);
        assert_eq!(occurrence_index(&doc, &text, 9, &pattern).unwrap(), 1);
        assert_eq!(occurrence_index(&doc, &text, 18, &pattern).unwrap(), 2);
    }

    #[test]
    fn test_ordinal_round_trip_for_every_occurrence() {
        let doc = MemoryDocument::parse("<p>test a <b>test</b> b test <i>c test</i> test</p>")
            .unwrap();
        let p = doc.elements_by_tag("p")[0];
        let pattern = Pattern::build("test").unwrap();

        for node in doc.descendant_text_nodes(&p) {
            let text = doc.text(&node).unwrap();
            for (idx, _) in text.match_indices("test") {
                let offset = crate::text::byte_to_char(&text, idx);
                let ordinal = occurrence_index(&doc, &node, offset, &pattern).unwrap();
                let parent = doc.parent_element(&node).unwrap();
                let range = resolve_span(&doc, &parent, &pattern, ordinal).unwrap();
                assert_eq!(range, TextRange::new(node, offset, offset + 4));
            }
        }
    }

    #[test]
    fn test_overlapping_repeats_round_trip() {
        let doc = MemoryDocument::parse("<p>very very very good</p>").unwrap();
        let p = doc.elements_by_tag("p")[0];
        let text = first_text(&doc, "p");
        let pattern = Pattern::build("very very").unwrap();

        assert_eq!(occurrence_index(&doc, &text, 0, &pattern).unwrap(), 0);
        let ordinal = occurrence_index(&doc, &text, 5, &pattern).unwrap();
        assert_eq!(ordinal, 1);
        assert_eq!(
            resolve_span(&doc, &p, &pattern, ordinal).unwrap(),
            TextRange::new(text, 5, 14)
        );
    }

    #[test]
    fn test_leading_gap_inside_whitespace_run() {
        let doc = MemoryDocument::parse("<p>a   fox</p>").unwrap();
        let p = doc.elements_by_tag("p")[0];
        let text = first_text(&doc, "p");
        let pattern = Pattern::build(" fox").unwrap();

        let ordinal = occurrence_index(&doc, &text, 2, &pattern).unwrap();
        assert_eq!(
            resolve_span(&doc, &p, &pattern, ordinal).unwrap(),
            TextRange::new(text, 2, 7)
        );
    }

    #[test]
    fn test_selection_off_a_match_is_rejected() {
        let doc = MemoryDocument::parse("<p>alpha beta</p>").unwrap();
        let text = first_text(&doc, "p");
        let pattern = Pattern::build("beta").unwrap();
        assert!(matches!(
            occurrence_index(&doc, &text, 3, &pattern),
            Err(AnnotateError::UnsupportedSelection(_))
        ));
    }

    #[test]
    fn test_whitespace_in_markup_differs_from_selection() {
        let doc = MemoryDocument::parse("<p>Some text that\n      wraps here, and text that\n   wraps again</p>")
            .unwrap();
        let p = doc.elements_by_tag("p")[0];
        let text = first_text(&doc, "p");
        // Selection strings collapse the markup's line break to a space.
        let pattern = Pattern::build("text that wraps").unwrap();

        let second = doc.text(&text).unwrap().rfind("text that").unwrap();
        let ordinal = occurrence_index(&doc, &text, second, &pattern).unwrap();
        assert_eq!(ordinal, 1);
        let range = resolve_span(&doc, &p, &pattern, ordinal).unwrap();
        assert_eq!(range.start, second);
        assert_eq!(range.len(), "text that\n   wraps".len());
    }

    #[test]
    fn test_resolution_after_previous_split() {
        let mut doc = MemoryDocument::parse("<p>fox fox fox</p>").unwrap();
        let p = doc.elements_by_tag("p")[0];
        let pattern = Pattern::build("fox").unwrap();

        // Highlight the first fox, as an earlier annotation would have.
        let first = resolve_span(&doc, &p, &pattern, 0).unwrap();
        let carved = carve(&mut doc, &first).unwrap();
        doc.wrap(&carved, "span").unwrap();

        let third = resolve_span(&doc, &p, &pattern, 2).unwrap();
        assert_eq!(doc.text(&third.node).as_deref(), Some(" fox fox"));
        assert_eq!((third.start, third.end), (5, 8));
    }

    #[test]
    fn test_missing_occurrence() {
        let doc = MemoryDocument::parse("<p>only once</p>").unwrap();
        let p = doc.elements_by_tag("p")[0];
        let pattern = Pattern::build("once").unwrap();
        assert!(resolve_span(&doc, &p, &pattern, 0).is_ok());
        assert!(matches!(
            resolve_span(&doc, &p, &pattern, 1),
            Err(AnnotateError::SpanResolution { ordinal: 1, .. })
        ));
    }

    #[test]
    fn test_element_anchor_rejected() {
        let doc = MemoryDocument::parse("<p>text</p>").unwrap();
        let p = doc.elements_by_tag("p")[0];
        let pattern = Pattern::build("text").unwrap();
        assert!(matches!(
            occurrence_index(&doc, &p, 0, &pattern),
            Err(AnnotateError::UnsupportedSelection(_))
        ));
    }

    #[test]
    fn test_carve_whole_node_does_not_split() {
        let mut doc = MemoryDocument::parse("<p>whole</p>").unwrap();
        let p = doc.elements_by_tag("p")[0];
        let text = first_text(&doc, "p");
        let carved = carve(&mut doc, &TextRange::new(text, 0, 5)).unwrap();
        assert_eq!(carved, text);
        assert_eq!(doc.child_nodes(&p).len(), 1);
        assert!(carve(&mut doc, &TextRange::new(text, 2, 9)).is_err());
    }

    #[test]
    fn test_range_matches() {
        let doc = MemoryDocument::parse("<p>a quick\nfox</p>").unwrap();
        let text = first_text(&doc, "p");
        let pattern = Pattern::build("quick fox").unwrap();
        assert!(range_matches(&doc, &TextRange::new(text, 2, 11), &pattern));
        assert!(!range_matches(&doc, &TextRange::new(text, 1, 11), &pattern));
        assert!(!range_matches(&doc, &TextRange::new(text, 2, 12), &pattern));
    }
}
