//! Annotation records: the unit of persistence and identity.

use rand::Rng;
use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};

use crate::dom::DocumentTree;
use crate::error::{AnnotateError, Result};
use crate::path::{NodePath, path_to};
use crate::pattern::Pattern;
use crate::span::occurrence_index;

/// Length of generated record ids, in hex characters.
pub const ID_LEN: usize = 12;

/// A persisted annotation.
///
/// `path`, `pattern` and `ordinal` form the anchor. They are computed once
/// at capture and never recomputed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    pub id: SmolStr,

    /// Path to the parent element of the highlighted text.
    pub path: NodePath,

    /// The literal selected text.
    #[serde(rename = "highlightedString", default)]
    pub raw_text: String,

    #[serde(rename = "encodedRegex")]
    pub pattern: Pattern,

    /// Zero-based occurrence of `pattern` inside the element at `path`.
    #[serde(rename = "pos")]
    pub ordinal: usize,

    #[serde(default)]
    pub highlight_color: Option<SmolStr>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl AnnotationRecord {
    /// Build a record for the text starting at `anchor_offset` in the text
    /// node `anchor`.
    pub fn capture<D: DocumentTree>(
        doc: &D,
        anchor: &D::Node,
        anchor_offset: usize,
        text: &str,
    ) -> Result<Self> {
        let parent = doc.parent_element(anchor).ok_or_else(|| {
            AnnotateError::UnsupportedSelection("selected text has no parent element".into())
        })?;
        let pattern = Pattern::build(text)?;
        let ordinal = occurrence_index(doc, anchor, anchor_offset, &pattern)?;

        Ok(Self {
            id: generate_id(),
            path: path_to(doc, &parent),
            raw_text: text.to_string(),
            pattern,
            ordinal,
            highlight_color: None,
            comment: None,
        })
    }

    /// Decode a stored value. `key` is the storage key, used for reporting.
    pub fn from_json(key: &str, json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AnnotateError::MalformedRecord {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| AnnotateError::Storage(e.to_string()))
    }
}

/// Generate a random record id of [`ID_LEN`] lowercase hex characters.
pub fn generate_id() -> SmolStr {
    let value: u64 = rand::rng().random();
    format_smolstr!("{:012x}", value & 0xffff_ffff_ffff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;
    use crate::path::PathStep;

    #[test]
    fn test_generate_id() {
        let a = generate_id();
        let b = generate_id();
        assert_eq!(a.len(), ID_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_capture() {
        let doc = MemoryDocument::parse("<div><p>x</p><p>one test two test</p></div>").unwrap();
        let p = doc.elements_by_tag("p")[1];
        let text = doc.descendant_text_nodes(&p)[0];

        let record = AnnotationRecord::capture(&doc, &text, 13, "test").unwrap();
        assert_eq!(
            record.path,
            NodePath(vec![
                PathStep::new("body", 0),
                PathStep::new("div", 0),
                PathStep::new("p", 1),
            ])
        );
        assert_eq!(record.ordinal, 1);
        assert_eq!(record.raw_text, "test");
        assert_eq!(record.highlight_color, None);
        assert_eq!(record.comment, None);
    }

    #[test]
    fn test_json_layout() {
        let record = AnnotationRecord {
            id: "24647cef93f2".into(),
            path: NodePath(vec![PathStep::new("body", 0), PathStep::new("p", 0)]),
            raw_text: "persist across".into(),
            pattern: Pattern::build("persist across").unwrap(),
            ordinal: 0,
            highlight_color: Some("#CAFFBF".into()),
            comment: Some("Wow!".into()),
        };
        insta::assert_snapshot!(
            record.to_json().unwrap(),
            @r###"{"id":"24647cef93f2","path":[["body",0],["p",0]],"highlightedString":"persist across","encodedRegex":"persist%28%5Cs%2B%29across","pos":0,"highlightColor":"#CAFFBF","comment":"Wow!"}"###
        );
        let back = AnnotationRecord::from_json("24647cef93f2", &record.to_json().unwrap()).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_decode_legacy_entry() {
        let json = r##"{"path":[["body",0],["ol",0],["ol",0],["li",4]],"comment":"For example this one","highlightedString":"an annotation","regex":{},"encodedRegex":"an(%5Cs%2B)annotation","pos":0,"highlightColor":"#FDFFB6","id":"825706e58622"}"##;
        let record = AnnotationRecord::from_json("825706e58622", json).unwrap();
        assert_eq!(record.id, "825706e58622");
        assert_eq!(record.path.len(), 4);
        assert_eq!(record.pattern, Pattern::build("an annotation").unwrap());
        assert_eq!(record.highlight_color.as_deref(), Some("#FDFFB6"));
        assert_eq!(record.comment.as_deref(), Some("For example this one"));
    }

    #[test]
    fn test_decode_without_optional_fields() {
        let json = r#"{"id":"abc","path":[["body",0]],"encodedRegex":"x","pos":2,"highlightColor":null}"#;
        let record = AnnotationRecord::from_json("abc", json).unwrap();
        assert_eq!(record.ordinal, 2);
        assert_eq!(record.highlight_color, None);
        assert_eq!(record.comment, None);
        assert_eq!(record.raw_text, "");
    }

    #[test]
    fn test_malformed_entry() {
        let err = AnnotationRecord::from_json("k1", "{not json").unwrap_err();
        assert!(matches!(err, AnnotateError::MalformedRecord { ref key, .. } if key == "k1"));

        let err = AnnotationRecord::from_json("k2", r#"{"id":"k2","path":[],"encodedRegex":"","pos":0}"#)
            .unwrap_err();
        assert!(err.is_per_record());
    }
}
