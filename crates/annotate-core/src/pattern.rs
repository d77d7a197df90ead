//! Whitespace-tolerant text patterns.
//!
//! The text a live selection reports and the text stored in the page often
//! disagree on whitespace: a line break plus indentation in the markup shows
//! up as a single space in the selection string. A `Pattern` keeps the
//! highlighted text literal except for whitespace runs, which match one or
//! more whitespace characters of any kind.
//!
//! Patterns are stored as a URL-encoded regex source, for example
//! `quick(%5Cs%2B)fox`, which is the format older records were written in.

use std::borrow::Cow;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AnnotateError, Result};
use crate::text::byte_to_char;

const GAP_SOURCE: &str = r"(\s+)";

/// A piece of a pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PatternToken {
    /// Text matched exactly. Never contains whitespace.
    Literal(String),
    /// One or more whitespace characters of any kind.
    WhitespaceGap,
}

/// Alternating literal and whitespace-gap tokens.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pattern {
    tokens: Vec<PatternToken>,
}

impl Pattern {
    /// Build a pattern from highlighted text.
    ///
    /// Every maximal whitespace run becomes a gap, including leading and
    /// trailing runs.
    pub fn build(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(AnnotateError::EmptyPattern);
        }
        let mut tokens = Vec::new();
        let mut literal = String::new();
        for c in text.chars() {
            if c.is_whitespace() {
                push_gap(&mut tokens, &mut literal);
            } else {
                literal.push(c);
            }
        }
        if !literal.is_empty() {
            tokens.push(PatternToken::Literal(literal));
        }
        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[PatternToken] {
        &self.tokens
    }

    /// Regex source for this pattern: literals escaped, gaps as `(\s+)`.
    pub fn source(&self) -> String {
        self.tokens
            .iter()
            .map(|token| match token {
                PatternToken::Literal(text) => Cow::Owned(regex::escape(text)),
                PatternToken::WhitespaceGap => Cow::Borrowed(GAP_SOURCE),
            })
            .collect()
    }

    /// Stable, URL-safe string form used for persistence.
    pub fn encode(&self) -> String {
        urlencoding::encode(&self.source()).into_owned()
    }

    /// Parse the output of [`Pattern::encode`].
    ///
    /// Also accepts sources whose literals were never escaped: any
    /// character that is not part of a gap or an escape is taken literally.
    pub fn decode(encoded: &str) -> Result<Self> {
        let source = urlencoding::decode(encoded).map_err(|e| AnnotateError::MalformedRecord {
            key: String::new(),
            reason: format!("pattern is not valid percent-encoding: {}", e),
        })?;
        Self::from_source(&source)
    }

    /// Parse a regex source produced by [`Pattern::source`].
    pub fn from_source(source: &str) -> Result<Self> {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(c) = rest.chars().next() {
            if let Some(after) = rest.strip_prefix(GAP_SOURCE) {
                push_gap(&mut tokens, &mut literal);
                rest = after;
                continue;
            }
            rest = &rest[c.len_utf8()..];
            match c {
                '\\' => {
                    let escaped = rest.chars().next().ok_or_else(|| {
                        AnnotateError::MalformedRecord {
                            key: String::new(),
                            reason: "pattern ends with a dangling escape".into(),
                        }
                    })?;
                    rest = &rest[escaped.len_utf8()..];
                    literal.push(escaped);
                }
                c if c.is_whitespace() => push_gap(&mut tokens, &mut literal),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            tokens.push(PatternToken::Literal(literal));
        }
        if tokens.is_empty() {
            return Err(AnnotateError::EmptyPattern);
        }
        Ok(Self { tokens })
    }

    /// Compile to a matcher.
    pub fn compile(&self) -> Result<Matcher> {
        let source: String = self
            .tokens
            .iter()
            .map(|token| match token {
                PatternToken::Literal(text) => Cow::Owned(regex::escape(text)),
                PatternToken::WhitespaceGap => Cow::Borrowed(r"\s+"),
            })
            .collect();
        let regex = Regex::new(&source).map_err(|e| AnnotateError::MalformedRecord {
            key: String::new(),
            reason: format!("pattern does not compile: {}", e),
        })?;
        Ok(Matcher { regex })
    }

    /// True if the pattern matches anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.compile().is_ok_and(|m| m.regex.is_match(text))
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for token in &self.tokens {
            match token {
                PatternToken::Literal(text) => write!(f, "{}", text)?,
                PatternToken::WhitespaceGap => write!(f, "␣")?,
            }
        }
        Ok(())
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Pattern::decode(&encoded).map_err(serde::de::Error::custom)
    }
}

fn push_gap(tokens: &mut Vec<PatternToken>, literal: &mut String) {
    if !literal.is_empty() {
        tokens.push(PatternToken::Literal(std::mem::take(literal)));
    }
    if tokens.last() != Some(&PatternToken::WhitespaceGap) {
        tokens.push(PatternToken::WhitespaceGap);
    }
}

/// A compiled pattern.
#[derive(Clone, Debug)]
pub struct Matcher {
    regex: Regex,
}

impl Matcher {
    /// Matches in `text`, as char ranges, one for every position a match
    /// starts at. Matches may overlap: after each match the search resumes
    /// one char past its start.
    pub fn find_char_ranges(&self, text: &str) -> Vec<std::ops::Range<usize>> {
        let mut ranges = Vec::new();
        let mut from = 0;
        while let Some(m) = self.regex.find_at(text, from) {
            ranges.push(byte_to_char(text, m.start())..byte_to_char(text, m.end()));
            let step = text[m.start()..].chars().next().map_or(1, char::len_utf8);
            from = m.start() + step;
            if from > text.len() {
                break;
            }
        }
        ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_tokens() {
        let pattern = Pattern::build("quick  brown\tfox").unwrap();
        assert_eq!(
            pattern.tokens(),
            &[
                PatternToken::Literal("quick".into()),
                PatternToken::WhitespaceGap,
                PatternToken::Literal("brown".into()),
                PatternToken::WhitespaceGap,
                PatternToken::Literal("fox".into()),
            ]
        );
        assert_eq!(pattern.to_string(), "quick␣brown␣fox");
    }

    #[test]
    fn test_whitespace_tolerance() {
        let pattern = Pattern::build("a b").unwrap();
        assert!(pattern.is_match("a\nb"));
        assert!(pattern.is_match("a   b"));
        assert!(pattern.is_match("a\u{a0}b"));
        assert!(!pattern.is_match("ab"));

        let tight = Pattern::build("ab").unwrap();
        assert!(!tight.is_match("a b"));
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let pattern = Pattern::build("annotate.js (v1)?").unwrap();
        assert!(pattern.is_match("use annotate.js (v1)? now"));
        assert!(!pattern.is_match("annotateXjs (v1)?"));
    }

    #[test]
    fn test_empty_text_rejected() {
        assert!(matches!(Pattern::build(""), Err(AnnotateError::EmptyPattern)));
    }

    #[test]
    fn test_leading_and_trailing_whitespace() {
        let pattern = Pattern::build(" fox ").unwrap();
        assert_eq!(
            pattern.tokens(),
            &[
                PatternToken::WhitespaceGap,
                PatternToken::Literal("fox".into()),
                PatternToken::WhitespaceGap,
            ]
        );
        assert!(!pattern.is_match("fox"));
        assert!(pattern.is_match("the fox\n"));
    }

    #[test]
    fn test_encoding_matches_stored_format() {
        let pattern = Pattern::build("persist across sessions").unwrap();
        insta::assert_snapshot!(pattern.encode(), @"persist%28%5Cs%2B%29across%28%5Cs%2B%29sessions");
        assert_eq!(Pattern::decode(&pattern.encode()).unwrap(), pattern);
    }

    #[test]
    fn test_decode_legacy_sources() {
        // Written by the original library: parentheses left unencoded,
        // metacharacters left unescaped.
        let pattern = Pattern::decode("annotate.js(%5Cs%2B)navigator").unwrap();
        assert_eq!(
            pattern.tokens(),
            &[
                PatternToken::Literal("annotate.js".into()),
                PatternToken::WhitespaceGap,
                PatternToken::Literal("navigator".into()),
            ]
        );
        let pattern = Pattern::decode("lacus%2C(%5Cs%2B)laoreet").unwrap();
        assert!(pattern.is_match("lacus,\n   laoreet"));
    }

    #[test]
    fn test_escaped_source_round_trip() {
        let pattern = Pattern::build("1+1 = 2 [sic] \\o/").unwrap();
        let decoded = Pattern::from_source(&pattern.source()).unwrap();
        assert_eq!(decoded, pattern);
    }

    #[test]
    fn test_decode_rejects_dangling_escape() {
        assert!(Pattern::from_source("abc\\").is_err());
        assert!(Pattern::decode("").is_err());
    }

    #[test]
    fn test_match_ranges_are_char_offsets() {
        let matcher = Pattern::build("wörld").unwrap().compile().unwrap();
        assert_eq!(matcher.find_char_ranges("héllo wörld, wörld"), vec![6..11, 13..18]);
    }

    #[test]
    fn test_match_ranges_overlap() {
        let matcher = Pattern::build("very very").unwrap().compile().unwrap();
        assert_eq!(matcher.find_char_ranges("very very very good"), vec![0..9, 5..14]);

        // A leading gap can start anywhere inside a whitespace run.
        let matcher = Pattern::build(" fox").unwrap().compile().unwrap();
        assert_eq!(matcher.find_char_ranges("a   fox"), vec![1..7, 2..7, 3..7]);
    }

    #[test]
    fn test_serde_uses_encoded_string() {
        let pattern = Pattern::build("a b").unwrap();
        let json = serde_json::to_string(&pattern).unwrap();
        assert_eq!(json, "\"a%28%5Cs%2B%29b\"");
        let back: Pattern = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pattern);
    }
}
