//! Annotator configuration.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::{AnnotateError, Result};

/// Color used when the palette is empty.
pub const FALLBACK_COLOR: &str = "yellow";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnnotateConfig {
    /// Highlight palette, addressed by index from the color picker.
    pub colors: Vec<SmolStr>,
    /// Background for highlights whose record has no color yet.
    pub fallback_color: SmolStr,
    /// Class marking highlight elements.
    pub highlight_class: SmolStr,
    /// Attribute linking a highlight element to its record id.
    pub id_attribute: SmolStr,
    /// Tag of the highlight wrapper element.
    pub highlight_tag: SmolStr,
    /// Prefix of storage keys. Empty means the whole store belongs to us.
    pub storage_prefix: SmolStr,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            colors: ["#FFADAD", "#FFD6A5", "#FDFFB6", "#CAFFBF", "#A0C4FF", "#BDB2FF"]
                .into_iter()
                .map(SmolStr::new_static)
                .collect(),
            fallback_color: SmolStr::new_static(FALLBACK_COLOR),
            highlight_class: SmolStr::new_static("__annotate-highlight__"),
            id_attribute: SmolStr::new_static("annotate-id"),
            highlight_tag: SmolStr::new_static("span"),
            storage_prefix: SmolStr::new_static("annotate:"),
        }
    }
}

impl AnnotateConfig {
    /// Load a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AnnotateError::Config(e.to_string()))
    }

    /// Palette color at `index`, falling back to the first palette entry and
    /// then to [`FALLBACK_COLOR`].
    pub fn color(&self, index: usize) -> SmolStr {
        self.colors
            .get(index)
            .or_else(|| self.colors.first())
            .cloned()
            .unwrap_or_else(|| self.fallback_color.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_fallbacks() {
        let config = AnnotateConfig::default();
        assert_eq!(config.color(3), "#CAFFBF");
        assert_eq!(config.color(42), "#FFADAD");

        let empty = AnnotateConfig {
            colors: vec![],
            ..Default::default()
        };
        assert_eq!(empty.color(0), FALLBACK_COLOR);
    }

    #[test]
    fn test_partial_json() {
        let config = AnnotateConfig::from_json(r##"{"colors":["#000000"],"storagePrefix":""}"##).unwrap();
        assert_eq!(config.colors, vec![SmolStr::new("#000000")]);
        assert_eq!(config.storage_prefix, "");
        assert_eq!(config.highlight_class, "__annotate-highlight__");
        assert!(matches!(
            AnnotateConfig::from_json(r#"{"colors":3}"#),
            Err(AnnotateError::Config(_))
        ));
    }
}
