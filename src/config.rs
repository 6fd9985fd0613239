//! Tag configuration value objects and the fixed pipeline constants.
//!
//! A [`TagConfig`] is owned by the caller (the form/state layer) and treated
//! as an immutable value per render. Nothing here holds resources.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::icon::IconRecord;

/// Tag diameter in export/viewBox units.
pub const TAG_DIAMETER: f32 = 30.0;
/// Tag radius in export/viewBox units.
pub const TAG_RADIUS: f32 = TAG_DIAMETER / 2.0;

/// Both the SVG viewBox and the PNG raster target are square at this size.
pub const EXPORT_SIZE: u32 = 30;

/// Maximum number of characters in the short tag text.
pub const TEXT_MAX_LENGTH: usize = 3;
/// Maximum length of the free-form tag label.
pub const LABEL_MAX_LENGTH: usize = 100;

/// Smallest font size the fitter may return.
pub const FONT_SIZE_MIN: f32 = 9.0;
/// Preferred font size for a single character.
pub const FONT_SIZE_1_CHAR: f32 = 18.5;
/// Preferred font size for two characters.
pub const FONT_SIZE_2_CHAR: f32 = 16.5;
/// Preferred font size for three characters.
pub const FONT_SIZE_3_CHAR: f32 = 12.5;

/// WCAG AA minimum for normal text against its background.
pub const CONTRAST_THRESHOLD_TEXT: f64 = 4.5;
/// Minimum ratio of the tag circle against a white page background.
pub const CONTRAST_THRESHOLD_BG_WHITE: f64 = 2.0;

/// Max icon width as a fraction of the square canvas (helps wide icons).
pub const ICON_FIT_MAX_WIDTH_RATIO: f32 = 0.8;
/// Max icon height as a fraction of the square canvas.
pub const ICON_FIT_MAX_HEIGHT_RATIO: f32 = 0.72;

static TEXT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9.]{0,3}$").unwrap());

// ============================================================================
// TagConfig
// ============================================================================

/// Whether the tag shows short text or an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMode {
    Text,
    Icon,
}

impl fmt::Display for TagMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TagMode::Text => "text",
            TagMode::Icon => "icon",
        })
    }
}

/// One user-configured tag, as handed over by the form/state layer.
///
/// `background_color` is kept as the raw boundary string; composing a
/// document validates it and rejects malformed values with a typed error.
/// In [`TagMode::Text`] the `text` field is authoritative; in
/// [`TagMode::Icon`] either `icon_id` resolves against the catalog,
/// `uploaded_icon` pins itself as the selection, or nothing resolves and the
/// tag renders as a plain circle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagConfig {
    pub label: String,
    pub background_color: String,
    pub mode: TagMode,
    pub text: String,
    pub icon_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_icon: Option<IconRecord>,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            label: String::new(),
            background_color: "#6923F4".to_string(),
            mode: TagMode::Text,
            text: String::new(),
            icon_id: String::new(),
            uploaded_icon: None,
        }
    }
}

impl TagConfig {
    /// The label used for export file naming: the trimmed user label, falling
    /// back to the tag content itself.
    pub fn file_label(&self) -> &str {
        let label = self.label.trim();
        if !label.is_empty() {
            return label;
        }
        match self.mode {
            TagMode::Text => self.text.trim(),
            TagMode::Icon => self.icon_id.trim(),
        }
    }
}

/// Returns true if `text` already satisfies the tag text alphabet
/// (up to three characters from `A-Z`, `0-9`, `.`).
pub fn is_valid_tag_text(text: &str) -> bool {
    TEXT_PATTERN.is_match(text)
}

/// Cleans arbitrary input into the tag text alphabet: uppercases, drops
/// characters outside `A-Z0-9.`, and truncates to [`TEXT_MAX_LENGTH`].
pub fn sanitize_tag_text(input: &str) -> String {
    input
        .chars()
        .flat_map(char::to_uppercase)
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '.')
        .take(TEXT_MAX_LENGTH)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_pattern_accepts_short_uppercase() {
        assert!(is_valid_tag_text(""));
        assert!(is_valid_tag_text("A"));
        assert!(is_valid_tag_text("AB"));
        assert!(is_valid_tag_text("A.1"));
    }

    #[test]
    fn text_pattern_rejects_long_or_lowercase() {
        assert!(!is_valid_tag_text("ABCD"));
        assert!(!is_valid_tag_text("ab"));
        assert!(!is_valid_tag_text("A B"));
    }

    #[test]
    fn sanitize_uppercases_strips_and_truncates() {
        assert_eq!(sanitize_tag_text("abc"), "ABC");
        assert_eq!(sanitize_tag_text("a b!c d"), "ABC");
        assert_eq!(sanitize_tag_text("v1.2.3"), "V1.");
        assert_eq!(sanitize_tag_text("漢字"), "");
    }

    #[test]
    fn file_label_falls_back_to_content() {
        let mut config = TagConfig {
            text: "AB".into(),
            ..TagConfig::default()
        };
        assert_eq!(config.file_label(), "AB");

        config.label = "  My Tag  ".into();
        assert_eq!(config.file_label(), "My Tag");

        config.label.clear();
        config.mode = TagMode::Icon;
        config.icon_id = "star".into();
        assert_eq!(config.file_label(), "star");
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = TagConfig {
            label: "Demo".into(),
            background_color: "#FF5733".into(),
            mode: TagMode::Icon,
            icon_id: "star".into(),
            ..TagConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"backgroundColor\""));
        assert!(json.contains("\"icon\""));
        let back: TagConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.icon_id, "star");
    }
}
