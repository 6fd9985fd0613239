//! Deterministic export file naming.

use crate::color::HexColor;
use crate::config::TagMode;

/// Converts a label into a filename-safe slug: lowercased, with every run of
/// non-alphanumeric characters collapsed to a single hyphen and leading or
/// trailing hyphens trimmed. Empty input falls back to `untitled`.
pub fn to_slug(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_hyphen = false;
    for c in label.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

/// Builds the standardized export file name:
/// `custom-tag_<slug>_<text|icon>_<hexNoHash>.<ext>`.
pub fn build_file_name(label: &str, mode: TagMode, background: HexColor, ext: &str) -> String {
    format!(
        "custom-tag_{}_{}_{}.{}",
        to_slug(label),
        mode,
        background.hex_lower(),
        ext
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_lowercases_and_hyphenates() {
        assert_eq!(to_slug("Hello World"), "hello-world");
        assert_eq!(to_slug("Test@#$Tag!"), "test-tag");
        assert_eq!(to_slug("Tag 123"), "tag-123");
        assert_eq!(to_slug("X"), "x");
    }

    #[test]
    fn slug_collapses_runs_and_trims() {
        assert_eq!(to_slug("a---b"), "a-b");
        assert_eq!(to_slug("foo   bar"), "foo-bar");
        assert_eq!(to_slug("--hello--"), "hello");
        assert_eq!(to_slug("!!!test!!!"), "test");
    }

    #[test]
    fn slug_falls_back_to_untitled() {
        assert_eq!(to_slug(""), "untitled");
        assert_eq!(to_slug("---"), "untitled");
        assert_eq!(to_slug("!@#$%"), "untitled");
    }

    #[test]
    fn file_name_format() {
        let bg: HexColor = "#FF5733".parse().unwrap();
        assert_eq!(
            build_file_name("My Tag", TagMode::Text, bg, "svg"),
            "custom-tag_my-tag_text_ff5733.svg"
        );

        let bg: HexColor = "#00AAFF".parse().unwrap();
        assert_eq!(
            build_file_name("Star Label", TagMode::Icon, bg, "png"),
            "custom-tag_star-label_icon_00aaff.png"
        );
    }

    #[test]
    fn file_name_lowercases_hex_and_defaults_label() {
        let bg: HexColor = "#ABCDEF".parse().unwrap();
        assert_eq!(
            build_file_name("T", TagMode::Text, bg, "svg"),
            "custom-tag_t_text_abcdef.svg"
        );
        let bg: HexColor = "#000000".parse().unwrap();
        assert_eq!(
            build_file_name("", TagMode::Text, bg, "svg"),
            "custom-tag_untitled_text_000000.svg"
        );
    }
}
