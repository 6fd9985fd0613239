//! Vector document assembly.
//!
//! One composed string serves three consumers: the live preview, the
//! exported `.svg`, and the rasterizer. The circle background is
//! unconditional; content and font embedding vary with the configuration
//! and with which enhancement tiers succeeded upstream.

use thiserror::Error;

use crate::color::{ColorParseError, HexColor};
use crate::config::{EXPORT_SIZE, TAG_DIAMETER, TAG_RADIUS, TagConfig, TagMode};
use crate::font::{FontConfig, FontEmbed};
use crate::icon::normalize::{IconNormalizer, resolve_icon};
use crate::icon::{IconCatalog, IconError};
use crate::text::outline::OutlinedGlyphPath;
use crate::text::{TextMeasurer, fit_font_size};

/// Fatal composition failures. Enhancement-tier absences (no font embed, no
/// outlined glyph, no measured bounds) are represented by the optional
/// inputs instead and never error.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("invalid tag background color")]
    Color(#[from] ColorParseError),

    #[error("icon could not be prepared for composition")]
    Icon(#[from] IconError),
}

/// Escapes a value for an XML text node.
pub(crate) fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escapes a value for a double-quoted XML attribute.
pub(crate) fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;").replace('\'', "&apos;")
}

/// Formats a coordinate with up to 3 decimal places, trailing zeros trimmed.
pub(crate) fn fmt_coord(value: f32) -> String {
    let mut s = format!("{value:.3}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    if s == "-0" { "0".to_string() } else { s }
}

// ============================================================================
// TagRenderer
// ============================================================================

/// Composes tag documents from configurations.
///
/// Owns the icon catalog, the icon normalizer (with its bounds cache), the
/// text-measurement capability, and the typeface description. One renderer
/// serves both the live preview and exports.
pub struct TagRenderer {
    catalog: IconCatalog,
    normalizer: IconNormalizer,
    measurer: Box<dyn TextMeasurer>,
    font: FontConfig,
}

impl TagRenderer {
    pub fn new(
        catalog: IconCatalog,
        normalizer: IconNormalizer,
        measurer: Box<dyn TextMeasurer>,
        font: FontConfig,
    ) -> Self {
        Self {
            catalog,
            normalizer,
            measurer,
            font,
        }
    }

    /// Renderer with precise bounds measurement, heuristic text measurement,
    /// and the default typeface.
    pub fn with_defaults(catalog: IconCatalog) -> Self {
        Self::new(
            catalog,
            IconNormalizer::precise(),
            Box::new(crate::text::HeuristicMeasurer),
            FontConfig::default(),
        )
    }

    pub fn catalog(&self) -> &IconCatalog {
        &self.catalog
    }

    /// Fits the tag text with this renderer's measurement capability.
    pub fn fit_text_size(&self, text: &str) -> f32 {
        fit_font_size(text, self.measurer.as_ref())
    }

    /// Assembles the complete vector document for one configuration.
    ///
    /// Emits, in order: the square root element, the optional `@font-face`
    /// declaration, the unconditional background circle, and the content
    /// element (outlined path XOR text run in text mode, transform group in
    /// icon mode, nothing in the empty state).
    pub fn compose_document(
        &mut self,
        config: &TagConfig,
        foreground: HexColor,
        font_embed: Option<&FontEmbed>,
        outlined: Option<&OutlinedGlyphPath>,
    ) -> Result<String, ComposeError> {
        let background: HexColor = config.background_color.parse()?;
        let size = EXPORT_SIZE;
        let r = TAG_RADIUS;

        let mut doc = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"#
        );

        if let Some(embed) = font_embed {
            doc.push_str(&format!(
                "<defs><style>@font-face{{font-family:\"{family}\";src:url(\"data:{mime};base64,{data}\") format(\"{format}\");font-weight:{weight};}}</style></defs>",
                family = self.font.family,
                mime = embed.mime,
                data = embed.base64,
                format = embed.format.css_format(),
                weight = self.font.weight,
            ));
        }

        doc.push_str(&format!(
            r#"<circle cx="{r}" cy="{r}" r="{r}" fill="{}"/>"#,
            background.canonical()
        ));

        match config.mode {
            TagMode::Text => {
                if let Some(glyph) = outlined {
                    doc.push_str(&format!(
                        r#"<path d="{}" transform="translate({},{})" fill="{}"/>"#,
                        glyph.path_data,
                        fmt_coord(glyph.translate_x),
                        fmt_coord(glyph.translate_y),
                        foreground.canonical(),
                    ));
                } else if !config.text.trim().is_empty() {
                    let font_size = self.fit_text_size(&config.text);
                    doc.push_str(&format!(
                        r#"<text x="{r}" y="{r}" text-anchor="middle" dominant-baseline="central" font-family='{stack}' font-weight="{weight}" font-size="{font_size}" fill="{fill}">{content}</text>"#,
                        stack = self.font.fallback_stack,
                        weight = self.font.weight,
                        fill = foreground.canonical(),
                        content = escape_text(&config.text),
                    ));
                }
            }
            TagMode::Icon => {
                if let Some(record) = resolve_icon(config, &self.catalog) {
                    let record = record.clone();
                    let icon = self.normalizer.normalize(&record, foreground, TAG_DIAMETER)?;
                    let mut attrs = String::new();
                    for (name, value) in &icon.root_attributes {
                        attrs.push_str(&format!(r#" {name}="{}""#, escape_attr(value)));
                    }
                    doc.push_str(&format!(
                        r#"<g transform="translate({},{}) scale({})"{attrs}>{}</g>"#,
                        fmt_coord(icon.translate_x),
                        fmt_coord(icon.translate_y),
                        fmt_coord(icon.scale),
                        icon.markup,
                    ));
                }
            }
        }

        doc.push_str("</svg>");
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::IconRecord;

    fn renderer_with(records: Vec<IconRecord>) -> TagRenderer {
        TagRenderer::with_defaults(IconCatalog::from_records(records))
    }

    fn text_config(text: &str, background: &str) -> TagConfig {
        TagConfig {
            background_color: background.to_string(),
            text: text.to_string(),
            ..TagConfig::default()
        }
    }

    fn white_square_icon() -> IconRecord {
        IconRecord {
            id: "square".to_string(),
            label: "Square".to_string(),
            svg_content: r##"<svg viewBox="0 0 24 24" fill="none"><rect width="24" height="24" fill="#fff"/></svg>"##
                .to_string(),
            view_box: "0 0 24 24".to_string(),
        }
    }

    #[test]
    fn document_root_and_circle_are_always_present() {
        let mut renderer = renderer_with(vec![]);
        let config = TagConfig {
            mode: TagMode::Icon,
            ..TagConfig::default()
        };
        let doc = renderer
            .compose_document(&config, HexColor::WHITE, None, None)
            .unwrap();
        assert!(doc.starts_with(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="30" height="30" viewBox="0 0 30 30">"#
        ));
        assert!(doc.contains(r##"<circle cx="15" cy="15" r="15" fill="#6923F4"/>"##));
        assert!(!doc.contains("<g"));
        assert!(!doc.contains("<text"));
        assert!(doc.ends_with("</svg>"));
    }

    #[test]
    fn circle_fill_is_canonical_uppercase() {
        let mut renderer = renderer_with(vec![]);
        let doc = renderer
            .compose_document(&text_config("", "ff5733"), HexColor::BLACK, None, None)
            .unwrap();
        assert!(doc.contains(r##"fill="#FF5733""##));
    }

    #[test]
    fn malformed_background_is_a_typed_failure() {
        let mut renderer = renderer_with(vec![]);
        let result =
            renderer.compose_document(&text_config("AB", "#12345"), HexColor::BLACK, None, None);
        assert!(matches!(result, Err(ComposeError::Color(_))));
    }

    #[test]
    fn text_run_carries_fitted_size_and_foreground() {
        let mut renderer = renderer_with(vec![]);
        let doc = renderer
            .compose_document(&text_config("AB", "#FFFFFF"), HexColor::BLACK, None, None)
            .unwrap();
        assert!(doc.contains("<text x=\"15\" y=\"15\""));
        assert!(doc.contains(r#"text-anchor="middle" dominant-baseline="central""#));
        assert!(doc.contains(r#"font-size="16.5""#));
        assert!(doc.contains(r##"fill="#000000">AB</text>"##));
    }

    #[test]
    fn text_content_is_xml_escaped() {
        let mut renderer = renderer_with(vec![]);
        let doc = renderer
            .compose_document(&text_config("<&>", "#FFFFFF"), HexColor::BLACK, None, None)
            .unwrap();
        assert!(doc.contains(">&lt;&amp;&gt;</text>"));
    }

    #[test]
    fn outlined_glyph_replaces_the_text_run() {
        let mut renderer = renderer_with(vec![]);
        let glyph = OutlinedGlyphPath {
            path_data: "M 0 0 L 5 0 L 5 5 Z".to_string(),
            translate_x: 12.345678,
            translate_y: 15.0,
        };
        let doc = renderer
            .compose_document(
                &text_config("AB", "#FFFFFF"),
                HexColor::BLACK,
                None,
                Some(&glyph),
            )
            .unwrap();
        assert!(doc.contains(r#"<path d="M 0 0 L 5 0 L 5 5 Z" transform="translate(12.346,15)""#));
        assert!(!doc.contains("<text"));
    }

    #[test]
    fn font_embed_emits_font_face_before_the_circle() {
        let mut renderer = renderer_with(vec![]);
        let embed = FontEmbed {
            base64: "AAEC".to_string(),
            mime: "font/woff2".to_string(),
            format: crate::font::FontFormat::Woff2,
        };
        let doc = renderer
            .compose_document(&text_config("AB", "#FFFFFF"), HexColor::BLACK, Some(&embed), None)
            .unwrap();
        let face_at = doc.find("@font-face").unwrap();
        let circle_at = doc.find("<circle").unwrap();
        assert!(face_at < circle_at);
        assert!(doc.contains(r#"url("data:font/woff2;base64,AAEC") format("woff2")"#));
        assert!(doc.contains("font-weight:800"));
    }

    #[test]
    fn resolved_icon_is_wrapped_in_a_transform_group() {
        let mut renderer = renderer_with(vec![white_square_icon()]);
        let config = TagConfig {
            mode: TagMode::Icon,
            icon_id: "square".to_string(),
            background_color: "#FFFFFF".to_string(),
            ..TagConfig::default()
        };
        let doc = renderer
            .compose_document(&config, HexColor::BLACK, None, None)
            .unwrap();
        assert!(doc.contains("<g transform=\"translate("));
        assert!(doc.contains("scale(0.9)"));
        // The root fill="none" survives on the group; the white rect fill is
        // repainted to the foreground.
        assert!(doc.contains(r#" fill="none""#));
        assert!(doc.contains(r##"<rect width="24" height="24" fill="#000000"/>"##));
    }

    #[test]
    fn unresolved_icon_id_yields_circle_only() {
        let mut renderer = renderer_with(vec![white_square_icon()]);
        let config = TagConfig {
            mode: TagMode::Icon,
            icon_id: "missing".to_string(),
            ..TagConfig::default()
        };
        let doc = renderer
            .compose_document(&config, HexColor::BLACK, None, None)
            .unwrap();
        assert!(!doc.contains("<g"));
        assert!(doc.contains("<circle"));
    }

    #[test]
    fn coordinates_format_compactly() {
        assert_eq!(fmt_coord(15.0), "15");
        assert_eq!(fmt_coord(4.2), "4.2");
        assert_eq!(fmt_coord(1.23456), "1.235");
        assert_eq!(fmt_coord(-0.0001), "0");
    }
}
