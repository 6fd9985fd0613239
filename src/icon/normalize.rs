//! Icon normalization: wrapper stripping, repainting, and placement.
//!
//! An icon enters as raw markup with a declared view box and leaves as inner
//! drawable content plus a uniform scale and a translation that centers its
//! visual content in the tag. Centering prefers real ink bounds when the
//! measurement capability supports them and falls back to the declared view
//! box otherwise; a small tunable offset table nudges specific icons that
//! stay optically off-center either way.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use resvg::usvg;
use serde::{Deserialize, Serialize};

use super::{IconCatalog, IconError, IconRecord, ViewBox};
use crate::color::HexColor;
use crate::config::{ICON_FIT_MAX_HEIGHT_RATIO, ICON_FIT_MAX_WIDTH_RATIO, TagConfig};

/// Presentation attributes lifted from the original root element onto the
/// replacement group, so inherited semantics like `fill="none"` survive the
/// wrapper strip.
const INHERITABLE_ATTRS: [&str; 11] = [
    "fill",
    "stroke",
    "stroke-width",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-dasharray",
    "stroke-dashoffset",
    "fill-opacity",
    "stroke-opacity",
    "opacity",
];

static SVG_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<svg[^>]*>").unwrap());
static SVG_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)</svg>\s*$").unwrap());
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});
static PAINT_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(fill|stroke)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});
static PAINT_STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\b(fill|stroke)\s*:\s*([^;"'}]+)"#).unwrap());
static NEAR_WHITE_RGB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^rgba?\(\s*255\s*,\s*255\s*,\s*255\s*(?:,\s*(?:1|1\.0|100%)\s*)?\)$").unwrap()
});

// ============================================================================
// Resolution
// ============================================================================

/// Resolves which icon record applies to a configuration.
///
/// An uploaded icon pins itself as the active selection once its id is the
/// selected one; otherwise the catalog is consulted. `None` is the valid
/// empty state.
pub fn resolve_icon<'a>(config: &'a TagConfig, catalog: &'a IconCatalog) -> Option<&'a IconRecord> {
    if let Some(uploaded) = &config.uploaded_icon {
        if uploaded.id == config.icon_id {
            return Some(uploaded);
        }
    }
    catalog.find(&config.icon_id)
}

// ============================================================================
// Repainting
// ============================================================================

/// Paint values that are intentionally non-solid and must never be rewritten.
fn is_preserved_paint(value: &str) -> bool {
    matches!(
        value,
        "" | "none" | "inherit" | "currentcolor" | "context-fill" | "context-stroke"
    ) || value.starts_with("url(")
        || value.starts_with("var(")
}

/// Literal near-white forms that count as repaintable neutral paint.
fn is_near_white(value: &str) -> bool {
    matches!(value, "white" | "#fff" | "#ffffff") || NEAR_WHITE_RGB_RE.is_match(value)
}

fn should_repaint(value: &str) -> bool {
    let v = value.trim().to_ascii_lowercase();
    !is_preserved_paint(&v) && is_near_white(&v)
}

/// Rewrites near-white `fill`/`stroke` attributes and style declarations to
/// the foreground color. All other paint survives untouched.
pub(crate) fn repaint_markup(markup: &str, foreground: HexColor) -> String {
    let fg = foreground.canonical();
    let pass1 = PAINT_ATTR_RE.replace_all(markup, |caps: &Captures<'_>| {
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        if should_repaint(value) {
            format!(r#"{}="{}""#, &caps[1], fg)
        } else {
            caps[0].to_string()
        }
    });
    PAINT_STYLE_RE
        .replace_all(&pass1, |caps: &Captures<'_>| {
            if should_repaint(&caps[2]) {
                format!("{}:{}", &caps[1], fg)
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

// ============================================================================
// Wrapper handling
// ============================================================================

/// Strips the outer `<svg>` wrapper, keeping only drawable inner content.
pub(crate) fn extract_svg_inner(raw: &str) -> String {
    let opened = SVG_OPEN_RE.replacen(raw, 1, "");
    let closed = SVG_CLOSE_RE.replace(&opened, "");
    closed.trim().to_string()
}

/// Pulls the allow-listed inheritable presentation attributes off the
/// original root element, repainting their values like any other paint.
pub(crate) fn extract_root_attributes(raw: &str, foreground: HexColor) -> Vec<(String, String)> {
    let Some(open_tag) = SVG_OPEN_RE.find(raw) else {
        return Vec::new();
    };
    let mut attrs = Vec::new();
    for caps in ATTR_RE.captures_iter(open_tag.as_str()) {
        let name = caps[1].to_ascii_lowercase();
        if !INHERITABLE_ATTRS.contains(&name.as_str()) {
            continue;
        }
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        let value = if should_repaint(value) {
            foreground.canonical()
        } else {
            value.to_string()
        };
        attrs.push((name, value));
    }
    attrs
}

// ============================================================================
// Bounds measurement capability
// ============================================================================

/// The minimal axis-aligned rectangle enclosing actual drawn geometry, in
/// the icon's own coordinate units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Measures the ink bounds of icon content, when the environment can.
///
/// Two implementations exist: [`UsvgBoundsMeasurer`] computes real geometry
/// through a parsed scene graph, [`NullBoundsMeasurer`] reports measurement
/// as unavailable so placement falls back to the declared view box. The
/// choice is made once at construction, not per call.
pub trait ContentBoundsMeasurer: Send + Sync {
    fn measure(&self, inner_markup: &str) -> Option<ContentBounds>;
}

/// Precise measurement backed by a usvg scene graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsvgBoundsMeasurer;

impl ContentBoundsMeasurer for UsvgBoundsMeasurer {
    fn measure(&self, inner_markup: &str) -> Option<ContentBounds> {
        let wrapped = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">{inner_markup}</svg>"#
        );
        let tree = usvg::Tree::from_str(&wrapped, &usvg::Options::default()).ok()?;
        let rect = tree.root().abs_stroke_bounding_box();
        let bounds = ContentBounds {
            x: rect.x(),
            y: rect.y(),
            width: rect.width(),
            height: rect.height(),
        };
        let valid = bounds.width.is_finite()
            && bounds.height.is_finite()
            && bounds.width > 0.0
            && bounds.height > 0.0;
        valid.then_some(bounds)
    }
}

/// Headless stand-in that never measures, forcing declared-view-box
/// centering.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBoundsMeasurer;

impl ContentBoundsMeasurer for NullBoundsMeasurer {
    fn measure(&self, _inner_markup: &str) -> Option<ContentBounds> {
        None
    }
}

// ============================================================================
// Optical offsets
// ============================================================================

/// A per-icon nudge in export pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OffsetPx {
    pub x: f32,
    pub y: f32,
}

/// Empirical per-icon-id corrections, applied additively after bounds-based
/// centering for icons that still look off-center (asymmetric glyphs like a
/// play triangle). Tunable data, loadable from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpticalOffsets(HashMap<String, OffsetPx>);

impl Default for OpticalOffsets {
    fn default() -> Self {
        let mut offsets = HashMap::new();
        offsets.insert("play".to_string(), OffsetPx { x: 2.0, y: 0.0 });
        Self(offsets)
    }
}

impl OpticalOffsets {
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn get(&self, icon_id: &str) -> Option<OffsetPx> {
        self.0.get(icon_id).copied()
    }
}

// ============================================================================
// IconNormalizer
// ============================================================================

/// Icon content ready for composition: inner markup, the inheritable root
/// attributes to re-apply, and the placement transform.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedIcon {
    pub markup: String,
    pub root_attributes: Vec<(String, String)>,
    pub scale: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

/// Normalizes icon records for placement inside the tag circle.
///
/// Holds the bounds-measurement capability and a per-icon-id cache of its
/// results; `None` entries record that measurement failed for that id and
/// short-circuit future attempts.
pub struct IconNormalizer {
    measurer: Box<dyn ContentBoundsMeasurer>,
    offsets: OpticalOffsets,
    bounds_cache: HashMap<String, Option<ContentBounds>>,
}

impl IconNormalizer {
    pub fn new(measurer: Box<dyn ContentBoundsMeasurer>, offsets: OpticalOffsets) -> Self {
        Self {
            measurer,
            offsets,
            bounds_cache: HashMap::new(),
        }
    }

    /// Normalizer with precise usvg-backed bounds measurement.
    pub fn precise() -> Self {
        Self::new(Box::new(UsvgBoundsMeasurer), OpticalOffsets::default())
    }

    /// Normalizer for contexts without a measurement surface; always centers
    /// on the declared view box.
    pub fn headless() -> Self {
        Self::new(Box::new(NullBoundsMeasurer), OpticalOffsets::default())
    }

    /// Resolves placement and paint for one icon record.
    ///
    /// Fails only on structurally invalid records (unparseable view box);
    /// unavailable bounds measurement degrades to declared-view-box
    /// centering.
    pub fn normalize(
        &mut self,
        icon: &IconRecord,
        foreground: HexColor,
        canvas_size: f32,
    ) -> Result<NormalizedIcon, IconError> {
        let view_box: ViewBox = icon.view_box.parse()?;
        let inner = extract_svg_inner(&icon.svg_content);
        let root_attributes = extract_root_attributes(&icon.svg_content, foreground);

        let fit_width = canvas_size * ICON_FIT_MAX_WIDTH_RATIO;
        let fit_height = canvas_size * ICON_FIT_MAX_HEIGHT_RATIO;
        let scale = (fit_width / view_box.width).min(fit_height / view_box.height);

        let center = canvas_size / 2.0;
        let (mut translate_x, mut translate_y) = match self.content_bounds(&icon.id, &inner) {
            Some(bounds) => (
                center - scale * (bounds.x + bounds.width / 2.0),
                center - scale * (bounds.y + bounds.height / 2.0),
            ),
            None => (
                (canvas_size - scale * view_box.width) / 2.0 - scale * view_box.min_x,
                (canvas_size - scale * view_box.height) / 2.0 - scale * view_box.min_y,
            ),
        };

        if let Some(offset) = self.offsets.get(&icon.id) {
            translate_x += offset.x;
            translate_y += offset.y;
        }

        Ok(NormalizedIcon {
            markup: repaint_markup(&inner, foreground),
            root_attributes,
            scale,
            translate_x,
            translate_y,
        })
    }

    /// Cached ink-bounds lookup keyed by icon id. Geometry does not change
    /// with the foreground color, so entries survive repaints.
    fn content_bounds(&mut self, icon_id: &str, inner: &str) -> Option<ContentBounds> {
        if let Some(cached) = self.bounds_cache.get(icon_id) {
            return *cached;
        }
        let measured = self.measurer.measure(inner);
        if measured.is_none() {
            log::debug!("content bounds unavailable for icon {icon_id}; using declared view box");
        }
        self.bounds_cache.insert(icon_id.to_string(), measured);
        measured
    }
}
