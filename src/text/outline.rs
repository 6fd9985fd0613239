//! Best-effort conversion of tag text into vector path geometry.
//!
//! Outlining keeps exported documents visually deterministic in tools that
//! do not ship the tag font. Every failure path returns `None` so the caller
//! can fall back to a plain text run; nothing in here performs I/O.

use std::fmt::Write as _;

use ttf_parser::{Face, OutlineBuilder, Rect};

/// Text converted to explicit path geometry, plus the translation that
/// centers its bounding box on the tag center.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlinedGlyphPath {
    /// SVG path data for the text at origin, 3-decimal precision.
    pub path_data: String,
    pub translate_x: f32,
    pub translate_y: f32,
}

// ============================================================================
// Path serialization
// ============================================================================

/// Accumulates glyph outlines into SVG path data.
///
/// Glyph coordinates arrive in font units with a y-up axis; the sink applies
/// the em scale, the running pen advance, and the y flip in one step.
struct PathSink {
    d: String,
    scale: f32,
    /// Pen position of the current glyph, in font units.
    pen_x: f32,
}

impl PathSink {
    fn new(scale: f32) -> Self {
        Self {
            d: String::new(),
            scale,
            pen_x: 0.0,
        }
    }

    fn push_point(&mut self, x: f32, y: f32) {
        let px = (self.pen_x + x) * self.scale;
        let py = -y * self.scale;
        push_coord(&mut self.d, px);
        self.d.push(' ');
        push_coord(&mut self.d, py);
    }

    fn push_command(&mut self, op: char) {
        if !self.d.is_empty() {
            self.d.push(' ');
        }
        self.d.push(op);
        self.d.push(' ');
    }
}

impl OutlineBuilder for PathSink {
    fn move_to(&mut self, x: f32, y: f32) {
        self.push_command('M');
        self.push_point(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.push_command('L');
        self.push_point(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.push_command('Q');
        self.push_point(x1, y1);
        self.d.push(' ');
        self.push_point(x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.push_command('C');
        self.push_point(x1, y1);
        self.d.push(' ');
        self.push_point(x2, y2);
        self.d.push(' ');
        self.push_point(x, y);
    }

    fn close(&mut self) {
        if !self.d.is_empty() {
            self.d.push(' ');
        }
        self.d.push('Z');
    }
}

/// Writes a coordinate rounded to 3 decimal places, without trailing zeros.
fn push_coord(out: &mut String, value: f32) {
    let mut s = format!("{value:.3}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    if s == "-0" {
        s.clear();
        s.push('0');
    }
    let _ = out.write_str(&s);
}

// ============================================================================
// Bounding box
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct PathBounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl PathBounds {
    fn empty() -> Self {
        Self {
            min_x: f32::INFINITY,
            min_y: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            max_y: f32::NEG_INFINITY,
        }
    }

    /// Folds in one glyph's outline rect, offset by the pen position and
    /// mapped into output space (em scale applied, y axis flipped).
    fn include_glyph(&mut self, rect: Rect, pen_x: f32, scale: f32) {
        let x_min = (pen_x + rect.x_min as f32) * scale;
        let x_max = (pen_x + rect.x_max as f32) * scale;
        let y_min = -(rect.y_max as f32) * scale;
        let y_max = -(rect.y_min as f32) * scale;
        self.min_x = self.min_x.min(x_min);
        self.max_x = self.max_x.max(x_max);
        self.min_y = self.min_y.min(y_min);
        self.max_y = self.max_y.max(y_max);
    }

    fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    fn is_valid(&self) -> bool {
        self.width().is_finite()
            && self.height().is_finite()
            && self.width() > 0.0
            && self.height() > 0.0
    }
}

/// Translation that lands the center of `bounds` exactly on `(cx, cy)`.
fn centering_translation(bounds: &PathBounds, cx: f32, cy: f32) -> (f32, f32) {
    (
        cx - (bounds.min_x + bounds.width() / 2.0),
        cy - (bounds.min_y + bounds.height() / 2.0),
    )
}

// ============================================================================
// Outlining
// ============================================================================

/// Converts `text` into path geometry using the given font binary.
///
/// Returns `None` for blank text, for fonts `ttf-parser` cannot read, for
/// characters the font does not map, and for degenerate bounding boxes.
/// Callers fall back to declaring the text as a styled text run.
pub fn outline_text(
    text: &str,
    font_size: f32,
    center_x: f32,
    center_y: f32,
    font_bytes: &[u8],
) -> Option<OutlinedGlyphPath> {
    let label = text.trim();
    if label.is_empty() {
        return None;
    }

    let face = Face::parse(font_bytes, 0).ok()?;
    let upem = face.units_per_em();
    if upem == 0 {
        return None;
    }
    let scale = font_size / upem as f32;

    let mut sink = PathSink::new(scale);
    let mut bounds = PathBounds::empty();
    let mut pen_x = 0.0f32;

    for c in label.chars() {
        let glyph = face.glyph_index(c)?;
        sink.pen_x = pen_x;
        if let Some(rect) = face.outline_glyph(glyph, &mut sink) {
            bounds.include_glyph(rect, pen_x, scale);
        }
        pen_x += face.glyph_hor_advance(glyph)? as f32;
    }

    if sink.d.is_empty() || !bounds.is_valid() {
        return None;
    }

    let (translate_x, translate_y) = centering_translation(&bounds, center_x, center_y);
    Some(OutlinedGlyphPath {
        path_data: sink.d,
        translate_x,
        translate_y,
    })
}
