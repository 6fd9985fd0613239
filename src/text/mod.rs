//! Text sizing for short tag labels.
//!
//! The fitter starts from a preferred size for the label length and steps
//! down until the rendered width fits inside the tag circle. Width
//! measurement is a capability supplied at startup: precise when a parseable
//! font is available, a documented heuristic otherwise.

pub mod outline;

use ttf_parser::Face;

use crate::config::{
    FONT_SIZE_1_CHAR, FONT_SIZE_2_CHAR, FONT_SIZE_3_CHAR, FONT_SIZE_MIN, TAG_RADIUS,
};

/// Fraction of an em assumed per character when no real metrics exist.
const HEURISTIC_EM_FRACTION: f32 = 0.65;

// ============================================================================
// Measurement capability
// ============================================================================

/// Measures rendered text width at a given font size, in export units.
///
/// Implementations are chosen once at startup: [`FaceMeasurer`] when the
/// tag font could be loaded, [`HeuristicMeasurer`] otherwise.
pub trait TextMeasurer: Send + Sync {
    fn measure_width(&self, text: &str, font_size: f32) -> f32;
}

/// The named approximation fallback: `length × fontSize × 0.65`.
///
/// Used when no font binary is available for real metrics. Kept as an
/// explicit type rather than an inline default so callers can see which
/// measurement tier produced a fit.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMeasurer;

impl TextMeasurer for HeuristicMeasurer {
    fn measure_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * HEURISTIC_EM_FRACTION
    }
}

/// Precise measurement backed by a parsed font's advance widths.
pub struct FaceMeasurer {
    font_bytes: Vec<u8>,
}

impl FaceMeasurer {
    /// Wraps a font binary, validating up front that it parses.
    ///
    /// Returns `None` for data `ttf-parser` cannot read (e.g. WOFF2).
    pub fn new(font_bytes: Vec<u8>) -> Option<Self> {
        Face::parse(&font_bytes, 0).ok()?;
        Some(Self { font_bytes })
    }
}

impl TextMeasurer for FaceMeasurer {
    fn measure_width(&self, text: &str, font_size: f32) -> f32 {
        let Ok(face) = Face::parse(&self.font_bytes, 0) else {
            return HeuristicMeasurer.measure_width(text, font_size);
        };
        let upem = face.units_per_em() as f32;
        let mut units = 0.0f32;
        for c in text.chars() {
            let advance = face
                .glyph_index(c)
                .and_then(|id| face.glyph_hor_advance(id));
            match advance {
                Some(a) => units += a as f32,
                // Unmapped character: assume the heuristic em fraction.
                None => units += upem * HEURISTIC_EM_FRACTION,
            }
        }
        units * font_size / upem
    }
}

// ============================================================================
// Fitting
// ============================================================================

fn preferred_size(text: &str) -> f32 {
    match text.trim().chars().count() {
        0 | 1 => FONT_SIZE_1_CHAR,
        2 => FONT_SIZE_2_CHAR,
        _ => FONT_SIZE_3_CHAR,
    }
}

fn max_width(text: &str) -> f32 {
    match text.trim().chars().count() {
        0 | 1 => TAG_RADIUS * 1.62,
        2 => TAG_RADIUS * 1.56,
        _ => TAG_RADIUS * 1.50,
    }
}

/// Chooses a font size in `[FONT_SIZE_MIN, preferred]` for the given text.
///
/// Starts at the preferred size for the length bucket (1 char → 18.5,
/// 2 → 16.5, ≥3 → 12.5) and steps down by 0.5 until the measured width fits
/// the bucket's limit, or the floor of 9 is reached.
pub fn fit_font_size(text: &str, measurer: &dyn TextMeasurer) -> f32 {
    let limit = max_width(text);
    let mut size = preferred_size(text);
    while size >= FONT_SIZE_MIN {
        if measurer.measure_width(text, size) <= limit {
            return size;
        }
        size -= 0.5;
    }
    FONT_SIZE_MIN
}
