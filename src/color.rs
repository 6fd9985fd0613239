//! WCAG 2.1 color math: luminance, contrast ratios, foreground selection,
//! and the advisory contrast warnings surfaced next to the live preview.

use std::fmt;
use std::str::FromStr;

use palette::Srgb;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{CONTRAST_THRESHOLD_BG_WHITE, CONTRAST_THRESHOLD_TEXT};

// ============================================================================
// HexColor
// ============================================================================

/// A 6-digit sRGB hex color.
///
/// Parses with or without a leading `#`, case-insensitively. The canonical
/// rendering is always uppercase with a leading `#`:
///
/// ```
/// use tagsmith::HexColor;
///
/// let c: HexColor = "ff5733".parse().unwrap();
/// assert_eq!(c.canonical(), "#FF5733");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexColor([u8; 3]);

/// Error returned when a string is not a 6-hex-digit color.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid hex color {value:?}: expected 6 hex digits with optional '#'")]
pub struct ColorParseError {
    /// The rejected input, verbatim.
    pub value: String,
}

impl HexColor {
    /// Pure black, `#000000`.
    pub const BLACK: Self = Self([0, 0, 0]);

    /// Pure white, `#FFFFFF`.
    pub const WHITE: Self = Self([255, 255, 255]);

    /// Creates a color from raw channel values.
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Returns the `(r, g, b)` channels.
    pub fn channels(&self) -> (u8, u8, u8) {
        (self.0[0], self.0[1], self.0[2])
    }

    /// Canonical form: uppercase with a leading `#`.
    pub fn canonical(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2])
    }

    /// Lowercase hex digits without the `#`, as used in export file names.
    pub fn hex_lower(&self) -> String {
        format!("{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }
}

impl FromStr for HexColor {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorParseError {
                value: s.to_string(),
            });
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).unwrap_or(0);
        Ok(Self([channel(0), channel(2), channel(4)]))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

// ============================================================================
// Luminance & Contrast
// ============================================================================

/// WCAG 2.1 relative luminance, from 0.0 (black) to 1.0 (white).
///
/// Channels are decoded from sRGB to linear light with the standard piecewise
/// transfer function and summed with the 0.2126/0.7152/0.0722 weights.
pub fn relative_luminance(color: HexColor) -> f64 {
    let (r, g, b) = color.channels();
    let linear = Srgb::new(
        r as f64 / 255.0,
        g as f64 / 255.0,
        b as f64 / 255.0,
    )
    .into_linear();
    0.2126 * linear.red + 0.7152 * linear.green + 0.0722 * linear.blue
}

/// WCAG 2.1 contrast ratio between two colors, from 1.0 to 21.0.
///
/// Symmetric in its arguments.
pub fn contrast_ratio(a: HexColor, b: HexColor) -> f64 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    let lighter = la.max(lb);
    let darker = la.min(lb);
    (lighter + 0.05) / (darker + 0.05)
}

/// Picks the foreground (pure black or pure white) with the highest contrast
/// against the given background. Ties favor black.
pub fn pick_foreground(background: HexColor) -> HexColor {
    let with_black = contrast_ratio(background, HexColor::BLACK);
    let with_white = contrast_ratio(background, HexColor::WHITE);
    if with_black >= with_white {
        HexColor::BLACK
    } else {
        HexColor::WHITE
    }
}

// ============================================================================
// Warnings
// ============================================================================

/// Which accessibility check a [`ContrastWarning`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// Foreground against the tag background is below the text threshold.
    LowForegroundContrast,
    /// The tag background itself is hard to see on a white page.
    LowBackgroundVisibility,
}

/// A non-blocking advisory about the configured colors.
///
/// Warnings are recomputed per configuration change and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastWarning {
    pub kind: WarningKind,
    pub message: String,
    pub ratio: f64,
}

/// Evaluates both contrast checks for a background/foreground pair.
///
/// The checks are independent and may both fire. An empty vector means the
/// combination passes both thresholds.
pub fn evaluate_warnings(background: HexColor, foreground: HexColor) -> Vec<ContrastWarning> {
    let mut warnings = Vec::new();

    let fg_bg = contrast_ratio(foreground, background);
    if fg_bg < CONTRAST_THRESHOLD_TEXT {
        warnings.push(ContrastWarning {
            kind: WarningKind::LowForegroundContrast,
            message: format!(
                "Low text/icon contrast ({fg_bg:.1}:1). Minimum recommended is {CONTRAST_THRESHOLD_TEXT}:1."
            ),
            ratio: fg_bg,
        });
    }

    let bg_white = contrast_ratio(background, HexColor::WHITE);
    if bg_white < CONTRAST_THRESHOLD_BG_WHITE {
        warnings.push(ContrastWarning {
            kind: WarningKind::LowBackgroundVisibility,
            message: format!(
                "Tag may be hard to see on white backgrounds ({bg_white:.1}:1). Minimum recommended is {CONTRAST_THRESHOLD_BG_WHITE}:1."
            ),
            ratio: bg_white,
        });
    }

    warnings
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> HexColor {
        s.parse().unwrap()
    }

    #[test]
    fn parse_accepts_both_prefixes_and_cases() {
        assert_eq!(hex("#FF5733"), hex("ff5733"));
        assert_eq!(hex("AbCdEf").canonical(), "#ABCDEF");
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!("#FFF".parse::<HexColor>().is_err());
        assert!("not-a-color".parse::<HexColor>().is_err());
        assert!("#GGGGGG".parse::<HexColor>().is_err());
        assert!("".parse::<HexColor>().is_err());
    }

    #[test]
    fn luminance_extremes() {
        assert!(relative_luminance(HexColor::BLACK) < 1e-6);
        assert!((relative_luminance(HexColor::WHITE) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn luminance_known_values() {
        // sRGB 128/255 linearizes to ~0.2159 per channel.
        assert!((relative_luminance(hex("#808080")) - 0.2159).abs() < 1e-3);
        // Pure red contributes only the 0.2126 weight.
        assert!((relative_luminance(hex("#FF0000")) - 0.2126).abs() < 1e-4);
    }

    #[test]
    fn contrast_black_vs_white_is_21() {
        let ratio = contrast_ratio(HexColor::BLACK, HexColor::WHITE);
        assert!((ratio - 21.0).abs() < 0.01);
    }

    #[test]
    fn contrast_identical_is_1() {
        let ratio = contrast_ratio(hex("#FF0000"), hex("#FF0000"));
        assert!((ratio - 1.0).abs() < 1e-9);
    }

    #[test]
    fn contrast_is_symmetric() {
        let ab = contrast_ratio(hex("#123456"), hex("#FEDCBA"));
        let ba = contrast_ratio(hex("#FEDCBA"), hex("#123456"));
        assert!((ab - ba).abs() < 1e-12);
    }

    #[test]
    fn contrast_navy_vs_white() {
        let ratio = contrast_ratio(hex("#000080"), HexColor::WHITE);
        assert!(ratio > 15.0 && ratio < 17.0);
    }

    #[test]
    fn foreground_for_extremes() {
        assert_eq!(pick_foreground(HexColor::WHITE), HexColor::BLACK);
        assert_eq!(pick_foreground(HexColor::BLACK), HexColor::WHITE);
    }

    #[test]
    fn foreground_for_common_backgrounds() {
        assert_eq!(pick_foreground(hex("#FFFF00")), HexColor::BLACK);
        assert_eq!(pick_foreground(hex("#000080")), HexColor::WHITE);
        assert_eq!(pick_foreground(hex("#8B0000")), HexColor::WHITE);
        assert_eq!(pick_foreground(hex("#FFB6C1")), HexColor::BLACK);
    }

    #[test]
    fn white_background_warns_about_visibility() {
        let fg = pick_foreground(HexColor::WHITE);
        let warnings = evaluate_warnings(HexColor::WHITE, fg);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::LowBackgroundVisibility);
        assert!(warnings[0].ratio < CONTRAST_THRESHOLD_BG_WHITE);
    }

    #[test]
    fn light_gray_with_white_foreground_fires_both_warnings() {
        // White on #CCCCCC is ~1.6:1, and #CCCCCC on a white page is ~1.6:1.
        let bg = hex("#CCCCCC");
        let warnings = evaluate_warnings(bg, HexColor::WHITE);
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].kind, WarningKind::LowForegroundContrast);
        assert_eq!(warnings[1].kind, WarningKind::LowBackgroundVisibility);
    }

    #[test]
    fn light_gray_with_picked_foreground_warns_only_about_visibility() {
        let bg = hex("#CCCCCC");
        let warnings = evaluate_warnings(bg, pick_foreground(bg));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::LowBackgroundVisibility);
    }

    #[test]
    fn saturated_purple_passes_both_checks() {
        let bg = hex("#6923F4");
        assert!(evaluate_warnings(bg, pick_foreground(bg)).is_empty());
    }
}
