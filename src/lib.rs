//! tagsmith: deterministic rendering and export of circular tag badges.
//!
//! This crate turns a small tag configuration (background color, short text
//! or an icon reference) into a normalized SVG document and a pixel-identical
//! PNG derived from that exact document. The pipeline tolerates partial
//! failure in every optional enhancement (font fetching, glyph outlining,
//! ink-bounds measurement) by stepping down a tier instead of failing the
//! export.
//!
//! # Example
//!
//! ```no_run
//! use tagsmith::{FontResolver, IconCatalog, TagConfig, TagExporter, TagMode};
//!
//! let catalog = IconCatalog::load_dir("icons")?;
//! let fonts = FontResolver::from_dir("assets");
//! let mut exporter = TagExporter::new(catalog, fonts);
//!
//! let config = TagConfig {
//!     label: "My Tag".into(),
//!     background_color: "#6923F4".into(),
//!     mode: TagMode::Text,
//!     text: "AB".into(),
//!     ..TagConfig::default()
//! };
//!
//! let export = exporter.export(&config)?;
//! std::fs::write(&export.svg_file_name, &export.svg)?;
//! std::fs::write(&export.png_file_name, &export.png)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Fallback tiers
//!
//! - Text is outlined to path geometry when a TrueType source resolves;
//!   otherwise the document declares a styled text run, embedding the
//!   preferred font binary when one can be fetched, else falling back to a
//!   generic font stack.
//! - Icons center on measured ink bounds when the measurement capability is
//!   available, else on their declared view box.
//! - Contrast warnings are advisory and never block an export.

mod color;
mod compose;
mod config;
mod export;
mod font;
mod icon;
mod naming;
mod raster;
mod text;

pub use color::{
    ColorParseError, ContrastWarning, HexColor, WarningKind, contrast_ratio, evaluate_warnings,
    pick_foreground, relative_luminance,
};
pub use compose::{ComposeError, TagRenderer};
pub use config::{
    CONTRAST_THRESHOLD_BG_WHITE, CONTRAST_THRESHOLD_TEXT, EXPORT_SIZE, FONT_SIZE_1_CHAR,
    FONT_SIZE_2_CHAR, FONT_SIZE_3_CHAR, FONT_SIZE_MIN, ICON_FIT_MAX_HEIGHT_RATIO,
    ICON_FIT_MAX_WIDTH_RATIO, LABEL_MAX_LENGTH, TAG_DIAMETER, TAG_RADIUS, TEXT_MAX_LENGTH,
    TagConfig, TagMode, is_valid_tag_text, sanitize_tag_text,
};
pub use export::{ExportError, TagExport, TagExporter};
pub use font::{
    FontAssetSource, FontConfig, FontEmbed, FontError, FontFetcher, FontFormat, FontResolver,
    FsFontFetcher, ResolvedFont,
};
pub use icon::normalize::{
    ContentBounds, ContentBoundsMeasurer, IconNormalizer, NormalizedIcon, NullBoundsMeasurer,
    OffsetPx, OpticalOffsets, UsvgBoundsMeasurer, resolve_icon,
};
pub use icon::sanitize::{create_uploaded_icon, sanitize_svg};
pub use icon::{IconCatalog, IconError, IconRecord, ViewBox};
pub use naming::{build_file_name, to_slug};
pub use raster::{RasterError, rasterize};
pub use text::outline::{OutlinedGlyphPath, outline_text};
pub use text::{FaceMeasurer, HeuristicMeasurer, TextMeasurer, fit_font_size};
