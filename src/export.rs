//! One-shot tag export: configuration in, SVG + PNG payloads out.
//!
//! Steps run sequentially within one logical export. Font preload, TrueType
//! fetch, and outlining are best-effort; their failures are logged and the
//! export continues on the next tier down. Only composition and
//! rasterization failures abort.

use thiserror::Error;

use crate::color::{self, ContrastWarning, HexColor};
use crate::compose::{ComposeError, TagRenderer};
use crate::config::{EXPORT_SIZE, TAG_RADIUS, TagConfig, TagMode};
use crate::font::{FontEmbed, FontResolver};
use crate::icon::IconCatalog;
use crate::icon::normalize::IconNormalizer;
use crate::naming::build_file_name;
use crate::raster::{RasterError, rasterize};
use crate::text::outline::{OutlinedGlyphPath, outline_text};
use crate::text::{FaceMeasurer, HeuristicMeasurer, TextMeasurer};

/// Fatal export failures. Degraded tiers never surface here.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to compose tag document")]
    Compose(#[from] ComposeError),

    #[error("failed to rasterize tag document")]
    Raster(#[from] RasterError),
}

/// The finished export bundle: both artifacts, their deterministic file
/// names, and the advisory warnings for the configuration.
#[derive(Debug, Clone)]
pub struct TagExport {
    pub svg: String,
    pub png: Vec<u8>,
    pub svg_file_name: String,
    pub png_file_name: String,
    pub foreground: HexColor,
    pub warnings: Vec<ContrastWarning>,
}

// ============================================================================
// TagExporter
// ============================================================================

/// Runs the full pipeline for user-triggered exports.
///
/// Callers serialize exports (one per user action); the only state shared
/// between calls is the font preload memo and the icon bounds cache.
pub struct TagExporter {
    renderer: TagRenderer,
    fonts: FontResolver,
}

impl TagExporter {
    /// Builds an exporter, selecting the text-measurement tier once up
    /// front: real font metrics when the TrueType source preloads, the
    /// documented heuristic otherwise.
    pub fn new(catalog: IconCatalog, fonts: FontResolver) -> Self {
        let measurer: Box<dyn TextMeasurer> = match fonts.preload() {
            Ok(font) => match FaceMeasurer::new(font.bytes.clone()) {
                Some(measurer) => Box::new(measurer),
                None => {
                    log::debug!("preloaded font is not parseable; using heuristic text widths");
                    Box::new(HeuristicMeasurer)
                }
            },
            Err(e) => {
                log::debug!("font preload failed: {e}; using heuristic text widths");
                Box::new(HeuristicMeasurer)
            }
        };
        let renderer = TagRenderer::new(
            catalog,
            IconNormalizer::precise(),
            measurer,
            fonts.config().clone(),
        );
        Self { renderer, fonts }
    }

    /// Builds an exporter around a pre-configured renderer.
    pub fn with_renderer(renderer: TagRenderer, fonts: FontResolver) -> Self {
        Self { renderer, fonts }
    }

    /// The document renderer, also usable for live previews.
    pub fn renderer(&mut self) -> &mut TagRenderer {
        &mut self.renderer
    }

    /// Composes the preview document for a configuration: same output as the
    /// export's vector artifact minus font embedding and outlining, which
    /// only matter outside the application.
    pub fn preview_document(&mut self, config: &TagConfig) -> Result<String, ComposeError> {
        let background: HexColor = config.background_color.parse()?;
        let foreground = color::pick_foreground(background);
        self.renderer
            .compose_document(config, foreground, None, None)
    }

    /// Runs one export operation.
    pub fn export(&mut self, config: &TagConfig) -> Result<TagExport, ExportError> {
        let background: HexColor = config
            .background_color
            .parse()
            .map_err(ComposeError::from)?;
        let foreground = color::pick_foreground(background);
        let warnings = color::evaluate_warnings(background, foreground);

        let mut outlined: Option<OutlinedGlyphPath> = None;
        let mut font_embed: Option<FontEmbed> = None;

        if config.mode == TagMode::Text {
            if let Err(e) = self.fonts.preload() {
                log::debug!("font preload failed: {e}");
            }

            match self.fonts.resolve_truetype() {
                Ok(font) => {
                    let font_size = self.renderer.fit_text_size(&config.text);
                    outlined = outline_text(
                        &config.text,
                        font_size,
                        TAG_RADIUS,
                        TAG_RADIUS,
                        &font.bytes,
                    );
                }
                Err(e) => {
                    log::debug!("truetype fetch failed: {e}");
                }
            }

            if outlined.is_none() && !config.text.trim().is_empty() {
                log::debug!("text outlining unavailable; exporting a text run instead");
                // A text run renders with the viewer's fonts, so embed the
                // preferred binary to keep the vector artifact portable.
                match self.fonts.resolve_preferred() {
                    Ok(font) => font_embed = Some(font.to_embed()),
                    Err(e) => {
                        log::warn!("font embedding unavailable: {e}; text run uses the fallback stack");
                    }
                }
            }
        }

        let svg = self.renderer.compose_document(
            config,
            foreground,
            font_embed.as_ref(),
            outlined.as_ref(),
        )?;
        let png = rasterize(&svg, EXPORT_SIZE)?;

        let label = config.file_label();
        Ok(TagExport {
            svg_file_name: build_file_name(label, config.mode, background, "svg"),
            png_file_name: build_file_name(label, config.mode, background, "png"),
            svg,
            png,
            foreground,
            warnings,
        })
    }
}
