//! Rasterization of composed tag documents to PNG.
//!
//! The bitmap is always derived from the exact document string the vector
//! export uses, so the two artifacts cannot drift apart. Failures identify
//! which stage broke: decoding the document, drawing it, or encoding the
//! PNG.

use std::io::Cursor;
use std::sync::{Arc, LazyLock};

use image::{ImageFormat, Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, Options, Tree};
use thiserror::Error;

static SVG_OPTIONS: LazyLock<Options<'static>> = LazyLock::new(|| {
    let mut fontdb = usvg::fontdb::Database::new();
    // Text-run fallback documents reference system families.
    fontdb.load_system_fonts();
    Options {
        fontdb: Arc::new(fontdb),
        ..Options::default()
    }
});

/// Rasterization failures, by pipeline stage.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("failed to decode tag document: {0}")]
    Decode(#[from] usvg::Error),

    #[error("failed to draw tag document at {size}x{size}")]
    Draw { size: u32 },

    #[error("failed to encode tag bitmap: {0}")]
    Encode(#[from] image::ImageError),
}

/// Renders a composed document to square PNG bytes at `target_size`.
pub fn rasterize(svg: &str, target_size: u32) -> Result<Vec<u8>, RasterError> {
    let tree = Tree::from_str(svg, &SVG_OPTIONS)?;

    let mut pixmap = Pixmap::new(target_size, target_size).ok_or(RasterError::Draw {
        size: target_size,
    })?;
    let svg_size = tree.size();
    let transform = Transform::from_scale(
        target_size as f32 / svg_size.width(),
        target_size as f32 / svg_size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let img = pixmap_to_rgba_image(&pixmap);
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img).write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// Converts a tiny_skia Pixmap to an image::RgbaImage.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let width = pixmap.width();
    let height = pixmap.height();
    let mut img = RgbaImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let pixel = pixmap.pixel(x, y).unwrap();
            // tiny_skia stores premultiplied alpha; PNG wants straight alpha.
            let (r, g, b, a) =
                unpremultiply(pixel.red(), pixel.green(), pixel.blue(), pixel.alpha());
            img.put_pixel(x, y, Rgba([r, g, b, a]));
        }
    }

    img
}

/// Unpremultiplies a premultiplied alpha pixel.
fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8, u8) {
    if a == 0 {
        (0, 0, 0, 0)
    } else {
        let a_f = a as f32 / 255.0;
        (
            (r as f32 / a_f).round().min(255.0) as u8,
            (g as f32 / a_f).round().min(255.0) as u8,
            (b as f32 / a_f).round().min(255.0) as u8,
            a,
        )
    }
}
