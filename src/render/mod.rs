//! Text rendering onto images.
//!
//! This module burns text into photos before they are stored: a translucent
//! caption bar at the bottom, or low-opacity rotated watermark stamps.
//!
//! # Features
//!
//! - **Caption bar**: wrapped, centered, stroked text on a translucent bar
//! - **Watermarks**: a single centered rotated stamp, or staggered tiling
//!   across the whole canvas
//! - **Font fallback**: configured font file, well-known system fonts, then
//!   built-in bitmap glyphs that cannot fail
//!
//! All entry points take encoded image bytes and return encoded JPEG bytes;
//! empty text returns the input unchanged.

pub mod caption;
pub mod error;
pub mod font;
pub mod watermark;
pub mod wrap;

// Re-export main types for convenience
pub use caption::render_caption_bottom;
pub use error::RenderError;
pub use font::{FontProvider, ResolvedFont};
pub use watermark::{render_watermark_center, render_watermark_tiled};
pub use wrap::wrap_text;

use crate::constants::{DEFAULT_JPEG_QUALITY, DEFAULT_WATERMARK_ANGLE};
use image::io::Reader as ImageReader;
use image::{Rgba, RgbaImage};
use std::io::Cursor;

/// Knobs shared by all renderers.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// JPEG encode quality (1-100).
    pub jpeg_quality: u8,
    /// Watermark rotation in degrees (clockwise).
    pub watermark_angle: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            watermark_angle: DEFAULT_WATERMARK_ANGLE,
        }
    }
}

/// Facade over the three renderers, holding the resolved font and options.
#[derive(Debug)]
pub struct TextRenderer {
    fonts: FontProvider,
    options: RenderOptions,
}

impl TextRenderer {
    pub fn new(fonts: FontProvider, options: RenderOptions) -> Self {
        Self { fonts, options }
    }

    /// Renderer pinned to the built-in bitmap font with default options.
    pub fn builtin() -> Self {
        Self::new(FontProvider::builtin(), RenderOptions::default())
    }

    pub fn fonts(&self) -> &FontProvider {
        &self.fonts
    }

    /// Caption on a translucent bar across the bottom of the photo.
    pub fn caption_bottom(&self, image_bytes: &[u8], text: &str) -> Result<Vec<u8>, RenderError> {
        render_caption_bottom(&self.fonts, image_bytes, text, self.options.jpeg_quality)
    }

    /// One rotated low-opacity stamp in the middle of the photo.
    pub fn watermark_center(&self, image_bytes: &[u8], text: &str) -> Result<Vec<u8>, RenderError> {
        render_watermark_center(
            &self.fonts,
            image_bytes,
            text,
            self.options.watermark_angle,
            self.options.jpeg_quality,
        )
    }

    /// Staggered stamps tiled across the whole photo.
    pub fn watermark_tiled(&self, image_bytes: &[u8], text: &str) -> Result<Vec<u8>, RenderError> {
        render_watermark_tiled(
            &self.fonts,
            image_bytes,
            text,
            self.options.watermark_angle,
            self.options.jpeg_quality,
        )
    }
}

/// Decode encoded image bytes into RGBA, guessing the format from content.
pub fn decode_rgba(image_bytes: &[u8]) -> Result<RgbaImage, RenderError> {
    let reader = ImageReader::new(Cursor::new(image_bytes))
        .with_guessed_format()
        .map_err(|e| RenderError::decode_failed(e.to_string()))?;

    let image = reader
        .decode()
        .map_err(|e| RenderError::decode_failed(e.to_string()))?;

    Ok(image.to_rgba8())
}

/// Force every pixel opaque. Text is composited onto an opaque copy of the
/// photo so a transparent source cannot leak through the blend arithmetic.
pub(crate) fn make_opaque(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        pixel[3] = 255;
    }
}

/// Encode RGBA pixels as JPEG at the given quality, discarding alpha.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, RenderError> {
    use image::codecs::jpeg::JpegEncoder;
    use image::ImageEncoder as _;

    let rgb_data = rgba_to_rgb(image.as_raw());

    let mut output = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut output, quality.clamp(1, 100));

    encoder
        .write_image(
            &rgb_data,
            image.width(),
            image.height(),
            image::ColorType::Rgb8,
        )
        .map_err(|e| RenderError::encode_failed("jpeg", e.to_string()))?;

    Ok(output.into_inner())
}

/// Convert RGBA pixel data to RGB by dropping the alpha channel.
fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let pixel_count = rgba.len() / 4;
    let mut rgb = Vec::with_capacity(pixel_count * 3);

    for chunk in rgba.chunks_exact(4) {
        rgb.push(chunk[0]);
        rgb.push(chunk[1]);
        rgb.push(chunk[2]);
    }

    rgb
}

/// Blend two RGBA pixels with the Porter-Duff "over" operator.
pub(crate) fn blend_pixel(bottom: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    let top_alpha = top[3] as f32 / 255.0;
    let bottom_alpha = bottom[3] as f32 / 255.0;

    let out_alpha = top_alpha + bottom_alpha * (1.0 - top_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |t: u8, b: u8| -> u8 {
        let t = t as f32 / 255.0;
        let b = b as f32 / 255.0;
        let result = (t * top_alpha + b * bottom_alpha * (1.0 - top_alpha)) / out_alpha;
        (result * 255.0).clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend(top[0], bottom[0]),
        blend(top[1], bottom[1]),
        blend(top[2], bottom[2]),
        (out_alpha * 255.0) as u8,
    ])
}

/// Blend `layer` onto `target` with its top-left corner at (x, y).
///
/// The layer may hang off any edge; only the visible region is touched.
pub(crate) fn blend_layer(target: &mut RgbaImage, layer: &RgbaImage, x: i32, y: i32) {
    let target_width = target.width() as i32;
    let target_height = target.height() as i32;

    let layer_width = layer.width() as i32;
    let layer_height = layer.height() as i32;

    // Clamp to the visible region
    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = (x + layer_width).min(target_width);
    let y_end = (y + layer_height).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let lx = (tx - x) as u32;
            let ly = (ty - y) as u32;

            let layer_pixel = layer.get_pixel(lx, ly);
            if layer_pixel[3] == 0 {
                continue;
            }

            let target_pixel = target.get_pixel(tx as u32, ty as u32);
            let blended = blend_pixel(*target_pixel, *layer_pixel);
            target.put_pixel(tx as u32, ty as u32, blended);
        }
    }
}

/// Draw one line of text with a stroke ring behind the fill.
///
/// The ring passes overlap each other, so drawing them straight onto the
/// canvas would stack alpha far past the stroke's own. The ring is built
/// opaque on a scratch layer sized to the line, its alpha scaled once, and
/// the result composited before the fill goes on top.
pub(crate) fn draw_stroked_line(
    canvas: &mut RgbaImage,
    font: &ResolvedFont<'_>,
    x: f32,
    baseline: f32,
    text: &str,
    fill: Rgba<u8>,
    stroke: Rgba<u8>,
    stroke_width: u32,
) {
    if stroke_width > 0 && stroke[3] > 0 {
        let pad = stroke_width + 2;
        let scratch_width = (font.measure(text) + 2 * pad).max(1);
        let scratch_height = (font.line_height().ceil() as u32 + 2 * pad).max(1);

        let mut scratch = RgbaImage::new(scratch_width, scratch_height);
        let opaque = Rgba([stroke[0], stroke[1], stroke[2], 255]);
        let scratch_baseline = pad as f32 + font.ascent();

        let sw = stroke_width as i32;
        for dy in -sw..=sw {
            for dx in -sw..=sw {
                if dx == 0 && dy == 0 {
                    continue;
                }
                font.draw(
                    &mut scratch,
                    pad as f32 + dx as f32,
                    scratch_baseline + dy as f32,
                    text,
                    opaque,
                );
            }
        }

        scale_alpha(&mut scratch, stroke[3]);

        let offset_x = (x - pad as f32).round() as i32;
        let offset_y = (baseline - font.ascent() - pad as f32).round() as i32;
        blend_layer(canvas, &scratch, offset_x, offset_y);
    }

    font.draw(canvas, x, baseline, text, fill);
}

/// Multiply every pixel's alpha by `alpha` / 255.
fn scale_alpha(image: &mut RgbaImage, alpha: u8) {
    let factor = alpha as f32 / 255.0;
    for pixel in image.pixels_mut() {
        pixel[3] = (pixel[3] as f32 * factor) as u8;
    }
}

/// Rotate an image by the specified degrees (clockwise).
///
/// The output canvas is sized to the rotated bounding box so no content is
/// clipped; uncovered corners stay transparent. Sampling is bilinear.
pub(crate) fn rotate_rgba(image: &RgbaImage, degrees: f32) -> RgbaImage {
    let radians = -degrees.to_radians(); // Negative for clockwise
    let cos = radians.cos();
    let sin = radians.sin();

    let src_w = image.width() as f32;
    let src_h = image.height() as f32;
    let cx = src_w / 2.0;
    let cy = src_h / 2.0;

    // Rotated bounding box
    let corners = [
        (-cx, -cy),
        (src_w - cx, -cy),
        (-cx, src_h - cy),
        (src_w - cx, src_h - cy),
    ];

    let rotated_corners: Vec<(f32, f32)> = corners
        .iter()
        .map(|(x, y)| (x * cos - y * sin, x * sin + y * cos))
        .collect();

    let min_x = rotated_corners
        .iter()
        .map(|(x, _)| *x)
        .fold(f32::INFINITY, f32::min);
    let max_x = rotated_corners
        .iter()
        .map(|(x, _)| *x)
        .fold(f32::NEG_INFINITY, f32::max);
    let min_y = rotated_corners
        .iter()
        .map(|(_, y)| *y)
        .fold(f32::INFINITY, f32::min);
    let max_y = rotated_corners
        .iter()
        .map(|(_, y)| *y)
        .fold(f32::NEG_INFINITY, f32::max);

    let dst_w = (max_x - min_x).ceil() as u32;
    let dst_h = (max_y - min_y).ceil() as u32;

    let mut rotated = RgbaImage::new(dst_w.max(1), dst_h.max(1));

    let dst_cx = dst_w as f32 / 2.0;
    let dst_cy = dst_h as f32 / 2.0;

    // Inverse rotation for sampling
    let inv_cos = (-radians).cos();
    let inv_sin = (-radians).sin();

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let rx = dx as f32 - dst_cx;
            let ry = dy as f32 - dst_cy;

            let sx = rx * inv_cos - ry * inv_sin + cx;
            let sy = rx * inv_sin + ry * inv_cos + cy;

            // Bilinear interpolation
            if sx >= 0.0 && sx < src_w - 1.0 && sy >= 0.0 && sy < src_h - 1.0 {
                let x0 = sx.floor() as u32;
                let y0 = sy.floor() as u32;
                let x1 = x0 + 1;
                let y1 = y0 + 1;

                let fx = sx - x0 as f32;
                let fy = sy - y0 as f32;

                let p00 = image.get_pixel(x0, y0);
                let p10 = image.get_pixel(x1, y0);
                let p01 = image.get_pixel(x0, y1);
                let p11 = image.get_pixel(x1, y1);

                let interpolate = |c: usize| -> u8 {
                    let v00 = p00[c] as f32;
                    let v10 = p10[c] as f32;
                    let v01 = p01[c] as f32;
                    let v11 = p11[c] as f32;

                    let v = v00 * (1.0 - fx) * (1.0 - fy)
                        + v10 * fx * (1.0 - fy)
                        + v01 * (1.0 - fx) * fy
                        + v11 * fx * fy;

                    v.clamp(0.0, 255.0) as u8
                };

                rotated.put_pixel(
                    dx,
                    dy,
                    Rgba([
                        interpolate(0),
                        interpolate(1),
                        interpolate(2),
                        interpolate(3),
                    ]),
                );
            }
        }
    }

    rotated
}
