//! Watermark rendering: low-opacity rotated text stamps.
//!
//! A stamp is the text drawn stroked on its own transparent canvas, rotated
//! as a unit, then alpha-composited onto the photo. Rotating the stamp
//! rather than the glyphs keeps the text crisp and guarantees nothing is
//! clipped: the rotated canvas grows to the stamp's bounding box.
//!
//! Two placements exist: one stamp dead center, or a staggered grid that
//! covers the whole photo including the edges.

use super::font::FontProvider;
use super::{
    blend_layer, decode_rgba, draw_stroked_line, encode_jpeg, make_opaque, rotate_rgba, RenderError,
};
use crate::constants::{
    STROKE_WIDTH, WATERMARK_CENTER_FILL_ALPHA, WATERMARK_CENTER_FONT_RATIO,
    WATERMARK_CENTER_MIN_FONT_PX, WATERMARK_CENTER_STROKE_ALPHA, WATERMARK_TILE_FILL_ALPHA,
    WATERMARK_TILE_FONT_RATIO, WATERMARK_TILE_MIN_FONT_PX, WATERMARK_TILE_STROKE_ALPHA,
};
use image::{Rgba, RgbaImage};

/// Stamp the text once, centered, and return the photo as JPEG bytes.
///
/// Empty text is a passthrough, same as the caption renderer.
pub fn render_watermark_center(
    fonts: &FontProvider,
    image_bytes: &[u8],
    text: &str,
    angle_degrees: f32,
    jpeg_quality: u8,
) -> Result<Vec<u8>, RenderError> {
    if text.is_empty() {
        return Ok(image_bytes.to_vec());
    }

    let mut image = decode_rgba(image_bytes)?;
    make_opaque(&mut image);
    let (width, height) = image.dimensions();

    let font_px = (width as f32 * WATERMARK_CENTER_FONT_RATIO)
        .floor()
        .max(WATERMARK_CENTER_MIN_FONT_PX);

    let stamp = render_stamp(
        fonts,
        text,
        font_px,
        Rgba([255, 255, 255, WATERMARK_CENTER_FILL_ALPHA]),
        Rgba([0, 0, 0, WATERMARK_CENTER_STROKE_ALPHA]),
        angle_degrees,
    );

    let x = (width as i32 - stamp.width() as i32) / 2;
    let y = (height as i32 - stamp.height() as i32) / 2;
    blend_layer(&mut image, &stamp, x, y);

    encode_jpeg(&image, jpeg_quality)
}

/// Tile the stamp across the whole photo and return it as JPEG bytes.
///
/// The tiled variant uses a smaller font and fainter ink than the centered
/// one, so repeating it does not drown the photo. Empty text is a
/// passthrough.
pub fn render_watermark_tiled(
    fonts: &FontProvider,
    image_bytes: &[u8],
    text: &str,
    angle_degrees: f32,
    jpeg_quality: u8,
) -> Result<Vec<u8>, RenderError> {
    if text.is_empty() {
        return Ok(image_bytes.to_vec());
    }

    let mut image = decode_rgba(image_bytes)?;
    make_opaque(&mut image);
    let (width, height) = image.dimensions();

    let font_px = (width as f32 * WATERMARK_TILE_FONT_RATIO)
        .floor()
        .max(WATERMARK_TILE_MIN_FONT_PX);

    let stamp = render_stamp(
        fonts,
        text,
        font_px,
        Rgba([255, 255, 255, WATERMARK_TILE_FILL_ALPHA]),
        Rgba([0, 0, 0, WATERMARK_TILE_STROKE_ALPHA]),
        angle_degrees,
    );

    for (x, y) in tiled_positions(width, height, stamp.width(), stamp.height()) {
        blend_layer(&mut image, &stamp, x, y);
    }

    encode_jpeg(&image, jpeg_quality)
}

/// Draw the stroked text on a transparent canvas sized to fit it, then
/// rotate the whole canvas.
fn render_stamp(
    fonts: &FontProvider,
    text: &str,
    font_px: f32,
    fill: Rgba<u8>,
    stroke: Rgba<u8>,
    angle_degrees: f32,
) -> RgbaImage {
    let font = fonts.resolve(font_px);

    let pad = STROKE_WIDTH + 2;
    let width = (font.measure(text) + 2 * pad).max(1);
    let height = (font.line_height().ceil() as u32 + 2 * pad).max(1);

    let mut stamp = RgbaImage::new(width, height);
    let baseline = pad as f32 + font.ascent();
    draw_stroked_line(
        &mut stamp,
        &font,
        pad as f32,
        baseline,
        text,
        fill,
        stroke,
        STROKE_WIDTH,
    );

    if angle_degrees != 0.0 {
        stamp = rotate_rgba(&stamp, angle_degrees);
    }

    stamp
}

/// Top-left positions for tiling a stamp over the canvas.
///
/// Rows and columns step by the stamp size, odd rows shift right by half a
/// step, and the grid starts one stamp before the origin and runs one stamp
/// past the far edge so rotated corners never leave a bare strip along any
/// border.
pub(crate) fn tiled_positions(
    canvas_width: u32,
    canvas_height: u32,
    stamp_width: u32,
    stamp_height: u32,
) -> Vec<(i32, i32)> {
    let step_x = stamp_width.max(1) as i32;
    let step_y = stamp_height.max(1) as i32;

    let mut positions = Vec::new();
    let mut row = 0u32;
    let mut y = -step_y;

    while y < canvas_height as i32 + step_y {
        let stagger = if row % 2 == 1 { step_x / 2 } else { 0 };
        let mut x = -step_x + stagger;

        while x < canvas_width as i32 + step_x {
            positions.push((x, y));
            x += step_x;
        }

        y += step_y;
        row += 1;
    }

    positions
}
