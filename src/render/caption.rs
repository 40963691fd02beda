//! Caption rendering: a translucent bar across the bottom of a photo with
//! centered, stroked, wrapped text on it.
//!
//! Sizing is proportional to the photo so captions look the same on a
//! thumbnail and a full-size shot: font at 6% of the width, bar padding at
//! 3%, line spacing at 30% of the font size, each with a floor for tiny
//! images.

use super::font::FontProvider;
use super::{
    blend_pixel, decode_rgba, draw_stroked_line, encode_jpeg, make_opaque, wrap_text, RenderError,
};
use crate::constants::{
    CAPTION_BAR_ALPHA, CAPTION_FONT_RATIO, CAPTION_MIN_FONT_PX, CAPTION_MIN_PADDING,
    CAPTION_MIN_SPACING, CAPTION_PADDING_RATIO, CAPTION_SPACING_RATIO, CAPTION_STROKE_ALPHA,
    STROKE_WIDTH,
};
use image::{Rgba, RgbaImage};

/// Burn `text` into the bottom of the photo and return it as JPEG bytes.
///
/// Empty text is a passthrough: the input bytes come back untouched, not
/// re-encoded.
pub fn render_caption_bottom(
    fonts: &FontProvider,
    image_bytes: &[u8],
    text: &str,
    jpeg_quality: u8,
) -> Result<Vec<u8>, RenderError> {
    if text.is_empty() {
        return Ok(image_bytes.to_vec());
    }

    let mut image = decode_rgba(image_bytes)?;
    make_opaque(&mut image);
    let (width, height) = image.dimensions();

    let font_px = (width as f32 * CAPTION_FONT_RATIO)
        .floor()
        .max(CAPTION_MIN_FONT_PX);
    let font = fonts.resolve(font_px);

    let padding = ((width as f32 * CAPTION_PADDING_RATIO) as u32).max(CAPTION_MIN_PADDING);
    let spacing = ((font_px * CAPTION_SPACING_RATIO) as u32).max(CAPTION_MIN_SPACING);

    let max_text_width = width.saturating_sub(2 * padding).max(1);
    let lines = wrap_text(text, max_text_width, |candidate| {
        font.measure(candidate) + 2 * STROKE_WIDTH
    });

    // Each line's box includes the stroke ring above and below the glyphs
    let line_height = font.line_height().ceil() as u32 + 2 * STROKE_WIDTH;
    let line_count = lines.len() as u32;
    let text_height = line_height * line_count + spacing * (line_count - 1);
    let bar_height = (text_height + 2 * padding).min(height);
    let bar_top = height - bar_height;

    blend_bar(&mut image, bar_top, Rgba([0, 0, 0, CAPTION_BAR_ALPHA]));

    let fill = Rgba([255, 255, 255, 255]);
    let stroke = Rgba([0, 0, 0, CAPTION_STROKE_ALPHA]);

    let mut y = bar_top + padding;
    for line in &lines {
        let line_width = font.measure(line) + 2 * STROKE_WIDTH;
        let x = width.saturating_sub(line_width) / 2;
        let baseline = (y + STROKE_WIDTH) as f32 + font.ascent();

        draw_stroked_line(
            &mut image,
            &font,
            (x + STROKE_WIDTH) as f32,
            baseline,
            line,
            fill,
            stroke,
            STROKE_WIDTH,
        );

        y += line_height + spacing;
    }

    encode_jpeg(&image, jpeg_quality)
}

/// Blend a full-width translucent bar from `top` to the bottom edge.
fn blend_bar(image: &mut RgbaImage, top: u32, color: Rgba<u8>) {
    for y in top..image.height() {
        for x in 0..image.width() {
            let existing = image.get_pixel(x, y);
            image.put_pixel(x, y, blend_pixel(*existing, color));
        }
    }
}
